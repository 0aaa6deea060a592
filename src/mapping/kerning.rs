//! Kerning tables
//!
//! Glyphs keeps kerning per master, keyed by glyph name or by a group
//! reference such as `@MMK_L_A`. Group membership is stored on the
//! glyphs themselves. The host gets one table per direction, with group
//! names carrying the host's side prefixes. Kerning is read-only.

use crate::font_source::{FormatVersion, Package};
use crate::neutral::Kerning;
use crate::plist::Plist;
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::warn;

/// One side of a kerning pair
#[derive(Debug, Clone, Copy)]
struct PairSide {
    /// Glyph key holding the group in Glyphs 2 and Glyphs 3
    glyph_keys: (&'static str, &'static str),
    glyphs_prefix: &'static str,
    host_prefix: &'static str,
}

impl PairSide {
    fn glyph_key(self, format: FormatVersion) -> &'static str {
        match format {
            FormatVersion::V2 => self.glyph_keys.0,
            FormatVersion::V3 => self.glyph_keys.1,
        }
    }

    fn translate(self, name: &str) -> String {
        match name.strip_prefix(self.glyphs_prefix) {
            Some(group) => format!("{}{group}", self.host_prefix),
            None => name.to_string(),
        }
    }
}

// The first glyph of a pair uses the group on its right edge
const LEFT: PairSide = PairSide {
    glyph_keys: ("rightKerningGroup", "kernRight"),
    glyphs_prefix: "@MMK_L_",
    host_prefix: "public.kern1.",
};
const RIGHT: PairSide = PairSide {
    glyph_keys: ("leftKerningGroup", "kernLeft"),
    glyphs_prefix: "@MMK_R_",
    host_prefix: "public.kern2.",
};
const TOP: PairSide = PairSide {
    glyph_keys: ("bottomKerningGroup", "kernBottom"),
    glyphs_prefix: "@MMK_T_",
    host_prefix: "kern.top.",
};
const BOTTOM: PairSide = PairSide {
    glyph_keys: ("topKerningGroup", "kernTop"),
    glyphs_prefix: "@MMK_B_",
    host_prefix: "kern.bottom.",
};

struct Table {
    tag: &'static str,
    root_keys: (&'static str, &'static str),
    first: PairSide,
    second: PairSide,
}

const TABLES: [Table; 2] = [
    Table {
        tag: "kern",
        root_keys: ("kerning", "kerningLTR"),
        first: LEFT,
        second: RIGHT,
    },
    Table {
        tag: "vkrn",
        root_keys: ("vertKerning", "kerningVertical"),
        first: TOP,
        second: BOTTOM,
    },
];

/// Every non-empty kerning table, keyed by its feature tag
pub fn read_kerning(package: &Package) -> IndexMap<String, Kerning> {
    TABLES
        .iter()
        .filter_map(|table| {
            let kerning = read_table(package, table);
            (!kerning.values.is_empty()).then(|| (table.tag.to_string(), kerning))
        })
        .collect()
}

fn collect_groups(package: &Package, side: PairSide, groups: &mut IndexMap<String, Vec<String>>) {
    let key = side.glyph_key(package.format());
    for glyph in package.glyphs() {
        if let Some(group) = glyph.extra.get(key).and_then(Plist::to_text) {
            groups
                .entry(format!("{}{group}", side.host_prefix))
                .or_default()
                .push(glyph.name.clone());
        }
    }
}

fn read_table(package: &Package, table: &Table) -> Kerning {
    let mut groups = IndexMap::new();
    collect_groups(package, table.first, &mut groups);
    collect_groups(package, table.second, &mut groups);

    let root_key = match package.format() {
        FormatVersion::V2 => table.root_keys.0,
        FormatVersion::V3 => table.root_keys.1,
    };
    let by_master = package.root_value(root_key).and_then(Plist::as_dict);
    let design_space = package.design_space();
    let default_id = design_space.default_master().id.as_str();

    let mut source_identifiers = Vec::new();
    let mut pairs: IndexMap<String, IndexMap<String, HashMap<&str, f64>>> = IndexMap::new();
    for master in &design_space.masters {
        let master_pairs = by_master
            .and_then(|dict| dict.get(&master.id))
            .and_then(Plist::as_dict);
        // the default master always gets a source, even without kerning
        if master_pairs.map_or(true, |dict| dict.is_empty()) && master.id != default_id {
            continue;
        }
        source_identifiers.push(master.id.clone());

        for (first, seconds) in master_pairs.into_iter().flatten() {
            let Some(seconds) = seconds.as_dict() else {
                warn!("Skipping malformed {} entry '{first}' of master {}", table.tag, master.id);
                continue;
            };
            let row = pairs.entry(table.first.translate(first)).or_default();
            for (second, value) in seconds {
                match value.as_f64() {
                    Some(value) => {
                        row.entry(table.second.translate(second))
                            .or_default()
                            .insert(master.id.as_str(), value);
                    }
                    None => warn!("Skipping non-numeric {} value {first}/{second}", table.tag),
                }
            }
        }
    }

    let values = pairs
        .into_iter()
        .map(|(first, row)| {
            let row = row
                .into_iter()
                .map(|(second, per_master)| {
                    let values = source_identifiers
                        .iter()
                        .map(|id| per_master.get(id.as_str()).copied())
                        .collect();
                    (second, values)
                })
                .collect();
            (first, row)
        })
        .collect();

    Kerning {
        groups,
        source_identifiers,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLYPHS3_KERNING: &str = r#"{
.formatVersion = 3;
axes = (
{
name = Weight;
tag = wght;
}
);
fontMaster = (
{
axesValues = (
100
);
id = m01;
name = Light;
},
{
axesValues = (
400
);
id = m02;
name = Regular;
},
{
axesValues = (
900
);
id = m03;
name = Black;
}
);
glyphs = (
{
glyphname = A;
kernLeft = A;
kernRight = A;
layers = (
);
},
{
glyphname = Aacute;
kernLeft = A;
kernRight = A;
layers = (
);
},
{
glyphname = V;
kernLeft = V;
kernTop = V;
layers = (
);
}
);
kerningLTR = {
m01 = {
"@MMK_L_A" = {
"@MMK_R_V" = -60;
T = -20;
};
};
m03 = {
"@MMK_L_A" = {
"@MMK_R_V" = -90;
};
};
};
kerningVertical = {
m01 = {
V = {
"@MMK_B_V" = 15;
};
};
};
}
"#;

    const GLYPHS2_KERNING: &str = r#"{
fontMaster = (
{
id = M1;
weightValue = 100;
},
{
id = M2;
weightValue = 700;
}
);
glyphs = (
{
glyphname = T;
layers = (
);
rightKerningGroup = T;
},
{
glyphname = o;
layers = (
);
leftKerningGroup = o;
}
);
kerning = {
M2 = {
"@MMK_L_T" = {
"@MMK_R_o" = "-45";
};
};
};
}
"#;

    fn package(text: &str) -> Package {
        Package::from_glyphs_text("Kerning.glyphs", text.to_string()).unwrap()
    }

    #[test]
    fn test_glyphs3_tables_and_groups() {
        let kerning = read_kerning(&package(GLYPHS3_KERNING));
        assert_eq!(kerning.keys().collect::<Vec<_>>(), vec!["kern", "vkrn"]);

        let kern = &kerning["kern"];
        // m02 has no kerning and is not the default master
        assert_eq!(kern.source_identifiers, vec!["m01", "m03"]);
        assert_eq!(kern.groups["public.kern1.A"], vec!["A", "Aacute"]);
        assert_eq!(kern.groups["public.kern2.V"], vec!["V"]);
        let row = &kern.values["public.kern1.A"];
        assert_eq!(row["public.kern2.V"], vec![Some(-60.0), Some(-90.0)]);
        assert_eq!(row["T"], vec![Some(-20.0), None]);

        let vkrn = &kerning["vkrn"];
        assert_eq!(vkrn.source_identifiers, vec!["m01"]);
        assert_eq!(vkrn.groups["kern.bottom.V"], vec!["V"]);
        assert!(!vkrn.groups.contains_key("kern.top.V"));
        assert_eq!(vkrn.values["V"]["kern.bottom.V"], vec![Some(15.0)]);
    }

    #[test]
    fn test_glyphs2_keys_and_empty_default_master() {
        let kerning = read_kerning(&package(GLYPHS2_KERNING));
        assert_eq!(kerning.keys().collect::<Vec<_>>(), vec!["kern"]);

        let kern = &kerning["kern"];
        // the default master is kept although it has no pairs
        assert_eq!(kern.source_identifiers, vec!["M1", "M2"]);
        assert_eq!(kern.groups["public.kern1.T"], vec!["T"]);
        assert_eq!(kern.groups["public.kern2.o"], vec!["o"]);
        assert_eq!(kern.values["public.kern1.T"]["public.kern2.o"], vec![None, Some(-45.0)]);
    }

    #[test]
    fn test_font_without_kerning_has_no_tables() {
        let text = GLYPHS2_KERNING.replace("kerning = {", "unused = {");
        assert!(read_kerning(&package(&text)).is_empty());
    }
}
