//! OpenType feature text blocks
//!
//! Glyphs keeps feature code in three ordered lists: prefixes, classes and
//! features. The store holds those blocks as written, tracks which ones
//! were edited, and converts between the block lists and the single text
//! document the host edits.

use super::format::FormatVersion;
use super::glyph::Extra;
use crate::core::errors::{BackendError, BackendResult, WriteError};
use crate::plist::{Dict, Plist};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    Prefix,
    Class,
    Feature,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 3] = [FeatureKind::Prefix, FeatureKind::Class, FeatureKind::Feature];

    /// Root key of the list holding blocks of this kind
    pub fn root_key(self) -> &'static str {
        match self {
            FeatureKind::Prefix => "featurePrefixes",
            FeatureKind::Class => "classes",
            FeatureKind::Feature => "features",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FeatureKind::Prefix => "feature prefix",
            FeatureKind::Class => "class",
            FeatureKind::Feature => "feature",
        }
    }

    fn name_key(self, version: FormatVersion) -> &'static str {
        match self {
            FeatureKind::Feature => version.feature_tag_key(),
            _ => "name",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBlock {
    pub kind: FeatureKind,
    pub name: String,
    pub code: String,
    pub disabled: bool,
    /// Code Glyphs regenerates on export
    pub automatic: bool,
    extra: Extra,
    /// Position in the list as last read from disk
    pub(crate) origin: Option<usize>,
    pub(crate) edited: bool,
}

impl FeatureBlock {
    pub fn new(kind: FeatureKind, name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            code: code.into(),
            disabled: false,
            automatic: false,
            extra: Extra::default(),
            origin: None,
            edited: true,
        }
    }

    fn from_plist(
        kind: FeatureKind,
        value: &Plist,
        version: FormatVersion,
        origin: usize,
    ) -> Result<Self, String> {
        let dict = value
            .as_dict()
            .ok_or_else(|| format!("{} is not a dictionary", kind.label()))?;
        let name_key = kind.name_key(version);
        Ok(Self {
            kind,
            name: dict.get(name_key).and_then(Plist::to_text).unwrap_or_default(),
            code: dict.get("code").and_then(Plist::to_text).unwrap_or_default(),
            disabled: dict.get("disabled").and_then(Plist::as_bool).unwrap_or(false),
            automatic: dict.get("automatic").and_then(Plist::as_bool).unwrap_or(false),
            extra: Extra::from_dict(dict, &[name_key, "code", "disabled", "automatic"]),
            origin: Some(origin),
            edited: false,
        })
    }

    pub fn to_plist(&self, version: FormatVersion) -> Plist {
        let mut known = Dict::new();
        if self.automatic {
            known.insert("automatic".into(), true.into());
        }
        known.insert("code".into(), self.code.as_str().into());
        if self.disabled {
            known.insert("disabled".into(), true.into());
        }
        known.insert(self.kind.name_key(version).into(), self.name.as_str().into());
        Plist::Dict(self.extra.compose(known))
    }

    fn replace_code(&mut self, code: String, disabled: bool) {
        if self.code != code || self.disabled != disabled {
            self.code = code;
            self.disabled = disabled;
            self.automatic = false;
            self.edited = true;
        }
    }

    /// The block as it appears in the composed feature text
    fn compose(&self) -> String {
        let text = match self.kind {
            FeatureKind::Prefix => format!("# Prefix: {}\n{}", self.name, self.code),
            FeatureKind::Class => format!("@{} = [ {} ];", self.name, self.code),
            FeatureKind::Feature => format!("feature {0} {{\n{1}\n}} {0};", self.name, self.code),
        };
        if self.disabled {
            text.split('\n')
                .map(|line| if line.is_empty() { "#".to_string() } else { format!("# {line}") })
                .collect::<Vec<_>>()
                .join("\n")
        } else {
            text
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureTextStore {
    lists: [Vec<FeatureBlock>; 3],
    dirty: [bool; 3],
}

impl FeatureTextStore {
    pub fn from_root(root: &Dict, version: FormatVersion) -> Result<Self, String> {
        let mut store = Self::default();
        for kind in FeatureKind::ALL {
            let Some(value) = root.get(kind.root_key()) else {
                continue;
            };
            let items = value
                .as_array()
                .ok_or_else(|| format!("'{}' is not a list", kind.root_key()))?;
            store.lists[kind.slot()] = items
                .iter()
                .enumerate()
                .map(|(i, item)| FeatureBlock::from_plist(kind, item, version, i))
                .collect::<Result<_, _>>()?;
        }
        Ok(store)
    }

    /// All blocks: prefixes, then classes, then features
    pub fn list(&self) -> impl Iterator<Item = &FeatureBlock> {
        self.lists.iter().flatten()
    }

    pub fn blocks(&self, kind: FeatureKind) -> &[FeatureBlock] {
        &self.lists[kind.slot()]
    }

    pub fn is_dirty(&self, kind: FeatureKind) -> bool {
        self.dirty[kind.slot()]
    }

    fn position(&self, kind: FeatureKind, name: &str) -> Option<usize> {
        self.blocks(kind).iter().position(|block| block.name == name)
    }

    fn not_found(kind: FeatureKind, name: &str) -> BackendError {
        BackendError::NotFound {
            kind: kind.label(),
            name: name.to_string(),
        }
    }

    pub fn get(&self, kind: FeatureKind, name: &str) -> BackendResult<&str> {
        self.position(kind, name)
            .map(|i| self.blocks(kind)[i].code.as_str())
            .ok_or_else(|| Self::not_found(kind, name))
    }

    /// Replace the text of one block, keeping its place in the list
    pub fn set(&mut self, kind: FeatureKind, name: &str, text: &str) -> BackendResult<()> {
        let i = self.position(kind, name).ok_or_else(|| Self::not_found(kind, name))?;
        let block = &mut self.lists[kind.slot()][i];
        let disabled = block.disabled;
        block.replace_code(text.to_string(), disabled);
        if block.edited {
            self.dirty[kind.slot()] = true;
        }
        Ok(())
    }

    pub fn append(&mut self, kind: FeatureKind, name: &str, text: &str) -> BackendResult<()> {
        if self.position(kind, name).is_some() {
            return Err(WriteError::Invalid(format!("{} '{name}' already exists", kind.label())).into());
        }
        self.lists[kind.slot()].push(FeatureBlock::new(kind, name, text));
        self.dirty[kind.slot()] = true;
        Ok(())
    }

    pub fn remove(&mut self, kind: FeatureKind, name: &str) -> BackendResult<FeatureBlock> {
        let i = self.position(kind, name).ok_or_else(|| Self::not_found(kind, name))?;
        self.dirty[kind.slot()] = true;
        Ok(self.lists[kind.slot()].remove(i))
    }

    pub fn to_plist_items(&self, kind: FeatureKind, version: FormatVersion) -> Vec<Plist> {
        self.blocks(kind).iter().map(|block| block.to_plist(version)).collect()
    }

    /// Everything as one feature file
    pub fn compose_text(&self) -> String {
        let blocks: Vec<String> = self.list().map(FeatureBlock::compose).collect();
        if blocks.is_empty() {
            return String::new();
        }
        let mut text = blocks.join("\n\n");
        text.push('\n');
        text
    }

    /// Bring the store in line with an edited feature file. Unchanged
    /// blocks are left alone; returns whether anything changed.
    pub fn apply_text(&mut self, text: &str) -> Result<bool, WriteError> {
        let parsed = parse_feature_text(text).map_err(WriteError::Invalid)?;
        let mut changed = false;
        for kind in FeatureKind::ALL {
            let incoming: Vec<&ParsedBlock> = parsed.iter().filter(|b| b.kind == kind).collect();
            let mut seen = HashSet::new();
            for block in &incoming {
                if !seen.insert(block.name.as_str()) {
                    return Err(WriteError::Invalid(format!(
                        "{} '{}' appears more than once",
                        kind.label(),
                        block.name
                    )));
                }
            }

            let mut old = std::mem::take(&mut self.lists[kind.slot()]);
            let old_names: Vec<String> = old.iter().map(|b| b.name.clone()).collect();
            let mut updated = Vec::with_capacity(incoming.len());
            let mut edited = false;
            for parsed in incoming {
                let block = match old.iter().position(|b| b.name == parsed.name) {
                    Some(i) => {
                        let mut block = old.remove(i);
                        block.replace_code(parsed.code.clone(), parsed.disabled);
                        block
                    }
                    None => {
                        let mut block = FeatureBlock::new(kind, parsed.name.clone(), parsed.code.clone());
                        block.disabled = parsed.disabled;
                        block
                    }
                };
                edited |= block.edited;
                updated.push(block);
            }
            let reordered = updated.iter().map(|b| &b.name).ne(old_names.iter());
            if edited || reordered {
                self.dirty[kind.slot()] = true;
                changed = true;
            }
            self.lists[kind.slot()] = updated;
        }
        Ok(changed)
    }

    /// Treat the current blocks as what is on disk
    pub(crate) fn rebase(&mut self) {
        for list in &mut self.lists {
            for (i, block) in list.iter_mut().enumerate() {
                block.origin = Some(i);
                block.edited = false;
            }
        }
        self.dirty = [false; 3];
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ParsedBlock {
    kind: FeatureKind,
    name: String,
    code: String,
    disabled: bool,
}

enum Marker {
    Prefix(String),
    Class(String),
    Feature(String),
}

fn marker(line: &str) -> Option<Marker> {
    if let Some(name) = line.strip_prefix("# Prefix:") {
        return Some(Marker::Prefix(name.trim().to_string()));
    }
    if let Some(rest) = line.strip_prefix('@') {
        let (name, definition) = rest.split_once('=')?;
        if definition.trim_start().starts_with('[') {
            return Some(Marker::Class(name.trim().to_string()));
        }
        return None;
    }
    let rest = line.strip_prefix("feature ")?;
    let tag = rest.trim_end().strip_suffix('{')?.trim();
    (!tag.is_empty() && !tag.contains(char::is_whitespace)).then(|| Marker::Feature(tag.to_string()))
}

/// A line of a commented-out block, without its comment marker
fn uncomment(line: &str) -> Option<&str> {
    if line == "#" {
        Some("")
    } else {
        line.strip_prefix("# ")
    }
}

/// Body lines of a disabled block lose their comment marker
fn body_line(line: &str, disabled: bool) -> Option<&str> {
    if disabled {
        uncomment(line)
    } else {
        Some(line)
    }
}

/// Whether a line starts a new block, commented out or not
fn starts_block(line: &str) -> bool {
    marker(line).is_some() || uncomment(line).is_some_and(|l| marker(l).is_some())
}

fn parse_feature_text(text: &str) -> Result<Vec<ParsedBlock>, String> {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut blocks = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if line.trim().is_empty() {
            i += 1;
            continue;
        }
        let (disabled, head) = match (marker(line), uncomment(line).and_then(marker)) {
            (Some(head), _) => (false, head),
            (None, Some(head)) => (true, head),
            (None, None) => {
                return Err(format!("line {}: text outside of any feature block", i + 1));
            }
        };
        i += 1;

        let (kind, name, code) = match head {
            Marker::Prefix(name) => {
                let mut code = Vec::new();
                while i < lines.len() && !starts_block(lines[i]) {
                    match body_line(lines[i], disabled) {
                        Some(line) => code.push(line),
                        None => break,
                    }
                    i += 1;
                }
                // the blank separator line before the next block
                if !disabled && code.last() == Some(&"") {
                    code.pop();
                }
                (FeatureKind::Prefix, name, code.join("\n"))
            }
            Marker::Feature(tag) => {
                let end = format!("}} {tag};");
                let mut code = Vec::new();
                loop {
                    let Some(line) = lines.get(i).copied().and_then(|l| body_line(l, disabled)) else {
                        return Err(format!("feature '{tag}' is not closed with '{end}'"));
                    };
                    i += 1;
                    if line.trim_end() == end {
                        break;
                    }
                    code.push(line);
                }
                (FeatureKind::Feature, tag, code.join("\n"))
            }
            Marker::Class(name) => {
                let first = body_line(line, disabled).unwrap_or(line);
                let mut definition = first.to_string();
                while !definition.trim_end().ends_with("];") {
                    let Some(line) = lines.get(i).copied().and_then(|l| body_line(l, disabled)) else {
                        return Err(format!("class '@{name}' is not closed with '];'"));
                    };
                    definition.push('\n');
                    definition.push_str(line);
                    i += 1;
                }
                let open = definition.find('[').unwrap_or(0);
                let close = definition.rfind(']').unwrap_or(definition.len());
                let inner = &definition[open + 1..close.max(open + 1)];
                let inner = inner.strip_prefix(' ').unwrap_or(inner);
                let inner = inner.strip_suffix(' ').unwrap_or(inner);
                (FeatureKind::Class, name, inner.to_string())
            }
        };
        blocks.push(ParsedBlock {
            kind,
            name,
            code,
            disabled,
        });
    }
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plist::parse;

    fn store() -> FeatureTextStore {
        let root = parse(
            r#"{
classes = ({automatic = 1; code = "A B C"; name = Uppercase;});
featurePrefixes = ({code = "languagesystem DFLT dflt;"; name = Languagesystems;});
features = ({code = "pos A V -50;"; tag = kern;}, {code = "sub a by a.sc;"; disabled = 1; tag = smcp;});
}"#,
        )
        .unwrap();
        FeatureTextStore::from_root(root.as_dict().unwrap(), FormatVersion::V3).unwrap()
    }

    #[test]
    fn test_list_order() {
        let store = store();
        let names: Vec<&str> = store.list().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Languagesystems", "Uppercase", "kern", "smcp"]);
    }

    #[test]
    fn test_set_keeps_position() {
        let mut store = store();
        store.set(FeatureKind::Feature, "kern", "pos A V -80;").unwrap();
        assert_eq!(store.get(FeatureKind::Feature, "kern").unwrap(), "pos A V -80;");
        assert_eq!(store.blocks(FeatureKind::Feature)[0].name, "kern");
        assert!(store.is_dirty(FeatureKind::Feature));
        assert!(!store.is_dirty(FeatureKind::Class));
        assert!(matches!(
            store.set(FeatureKind::Feature, "liga", ""),
            Err(BackendError::NotFound { .. })
        ));
    }

    #[test]
    fn test_composed_text_applies_without_changes() {
        let mut store = store();
        let text = store.compose_text();
        assert!(text.contains("# Prefix: Languagesystems\nlanguagesystem DFLT dflt;\n\n@Uppercase = [ A B C ];"));
        assert!(text.contains("# feature smcp {\n# sub a by a.sc;\n# } smcp;"));
        assert!(!store.apply_text(&text).unwrap());
        assert_eq!(store, self::store());
    }

    #[test]
    fn test_apply_text_diffs_blocks() {
        let mut store = store();
        let text = store
            .compose_text()
            .replace("pos A V -50;", "pos A V -60;\npos T o -20;")
            .replace("@Uppercase = [ A B C ];", "@Uppercase = [ A B C D ];\n\n@Lowercase = [ a b ];");
        assert!(store.apply_text(&text).unwrap());
        assert_eq!(store.get(FeatureKind::Feature, "kern").unwrap(), "pos A V -60;\npos T o -20;");
        assert_eq!(store.get(FeatureKind::Class, "Lowercase").unwrap(), "a b");
        let uppercase = &store.blocks(FeatureKind::Class)[0];
        assert_eq!(uppercase.code, "A B C D");
        assert!(!uppercase.automatic);
        // the prefix was not touched
        assert!(!store.is_dirty(FeatureKind::Prefix));
        assert!(store.blocks(FeatureKind::Feature)[1].disabled);
    }

    #[test]
    fn test_apply_text_removes_missing_blocks() {
        let mut store = store();
        let text = "feature kern {\npos A V -50;\n} kern;\n";
        assert!(store.apply_text(text).unwrap());
        assert_eq!(store.list().count(), 1);
        assert!(store.apply_text("stray text").is_err());
    }
}
