//! File names for glyphs in a `.glyphspackage`
//!
//! Names must survive case-insensitive file systems, so every uppercase
//! letter is followed by an underscore (`A` becomes `A_.glyph`) and a name
//! that still clashes with a taken file gets a numeric suffix.

use std::collections::HashSet;

pub const GLYPH_SUFFIX: &str = crate::font_source::package::GLYPH_SUFFIX;

const ILLEGAL: &[char] = &['"', '*', '+', '/', ':', '<', '>', '?', '[', '\\', ']', '|'];

const RESERVED: &[&str] = &[
    "con", "prn", "aux", "clock$", "nul", "com1", "com2", "com3", "com4", "com5", "com6", "com7",
    "com8", "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

const MAX_FILE_NAME: usize = 255;

/// Pick a file name for `glyph_name`. `taken` holds lowercased names
/// already in use and receives the new one.
pub fn file_name_for(glyph_name: &str, taken: &mut HashSet<String>) -> String {
    let mut stem = String::with_capacity(glyph_name.len() * 2);
    for ch in glyph_name.chars() {
        if ILLEGAL.contains(&ch) || ch.is_control() {
            stem.push('_');
        } else {
            stem.push(ch);
            if ch.is_uppercase() {
                stem.push('_');
            }
        }
    }
    if stem.starts_with('.') {
        stem.replace_range(..1, "_");
    }
    let stem = stem
        .split('.')
        .map(|part| {
            if RESERVED.contains(&part.to_lowercase().as_str()) {
                format!("_{part}")
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(".");
    let stem: String = stem.chars().take(MAX_FILE_NAME - GLYPH_SUFFIX.len()).collect();

    let candidate = format!("{stem}{GLYPH_SUFFIX}");
    if taken.insert(candidate.to_lowercase()) {
        return candidate;
    }
    let room = MAX_FILE_NAME - GLYPH_SUFFIX.len() - 15;
    let short: String = stem.chars().take(room).collect();
    (1u64..)
        .map(|counter| format!("{short}{counter:015}{GLYPH_SUFFIX}"))
        .find(|name| taken.insert(name.to_lowercase()))
        .unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(glyph: &str) -> String {
        file_name_for(glyph, &mut HashSet::new())
    }

    #[test]
    fn test_case_and_illegal_characters() {
        assert_eq!(name("A"), "A_.glyph");
        assert_eq!(name("a.sc"), "a.sc.glyph");
        assert_eq!(name("T_h"), "T__h.glyph");
        assert_eq!(name("a/b"), "a_b.glyph");
        assert_eq!(name(".notdef"), "_notdef.glyph");
        assert_eq!(name("con"), "_con.glyph");
        assert_eq!(name("a.aux"), "a._aux.glyph");
    }

    #[test]
    fn test_clashes_get_a_counter() {
        let mut taken = HashSet::from(["a_.glyph".to_string()]);
        assert_eq!(file_name_for("a_", &mut taken), "a_000000000000001.glyph");
        assert_eq!(file_name_for("A", &mut taken), "A_000000000000002.glyph");
    }
}
