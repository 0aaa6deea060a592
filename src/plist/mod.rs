//! OpenStep property lists, as written by Glyphs
//!
//! Glyphs stores its sources in the old NeXTSTEP/OpenStep ASCII plist
//! dialect. This module holds the value type plus a tokenizer and a
//! serializer for that dialect. Dictionaries keep their key order so that
//! an untouched value round-trips in the position it was read from.

mod parse;
mod write;

pub use parse::{parse, parse_with_spans, RootSpans, SyntaxError, ValueSpan};
pub use write::{to_glyphs_string, write_glyphs_value};

use indexmap::IndexMap;

/// An ordered plist dictionary
pub type Dict = IndexMap<String, Plist>;

/// A single plist value
#[derive(Debug, Clone, PartialEq)]
pub enum Plist {
    Dict(Dict),
    Array(Vec<Plist>),
    String(String),
    Integer(i64),
    Float(f64),
    Data(Vec<u8>),
}

impl Plist {
    /// Build a number, preferring an integer when the value is integral
    pub fn number(value: f64) -> Self {
        if value.fract() == 0.0 && value.abs() < 1e15 {
            Plist::Integer(value as i64)
        } else {
            Plist::Float(value)
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Plist::Dict(dict) => Some(dict),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Plist]> {
        match self {
            Plist::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Plist::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of the value. Quoted numbers are accepted since older
    /// files quote some of them.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Plist::Integer(i) => Some(*i as f64),
            Plist::Float(f) => Some(*f),
            Plist::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Plist::Integer(i) => Some(*i),
            Plist::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Plist::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Truthiness the way Glyphs writes flags (`1`/`0`)
    pub fn as_bool(&self) -> Option<bool> {
        self.as_i64().map(|v| v != 0)
    }

    /// Text view of a scalar. An unquoted token such as a glyph named `1`
    /// is tokenized as a number, so numbers are rendered back to text.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Plist::String(s) => Some(s.clone()),
            Plist::Integer(i) => Some(i.to_string()),
            Plist::Float(f) => Some(f.to_string()),
            _ => None,
        }
    }

    /// Look up a key if this value is a dictionary
    pub fn get(&self, key: &str) -> Option<&Plist> {
        self.as_dict().and_then(|dict| dict.get(key))
    }

    /// Whether this value serializes without nesting
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Plist::Dict(_) | Plist::Array(_))
    }
}

impl From<&str> for Plist {
    fn from(value: &str) -> Self {
        Plist::String(value.to_string())
    }
}

impl From<String> for Plist {
    fn from(value: String) -> Self {
        Plist::String(value)
    }
}

impl From<i64> for Plist {
    fn from(value: i64) -> Self {
        Plist::Integer(value)
    }
}

impl From<f64> for Plist {
    fn from(value: f64) -> Self {
        Plist::number(value)
    }
}

impl From<bool> for Plist {
    fn from(value: bool) -> Self {
        Plist::Integer(value as i64)
    }
}

impl From<Dict> for Plist {
    fn from(value: Dict) -> Self {
        Plist::Dict(value)
    }
}

impl From<Vec<Plist>> for Plist {
    fn from(value: Vec<Plist>) -> Self {
        Plist::Array(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_prefers_integers() {
        assert_eq!(Plist::number(600.0), Plist::Integer(600));
        assert_eq!(Plist::number(-12.0), Plist::Integer(-12));
        assert_eq!(Plist::number(10.5), Plist::Float(10.5));
    }

    #[test]
    fn test_scalar_views() {
        assert_eq!(Plist::String("12.5".into()).as_f64(), Some(12.5));
        assert_eq!(Plist::Integer(1).as_bool(), Some(true));
        assert_eq!(Plist::Integer(7).to_text().as_deref(), Some("7"));
        assert_eq!(Plist::Array(vec![]).to_text(), None);
    }
}
