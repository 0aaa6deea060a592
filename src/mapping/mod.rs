//! Translation between Glyphs glyphs and the neutral variable glyph
//!
//! Reading turns the master, brace and smart layers of a glyph into an
//! ordered list of sources. Writing goes the other way and merges the
//! host's sources back into the existing glyph so that anything the host
//! does not model survives the round trip.

pub mod capabilities;
mod info;
mod kerning;
mod order;
mod read;
mod write;

pub use capabilities::{Capability, WriteCapabilities};
pub use info::read_font_info;
pub use kerning::read_kerning;
pub use order::LayerKind;
pub use read::{glyph_to_neutral, layer_name};
pub use write::{neutral_to_glyph, WriteContext};

use crate::plist::{Dict, Plist};
use serde_json::{Map, Number, Value};

pub const GLYPH_COLOR_KEY: &str = "com.glyphsapp.glyph-color";
pub const COMPONENT_ALIGNMENT_KEY: &str = "com.glyphsapp.component.alignment";
/// Layer `userData` key holding a host-chosen source name
pub const SOURCE_NAME_KEY: &str = "com.bezy.glyphs.source-name";
/// Layer `userData` key holding a host-chosen layer name
pub const LAYER_NAME_KEY: &str = "com.bezy.glyphs.layer-name";

const LOCAL_SUFFIX: &str = " (local)";

/// Name of a glyph axis as the host sees it. A glyph axis named like a
/// font axis would be ambiguous in a location, so it gets a suffix.
pub fn local_axis_name(name: &str, font_axes: &[String]) -> String {
    if font_axes.iter().any(|axis| axis == name) {
        format!("{name}{LOCAL_SUFFIX}")
    } else {
        name.to_string()
    }
}

/// Inverse of [`local_axis_name`]
pub fn glyph_axis_name<'a>(name: &'a str, font_axes: &[String]) -> &'a str {
    match name.strip_suffix(LOCAL_SUFFIX) {
        Some(stripped) if font_axes.iter().any(|axis| axis == stripped) => stripped,
        _ => name,
    }
}

pub fn plist_to_json(value: &Plist) -> Value {
    match value {
        Plist::Dict(dict) => Value::Object(
            dict.iter()
                .map(|(key, value)| (key.clone(), plist_to_json(value)))
                .collect::<Map<_, _>>(),
        ),
        Plist::Array(items) => Value::Array(items.iter().map(plist_to_json).collect()),
        Plist::String(s) => Value::String(s.clone()),
        Plist::Integer(i) => Value::from(*i),
        Plist::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        Plist::Data(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
    }
}

/// Convert host data to a plist value; `null` has no plist counterpart
pub fn json_to_plist(value: &Value) -> Option<Plist> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(Plist::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Plist::Integer(i)),
            None => n.as_f64().map(Plist::number),
        },
        Value::String(s) => Some(Plist::String(s.clone())),
        Value::Array(items) => Some(Plist::Array(items.iter().filter_map(json_to_plist).collect())),
        Value::Object(map) => Some(Plist::Dict(
            map.iter()
                .filter_map(|(key, value)| json_to_plist(value).map(|v| (key.clone(), v)))
                .collect::<Dict>(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_local_axis_names() {
        let font_axes = vec!["Weight".to_string()];
        assert_eq!(local_axis_name("Weight", &font_axes), "Weight (local)");
        assert_eq!(local_axis_name("weight", &font_axes), "weight");
        assert_eq!(glyph_axis_name("Weight (local)", &font_axes), "Weight");
        assert_eq!(glyph_axis_name("Width (local)", &font_axes), "Width (local)");
    }

    #[test]
    fn test_json_conversion() {
        let value = json!({"color": [255, 0, 0.5, 1], "flag": true, "name": "top", "gone": null});
        let plist = json_to_plist(&value).unwrap();
        assert_eq!(plist.get("flag"), Some(&Plist::Integer(1)));
        assert_eq!(plist.get("gone"), None);
        assert_eq!(
            plist_to_json(plist.get("color").unwrap()),
            json!([255, 0, 0.5, 1])
        );
    }
}
