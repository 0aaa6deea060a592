//! Glyphs-style plist serializer
//!
//! Output follows what Glyphs itself writes: no indentation, one
//! `key = value;` per line, strings quoted only when they have to be, and
//! short numeric tuples such as node coordinates kept on a single line.

use super::Plist;

/// Keys whose scalar arrays Glyphs writes on one line
const INLINE_KEYS: &[&str] = &["pos", "scale", "slant", "color", "origin"];

/// Serialize a value the way Glyphs writes it
pub fn to_glyphs_string(value: &Plist) -> String {
    let mut out = String::new();
    write_glyphs_value(&mut out, value);
    out
}

/// Append a serialized value to `out`
pub fn write_glyphs_value(out: &mut String, value: &Plist) {
    write_value(out, value, false);
}

fn write_value(out: &mut String, value: &Plist, inline: bool) {
    match value {
        Plist::Dict(dict) => {
            out.push_str("{\n");
            for (key, value) in dict {
                write_string(out, key);
                out.push_str(" = ");
                write_value(out, value, INLINE_KEYS.contains(&key.as_str()));
                out.push_str(";\n");
            }
            out.push('}');
        }
        Plist::Array(items) => {
            let scalars = !items.is_empty() && items.iter().all(Plist::is_scalar);
            if items.is_empty() {
                out.push_str("(\n)");
            } else if inline && scalars {
                out.push('(');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write_value(out, item, false);
                }
                out.push(')');
            } else {
                out.push_str("(\n");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(",\n");
                    }
                    // Tuples nested in arrays (node lists) stay on one line
                    write_value(out, item, true);
                }
                out.push_str("\n)");
            }
        }
        Plist::String(s) => write_string(out, s),
        Plist::Integer(i) => out.push_str(&i.to_string()),
        Plist::Float(f) => write_float(out, *f),
        Plist::Data(bytes) => {
            out.push('<');
            for byte in bytes {
                out.push_str(&format!("{byte:02x}"));
            }
            out.push('>');
        }
    }
}

fn write_float(out: &mut String, value: f64) {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        out.push_str(&(value as i64).to_string());
    } else {
        out.push_str(&value.to_string());
    }
}

fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || !s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'$' | b'/' | b':' | b'-'))
}

fn write_string(out: &mut String, s: &str) {
    if !needs_quotes(s) {
        out.push_str(s);
        return;
    }
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push('\n'),
            '\t' => out.push('\t'),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\{:03o}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plist::{parse, Dict};

    #[test]
    fn test_layer_style_output() {
        let mut dict = Dict::new();
        dict.insert("layerId".into(), "m01".into());
        dict.insert(
            "nodes".into(),
            Plist::Array(vec![
                Plist::Array(vec![Plist::Integer(10), Plist::Integer(20), "l".into()]),
                Plist::Array(vec![Plist::Float(30.5), Plist::Integer(40), "o".into()]),
            ]),
        );
        dict.insert(
            "pos".into(),
            Plist::Array(vec![Plist::Integer(300), Plist::Integer(700)]),
        );
        dict.insert("name".into(), "{400}".into());
        dict.insert("width".into(), Plist::Float(600.0));

        let text = to_glyphs_string(&Plist::Dict(dict));
        assert_eq!(
            text,
            "{\nlayerId = m01;\nnodes = (\n(10,20,l),\n(30.5,40,o)\n);\npos = (300,700);\nname = \"{400}\";\nwidth = 600;\n}"
        );
    }

    #[test]
    fn test_scalar_array_off_inline_keys_is_multiline() {
        let mut dict = Dict::new();
        dict.insert("axesValues".into(), Plist::Array(vec![Plist::Integer(100)]));
        dict.insert("empty".into(), Plist::Array(vec![]));
        let text = to_glyphs_string(&Plist::Dict(dict));
        assert_eq!(text, "{\naxesValues = (\n100\n);\nempty = (\n);\n}");
    }

    #[test]
    fn test_written_text_parses_back() {
        let source = "{\ncode = \"sub a by a.sc;\nsub b by b.sc;\";\nname = \"Variable Font Origin\";\nquote = \"say \\\"hi\\\"\";\n}";
        let value = parse(source).unwrap();
        let text = to_glyphs_string(&value);
        assert_eq!(text, source);
        assert_eq!(parse(&text).unwrap(), value);
    }
}
