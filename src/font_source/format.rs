//! Glyphs 2 and Glyphs 3 value encodings
//!
//! The two format versions store the same things in different shapes.
//! Everything that differs at the value level goes through here so the
//! model types can stay version-agnostic.

use crate::plist::{Dict, Plist};
use kurbo::Affine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatVersion {
    V2,
    V3,
}

impl FormatVersion {
    /// Files without `.formatVersion` are Glyphs 2
    pub fn detect(root: &Dict) -> Self {
        match root.get(".formatVersion").and_then(Plist::as_i64) {
            Some(version) if version >= 3 => FormatVersion::V3,
            _ => FormatVersion::V2,
        }
    }

    pub fn number(self) -> u32 {
        match self {
            FormatVersion::V2 => 2,
            FormatVersion::V3 => 3,
        }
    }

    pub fn guides_key(self) -> &'static str {
        match self {
            FormatVersion::V2 => "guideLines",
            FormatVersion::V3 => "guides",
        }
    }

    /// Key naming a feature block (prefixes and classes always use `name`)
    pub fn feature_tag_key(self) -> &'static str {
        match self {
            FormatVersion::V2 => "name",
            FormatVersion::V3 => "tag",
        }
    }

    pub fn anchor_position_key(self) -> &'static str {
        match self {
            FormatVersion::V2 => "position",
            FormatVersion::V3 => "pos",
        }
    }

    pub fn component_base_key(self) -> &'static str {
        match self {
            FormatVersion::V2 => "name",
            FormatVersion::V3 => "ref",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Line,
    Curve,
    QCurve,
    OffCurve,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub x: f64,
    pub y: f64,
    pub kind: NodeKind,
    pub smooth: bool,
    /// Node user data, carried through untouched
    pub user_data: Option<Plist>,
}

impl Node {
    pub fn new(x: f64, y: f64, kind: NodeKind, smooth: bool) -> Self {
        Self {
            x,
            y,
            kind,
            smooth,
            user_data: None,
        }
    }

    pub fn from_plist(value: &Plist, version: FormatVersion) -> Option<Self> {
        match version {
            FormatVersion::V3 => {
                let items = value.as_array()?;
                let x = items.first()?.as_f64()?;
                let y = items.get(1)?.as_f64()?;
                let code = items.get(2)?.to_text()?;
                let (kind, smooth) = match code.as_str() {
                    "l" => (NodeKind::Line, false),
                    "ls" => (NodeKind::Line, true),
                    "c" => (NodeKind::Curve, false),
                    "cs" => (NodeKind::Curve, true),
                    "q" => (NodeKind::QCurve, false),
                    "qs" => (NodeKind::QCurve, true),
                    "o" => (NodeKind::OffCurve, false),
                    _ => return None,
                };
                Some(Self {
                    x,
                    y,
                    kind,
                    smooth,
                    user_data: items.get(3).cloned(),
                })
            }
            FormatVersion::V2 => {
                let text = value.as_str()?;
                // user data, when present, follows the node type in braces
                let (head, user_data) = match text.find('{') {
                    Some(offset) => (&text[..offset], crate::plist::parse(&text[offset..]).ok()),
                    None => (text, None),
                };
                let mut words = head.split_whitespace();
                let x = words.next()?.parse().ok()?;
                let y = words.next()?.parse().ok()?;
                let kind = match words.next()? {
                    "LINE" => NodeKind::Line,
                    "CURVE" => NodeKind::Curve,
                    "QCURVE" => NodeKind::QCurve,
                    "OFFCURVE" => NodeKind::OffCurve,
                    _ => return None,
                };
                let smooth = words.next() == Some("SMOOTH");
                Some(Self {
                    x,
                    y,
                    kind,
                    smooth,
                    user_data,
                })
            }
        }
    }

    pub fn to_plist(&self, version: FormatVersion) -> Plist {
        match version {
            FormatVersion::V3 => {
                let code = match (self.kind, self.smooth) {
                    (NodeKind::Line, false) => "l",
                    (NodeKind::Line, true) => "ls",
                    (NodeKind::Curve, false) => "c",
                    (NodeKind::Curve, true) => "cs",
                    (NodeKind::QCurve, false) => "q",
                    (NodeKind::QCurve, true) => "qs",
                    (NodeKind::OffCurve, _) => "o",
                };
                let mut items = vec![Plist::number(self.x), Plist::number(self.y), code.into()];
                if let Some(user_data) = &self.user_data {
                    items.push(user_data.clone());
                }
                Plist::Array(items)
            }
            FormatVersion::V2 => {
                let kind = match self.kind {
                    NodeKind::Line => "LINE",
                    NodeKind::Curve => "CURVE",
                    NodeKind::QCurve => "QCURVE",
                    NodeKind::OffCurve => "OFFCURVE",
                };
                let mut text = format!("{} {} {}", format_number(self.x), format_number(self.y), kind);
                if self.smooth && self.kind != NodeKind::OffCurve {
                    text.push_str(" SMOOTH");
                }
                if let Some(user_data) = &self.user_data {
                    text.push(' ');
                    text.push_str(&crate::plist::to_glyphs_string(user_data));
                }
                Plist::String(text)
            }
        }
    }
}

/// Render a number the way Glyphs writes it inside strings
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return (value as i64).to_string();
    }
    let text = format!("{value:.5}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Numbers inside a `{a, b, ...}` string
fn parse_brace_numbers(text: &str) -> Option<Vec<f64>> {
    let inner = text.trim().strip_prefix('{')?.strip_suffix('}')?;
    inner
        .split(',')
        .map(|part| part.trim().parse::<f64>().ok())
        .collect()
}

/// Parse a Glyphs 2 point string such as `"{300, 700}"`
pub fn parse_point_string(text: &str) -> Option<(f64, f64)> {
    match parse_brace_numbers(text)?.as_slice() {
        [x, y] => Some((*x, *y)),
        _ => None,
    }
}

pub fn point_string(x: f64, y: f64) -> String {
    format!("{{{}, {}}}", format_number(x), format_number(y))
}

/// Read a position in either encoding: a `(x,y)` tuple or a `{x, y}` string
pub fn parse_position(value: &Plist) -> Option<(f64, f64)> {
    match value {
        Plist::Array(items) => Some((items.first()?.as_f64()?, items.get(1)?.as_f64()?)),
        Plist::String(text) => parse_point_string(text),
        _ => None,
    }
}

pub fn position_to_plist(x: f64, y: f64, version: FormatVersion) -> Plist {
    match version {
        FormatVersion::V2 => Plist::String(point_string(x, y)),
        FormatVersion::V3 => Plist::Array(vec![Plist::number(x), Plist::number(y)]),
    }
}

/// Parse a Glyphs 2 component transform string `"{a, b, c, d, tx, ty}"`
pub fn parse_transform_string(text: &str) -> Option<Affine> {
    match parse_brace_numbers(text)?.as_slice() {
        [a, b, c, d, x, y] => Some(Affine::new([*a, *b, *c, *d, *x, *y])),
        _ => None,
    }
}

pub fn transform_string(affine: Affine) -> String {
    let parts: Vec<String> = affine.as_coeffs().iter().map(|v| format_number(*v)).collect();
    format!("{{{}}}", parts.join(", "))
}

/// Brace layer coordinates from a Glyphs 2 layer name like `"{400, 100}"`
pub fn parse_brace_name(name: &str) -> Option<Vec<f64>> {
    let start = name.find('{')?;
    let end = start + name[start..].find('}')?;
    let values: Option<Vec<f64>> = name[start + 1..end]
        .split(',')
        .map(|part| part.trim().parse::<f64>().ok())
        .collect();
    values.filter(|values| !values.is_empty())
}

pub fn brace_name(coordinates: &[f64]) -> String {
    let parts: Vec<String> = coordinates.iter().map(|v| format_number(*v)).collect();
    format!("{{{}}}", parts.join(", "))
}

/// Code points of a glyph. Glyphs 3 stores integers, Glyphs 2 stores hex
/// strings, comma separated when there are several.
pub fn parse_unicodes(value: &Plist, version: FormatVersion) -> Vec<u32> {
    match version {
        FormatVersion::V3 => match value {
            Plist::Array(items) => items
                .iter()
                .filter_map(|item| item.as_i64().and_then(|v| u32::try_from(v).ok()))
                .collect(),
            other => other
                .as_i64()
                .and_then(|v| u32::try_from(v).ok())
                .into_iter()
                .collect(),
        },
        FormatVersion::V2 => {
            let text = match value {
                Plist::Array(items) => items
                    .iter()
                    .filter_map(Plist::to_text)
                    .collect::<Vec<_>>()
                    .join(","),
                other => other.to_text().unwrap_or_default(),
            };
            text.split(',')
                .filter_map(|part| u32::from_str_radix(part.trim(), 16).ok())
                .collect()
        }
    }
}

pub fn unicodes_to_plist(unicodes: &[u32], version: FormatVersion) -> Option<Plist> {
    match (version, unicodes) {
        (_, []) => None,
        (FormatVersion::V3, [single]) => Some(Plist::Integer(i64::from(*single))),
        (FormatVersion::V3, many) => Some(Plist::Array(
            many.iter().map(|v| Plist::Integer(i64::from(*v))).collect(),
        )),
        (FormatVersion::V2, many) => {
            let parts: Vec<String> = many.iter().map(|v| format!("{v:04X}")).collect();
            Some(Plist::String(parts.join(",")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodes_in_both_versions() {
        let v3 = Plist::Array(vec![Plist::Integer(10), Plist::Float(20.5), "cs".into()]);
        let node = Node::from_plist(&v3, FormatVersion::V3).unwrap();
        assert_eq!(node.kind, NodeKind::Curve);
        assert!(node.smooth);
        assert_eq!(node.to_plist(FormatVersion::V3), v3);

        let v2 = Plist::String("354 0 LINE SMOOTH".into());
        let node = Node::from_plist(&v2, FormatVersion::V2).unwrap();
        assert_eq!((node.x, node.y, node.kind, node.smooth), (354.0, 0.0, NodeKind::Line, true));
        assert_eq!(node.to_plist(FormatVersion::V2), v2);

        assert!(Node::from_plist(&Plist::String("1 2 BOGUS".into()), FormatVersion::V2).is_none());
    }

    #[test]
    fn test_strings() {
        assert_eq!(parse_point_string("{300, -12.5}"), Some((300.0, -12.5)));
        assert_eq!(point_string(300.0, -12.5), "{300, -12.5}");
        assert_eq!(format_number(0.333333333), "0.33333");

        let affine = parse_transform_string("{1, 0, 0, 1, 10, 20}").unwrap();
        assert_eq!(affine, Affine::translate((10.0, 20.0)));
        assert_eq!(transform_string(affine), "{1, 0, 0, 1, 10, 20}");

        assert_eq!(parse_brace_name("{400, 100}"), Some(vec![400.0, 100.0]));
        assert_eq!(parse_brace_name("Bold Sep 12"), None);
        assert_eq!(brace_name(&[400.0]), "{400}");
    }

    #[test]
    fn test_unicodes() {
        // an unquoted 0041 is read as the integer 41
        assert_eq!(parse_unicodes(&Plist::Integer(41), FormatVersion::V2), vec![0x41]);
        assert_eq!(
            parse_unicodes(&Plist::String("00C5,212B".into()), FormatVersion::V2),
            vec![0xC5, 0x212B]
        );
        assert_eq!(parse_unicodes(&Plist::Integer(65), FormatVersion::V3), vec![65]);
        assert_eq!(
            unicodes_to_plist(&[0x41], FormatVersion::V2),
            Some(Plist::String("0041".into()))
        );
        assert_eq!(unicodes_to_plist(&[], FormatVersion::V3), None);
    }

    #[test]
    fn test_detect() {
        let mut root = Dict::new();
        assert_eq!(FormatVersion::detect(&root), FormatVersion::V2);
        root.insert(".formatVersion".into(), Plist::Integer(3));
        assert_eq!(FormatVersion::detect(&root), FormatVersion::V3);
    }
}
