//! Vertical metrics of a master
//!
//! Glyphs 3 keeps a font-wide list of metric types with one value per
//! master; Glyphs 2 stores the metrics directly on the master plus a list
//! of alignment zones.

use super::format::{parse_position, FormatVersion};
use crate::neutral::LineMetric;
use crate::plist::{Dict, Plist};
use std::collections::BTreeMap;

/// Metric names as exposed to the host
pub const ASCENDER: &str = "ascender";
pub const CAP_HEIGHT: &str = "capHeight";
pub const X_HEIGHT: &str = "xHeight";
pub const BASELINE: &str = "baseline";
pub const DESCENDER: &str = "descender";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MasterMetrics {
    pub lines: BTreeMap<String, LineMetric>,
    pub italic_angle: f64,
}

impl MasterMetrics {
    pub fn from_master(root: &Dict, master: &Dict, version: FormatVersion) -> Self {
        match version {
            FormatVersion::V3 => Self::from_metric_values(root, master),
            FormatVersion::V2 => Self::from_master_keys(master),
        }
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.lines.get(name).map(|metric| metric.value)
    }

    fn from_metric_values(root: &Dict, master: &Dict) -> Self {
        let types = root.get("metrics").and_then(Plist::as_array).unwrap_or(&[]);
        let values = master.get("metricValues").and_then(Plist::as_array).unwrap_or(&[]);

        let mut metrics = MasterMetrics::default();
        for (kind, value) in types.iter().zip(values) {
            // named metrics are custom ones, not part of the standard set
            if kind.get("name").is_some() {
                continue;
            }
            let Some(kind) = kind.get("type").and_then(Plist::as_str) else {
                continue;
            };
            let pos = value.get("pos").and_then(Plist::as_f64).unwrap_or(0.0);
            let over = value.get("over").and_then(Plist::as_f64).unwrap_or(0.0);
            let name = match kind {
                "ascender" => ASCENDER,
                "cap height" => CAP_HEIGHT,
                "x-height" => X_HEIGHT,
                "baseline" => BASELINE,
                "descender" => DESCENDER,
                "italic angle" => {
                    metrics.italic_angle = pos;
                    continue;
                }
                _ => continue,
            };
            metrics.lines.insert(name.to_string(), LineMetric { value: pos, zone: over });
        }
        metrics
    }

    fn from_master_keys(master: &Dict) -> Self {
        let zones: Vec<(f64, f64)> = master
            .get("alignmentZones")
            .and_then(Plist::as_array)
            .unwrap_or(&[])
            .iter()
            .filter_map(parse_position)
            .collect();
        let zone_at = |position: f64| {
            zones
                .iter()
                .find(|(zone_position, _)| *zone_position == position)
                .map_or(0.0, |(_, size)| *size)
        };

        let mut metrics = MasterMetrics {
            italic_angle: master.get("italicAngle").and_then(Plist::as_f64).unwrap_or(0.0),
            ..MasterMetrics::default()
        };
        let keys = [
            (ASCENDER, "ascender", 800.0),
            (CAP_HEIGHT, "capHeight", 700.0),
            (X_HEIGHT, "xHeight", 500.0),
            (DESCENDER, "descender", -200.0),
        ];
        for (name, key, default) in keys {
            let value = master.get(key).and_then(Plist::as_f64).unwrap_or(default);
            metrics.lines.insert(
                name.to_string(),
                LineMetric {
                    value,
                    zone: zone_at(value),
                },
            );
        }
        metrics.lines.insert(
            BASELINE.to_string(),
            LineMetric {
                value: 0.0,
                zone: zone_at(0.0),
            },
        );
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plist::parse;

    #[test]
    fn test_glyphs3_metric_values() {
        let root = parse(
            r#"{metrics = ({type = ascender;}, {type = "cap height";}, {type = baseline;}, {name = hook; type = "x-height";}, {type = "italic angle";});}"#,
        )
        .unwrap();
        let master = parse(
            r#"{metricValues = ({over = 16; pos = 800;}, {pos = 700;}, {over = -16;}, {pos = 10;}, {pos = 12;});}"#,
        )
        .unwrap();
        let metrics = MasterMetrics::from_master(
            root.as_dict().unwrap(),
            master.as_dict().unwrap(),
            FormatVersion::V3,
        );
        assert_eq!(metrics.lines[ASCENDER], LineMetric { value: 800.0, zone: 16.0 });
        assert_eq!(metrics.value(CAP_HEIGHT), Some(700.0));
        assert_eq!(metrics.lines[BASELINE].zone, -16.0);
        assert_eq!(metrics.value(X_HEIGHT), None);
        assert_eq!(metrics.italic_angle, 12.0);
    }

    #[test]
    fn test_glyphs2_master_keys() {
        let master = parse(
            r#"{ascender = 750; xHeight = 480; alignmentZones = ("{750, 12}", "{0, -12}");}"#,
        )
        .unwrap();
        let metrics = MasterMetrics::from_master(&Dict::new(), master.as_dict().unwrap(), FormatVersion::V2);
        assert_eq!(metrics.lines[ASCENDER], LineMetric { value: 750.0, zone: 12.0 });
        assert_eq!(metrics.lines[BASELINE].zone, -12.0);
        assert_eq!(metrics.value(CAP_HEIGHT), Some(700.0));
    }
}
