//! Font axes and masters
//!
//! Axes are declared once per font; every master stores one value per
//! declared axis. An axis on which all masters agree carries no variation
//! and is left out of every location handed to the host.

use super::format::FormatVersion;
use super::glyph::Guide;
use super::metrics::MasterMetrics;
use crate::neutral::{FontAxis, FontSource, Location};
use crate::plist::{Dict, Plist};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub name: String,
    pub tag: String,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Master {
    pub id: String,
    pub name: String,
    /// One value per declared axis
    pub values: Vec<f64>,
    pub metrics: MasterMetrics,
    pub guides: Vec<Guide>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub default: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DesignSpace {
    pub axes: Vec<Axis>,
    pub masters: Vec<Master>,
    ranges: Vec<AxisRange>,
    default_master: usize,
}

/// Glyphs 2 master keys holding the value for the n-th axis
const V2_AXIS_KEYS: [(&str, f64); 6] = [
    ("weightValue", 100.0),
    ("widthValue", 100.0),
    ("customValue", 0.0),
    ("customValue1", 0.0),
    ("customValue2", 0.0),
    ("customValue3", 0.0),
];

fn custom_parameter<'a>(dict: &'a Dict, name: &str) -> Option<&'a Plist> {
    dict.get("customParameters")
        .and_then(Plist::as_array)?
        .iter()
        .find(|param| param.get("name").and_then(Plist::as_str) == Some(name))
        .and_then(|param| param.get("value"))
}

impl DesignSpace {
    pub fn from_root(root: &Dict, version: FormatVersion) -> Result<Self, String> {
        let axes = match version {
            FormatVersion::V3 => read_axes(root.get("axes"), "name", "tag")?,
            FormatVersion::V2 => match custom_parameter(root, "Axes") {
                Some(value) => read_axes(Some(value), "Name", "Tag")?,
                None => vec![
                    Axis {
                        name: "Weight".into(),
                        tag: "wght".into(),
                        hidden: false,
                    },
                    Axis {
                        name: "Width".into(),
                        tag: "wdth".into(),
                        hidden: false,
                    },
                    Axis {
                        name: "Custom".into(),
                        tag: "XXXX".into(),
                        hidden: false,
                    },
                ],
            },
        };
        if version == FormatVersion::V2 && axes.len() > V2_AXIS_KEYS.len() {
            return Err(format!("Glyphs 2 sources support at most {} axes", V2_AXIS_KEYS.len()));
        }

        let master_items = root
            .get("fontMaster")
            .and_then(Plist::as_array)
            .ok_or("missing 'fontMaster' list")?;
        if master_items.is_empty() {
            return Err("the font has no masters".into());
        }

        let mut seen = HashSet::new();
        let mut masters = Vec::with_capacity(master_items.len());
        for item in master_items {
            let master = read_master(root, item, &axes, version)?;
            if !seen.insert(master.id.clone()) {
                return Err(format!("duplicate master id '{}'", master.id));
            }
            masters.push(master);
        }

        let origin = custom_parameter(root, "Variable Font Origin").and_then(Plist::to_text);
        let default_master = origin
            .and_then(|origin| masters.iter().position(|m| m.id == origin || m.name == origin))
            .unwrap_or(0);

        let ranges = (0..axes.len())
            .map(|i| {
                let values = masters.iter().map(|m| m.values[i]);
                AxisRange {
                    min: values.clone().fold(f64::INFINITY, f64::min),
                    default: masters[default_master].values[i],
                    max: values.fold(f64::NEG_INFINITY, f64::max),
                }
            })
            .collect();

        Ok(Self {
            axes,
            masters,
            ranges,
            default_master,
        })
    }

    pub fn range(&self, axis: usize) -> &AxisRange {
        &self.ranges[axis]
    }

    /// Axes along which the masters actually vary, with their index
    pub fn active_axes(&self) -> impl Iterator<Item = (usize, &Axis)> + '_ {
        self.axes
            .iter()
            .enumerate()
            .filter(|(i, _)| self.ranges[*i].min != self.ranges[*i].max)
    }

    pub fn axis_index(&self, name: &str) -> Option<usize> {
        self.active_axes().find(|(_, axis)| axis.name == name).map(|(i, _)| i)
    }

    pub fn default_master(&self) -> &Master {
        &self.masters[self.default_master]
    }

    pub fn master(&self, id: &str) -> Option<&Master> {
        self.masters.iter().find(|master| master.id == id)
    }

    /// Location of a coordinate list, restricted to the active axes
    pub fn location(&self, values: &[f64]) -> Location {
        self.active_axes()
            .map(|(i, axis)| {
                let value = values.get(i).copied().unwrap_or(self.ranges[i].default);
                (axis.name.clone(), value)
            })
            .collect()
    }

    pub fn default_location(&self) -> Location {
        self.location(&self.default_master().values)
    }

    /// Expand a host location to coordinates over every declared axis.
    /// Missing axes take the default master's value.
    pub fn coordinates(&self, location: &Location) -> Vec<f64> {
        self.axes
            .iter()
            .enumerate()
            .map(|(i, axis)| {
                location
                    .get(&axis.name)
                    .copied()
                    .unwrap_or(self.ranges[i].default)
            })
            .collect()
    }

    /// The first active axis on which `coordinates` leave the master range
    pub fn out_of_range(&self, coordinates: &[f64]) -> Option<(&Axis, f64, &AxisRange)> {
        self.active_axes().find_map(|(i, axis)| {
            let range = &self.ranges[i];
            let value = coordinates.get(i).copied().unwrap_or(range.default);
            // NaN fails both comparisons, so test for being inside instead
            (!(range.min <= value && value <= range.max)).then_some((axis, value, range))
        })
    }

    /// The master sitting exactly at these coordinates
    pub fn master_at(&self, coordinates: &[f64]) -> Option<&Master> {
        self.masters.iter().find(|master| {
            self.active_axes()
                .all(|(i, _)| coordinates.get(i) == Some(&master.values[i]))
        })
    }

    /// The master closest to these coordinates, in normalized space
    pub fn nearest_master(&self, coordinates: &[f64]) -> &Master {
        let distance = |master: &Master| -> f64 {
            self.active_axes()
                .map(|(i, _)| {
                    let range = &self.ranges[i];
                    let span = (range.max - range.min).max(f64::EPSILON);
                    let value = coordinates.get(i).copied().unwrap_or(range.default);
                    ((master.values[i] - value) / span).powi(2)
                })
                .sum()
        };
        self.masters
            .iter()
            .min_by(|a, b| distance(a).total_cmp(&distance(b)))
            .unwrap_or_else(|| self.default_master())
    }

    pub fn font_axes(&self) -> Vec<FontAxis> {
        self.active_axes()
            .map(|(i, axis)| FontAxis {
                name: axis.name.clone(),
                tag: axis.tag.clone(),
                min_value: self.ranges[i].min,
                default_value: self.ranges[i].default,
                max_value: self.ranges[i].max,
                hidden: axis.hidden,
            })
            .collect()
    }

    pub fn font_sources(&self) -> Vec<FontSource> {
        self.masters
            .iter()
            .map(|master| FontSource {
                identifier: master.id.clone(),
                name: master.name.clone(),
                location: self.location(&master.values),
                italic_angle: master.metrics.italic_angle,
                line_metrics: master.metrics.lines.clone(),
                guidelines: master
                    .guides
                    .iter()
                    .map(|guide| crate::neutral::Guideline {
                        name: guide.name.clone(),
                        x: guide.x,
                        y: guide.y,
                        angle: guide.angle,
                        locked: guide.locked,
                    })
                    .collect(),
            })
            .collect()
    }
}

fn read_axes(value: Option<&Plist>, name_key: &str, tag_key: &str) -> Result<Vec<Axis>, String> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    let items = value.as_array().ok_or("axes are not a list")?;
    items
        .iter()
        .map(|item| {
            let name = item
                .get(name_key)
                .and_then(Plist::to_text)
                .ok_or("axis without a name")?;
            Ok(Axis {
                tag: item.get(tag_key).and_then(Plist::to_text).unwrap_or_default(),
                hidden: item.get("hidden").and_then(Plist::as_bool).unwrap_or(false),
                name,
            })
        })
        .collect()
}

fn read_master(
    root: &Dict,
    item: &Plist,
    axes: &[Axis],
    version: FormatVersion,
) -> Result<Master, String> {
    let dict = item.as_dict().ok_or("master is not a dictionary")?;
    let id = dict
        .get("id")
        .and_then(Plist::to_text)
        .ok_or("master without an id")?;

    let values = match version {
        FormatVersion::V3 => {
            let stored = dict.get("axesValues").and_then(Plist::as_array).unwrap_or(&[]);
            (0..axes.len())
                .map(|i| stored.get(i).and_then(Plist::as_f64).unwrap_or(0.0))
                .collect()
        }
        FormatVersion::V2 => V2_AXIS_KEYS
            .iter()
            .take(axes.len())
            .map(|(key, default)| dict.get(*key).and_then(Plist::as_f64).unwrap_or(*default))
            .collect(),
    };

    let name = dict
        .get("name")
        .and_then(Plist::to_text)
        .or_else(|| custom_parameter(dict, "Master Name").and_then(Plist::to_text))
        .unwrap_or_else(|| v2_master_name(dict));

    let guides = dict
        .get(version.guides_key())
        .and_then(Plist::as_array)
        .unwrap_or(&[])
        .iter()
        .map(|guide| Guide::from_plist(guide, version))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|message| format!("master {id}: {message}"))?;

    Ok(Master {
        metrics: MasterMetrics::from_master(root, dict, version),
        id,
        name,
        values,
        guides,
    })
}

/// Glyphs 2 masters are named after their width, weight and custom labels
fn v2_master_name(dict: &Dict) -> String {
    let parts: Vec<String> = ["width", "weight", "custom"]
        .iter()
        .filter_map(|key| dict.get(*key).and_then(Plist::to_text))
        .filter(|part| !part.is_empty() && part != "Regular")
        .collect();
    if parts.is_empty() {
        "Regular".to_string()
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plist::parse;

    fn design_space(text: &str) -> DesignSpace {
        let root = parse(text).unwrap();
        let root = root.as_dict().unwrap();
        DesignSpace::from_root(root, FormatVersion::detect(root)).unwrap()
    }

    #[test]
    fn test_glyphs3_axes_and_origin() {
        let space = design_space(
            r#"{
.formatVersion = 3;
axes = ({name = Weight; tag = wght;}, {name = Slant; tag = slnt; hidden = 1;});
customParameters = ({name = "Variable Font Origin"; value = m02;});
fontMaster = ({id = m01; name = Light; axesValues = (100, 0);}, {id = m02; name = Bold; axesValues = (900, 0);});
}"#,
        );
        assert_eq!(space.default_master().id, "m02");
        let axes = space.font_axes();
        // Slant does not vary and is left out
        assert_eq!(axes.len(), 1);
        assert_eq!((axes[0].min_value, axes[0].default_value, axes[0].max_value), (100.0, 900.0, 900.0));
        assert_eq!(space.master_at(&[100.0, 0.0]).map(|m| m.name.as_str()), Some("Light"));
        assert_eq!(space.nearest_master(&[400.0, 0.0]).id, "m01");
        assert_eq!(space.coordinates(&Location::new()), vec![900.0, 0.0]);

        assert!(space.out_of_range(&[100.0, 0.0]).is_none());
        assert!(space.out_of_range(&[900.0, 0.0]).is_none());
        // Slant is inactive and never checked
        assert!(space.out_of_range(&[400.0, 12.0]).is_none());
        let (axis, value, _) = space.out_of_range(&[901.0, 0.0]).unwrap();
        assert_eq!((axis.name.as_str(), value), ("Weight", 901.0));
        assert!(space.out_of_range(&[f64::NAN, 0.0]).is_some());
    }

    #[test]
    fn test_glyphs2_axes() {
        let space = design_space(
            r#"{
customParameters = ({name = Axes; value = ({Name = Weight; Tag = wght;});});
fontMaster = ({id = A; weight = Light; weightValue = 50;}, {id = B; weight = Bold; weightValue = 200;});
}"#,
        );
        assert_eq!(space.axes.len(), 1);
        assert_eq!(space.masters[1].name, "Bold");
        assert_eq!(space.location(&space.masters[0].values)["Weight"], 50.0);
    }

    #[test]
    fn test_duplicate_master_ids_are_rejected() {
        let root = parse("{.formatVersion = 3; fontMaster = ({id = m01;}, {id = m01;});}").unwrap();
        let error = DesignSpace::from_root(root.as_dict().unwrap(), FormatVersion::V3).unwrap_err();
        assert!(error.contains("duplicate master id"));
    }
}
