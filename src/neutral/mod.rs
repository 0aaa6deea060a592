//! The format-neutral variable glyph model exchanged with the host
//!
//! These types are what the editor sees: a glyph is a list of sources,
//! each binding a design-space location to a layer of outlines,
//! components, anchors and guidelines. Nothing in here knows about
//! Glyphs; the mapping lives in [`crate::mapping`].

mod transform;

pub use transform::DecomposedTransform;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A design-space location, axis name to value
pub type Location = BTreeMap<String, f64>;

/// Free-form data attached to glyphs, components and anchors
pub type CustomData = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VariableGlyph {
    pub name: String,
    /// Glyph-local axes (smart component axes)
    pub axes: Vec<GlyphAxis>,
    pub sources: Vec<GlyphSource>,
    pub layers: IndexMap<String, Layer>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_data: CustomData,
}

impl VariableGlyph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The layer a source points at
    pub fn source_layer(&self, source: &GlyphSource) -> Option<&Layer> {
        self.layers.get(&source.layer_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlyphAxis {
    pub name: String,
    pub min_value: f64,
    pub default_value: f64,
    pub max_value: f64,
}

impl GlyphAxis {
    pub fn new(name: impl Into<String>, min_value: f64, default_value: f64, max_value: f64) -> Self {
        Self {
            name: name.into(),
            min_value,
            default_value,
            max_value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlyphSource {
    pub name: String,
    pub layer_name: String,
    pub location: Location,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub inactive: bool,
}

impl GlyphSource {
    pub fn new(name: impl Into<String>, layer_name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            layer_name: layer_name.into(),
            location,
            inactive: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Layer {
    pub glyph: StaticGlyph,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StaticGlyph {
    pub x_advance: f64,
    pub path: Vec<Contour>,
    pub components: Vec<Component>,
    pub anchors: Vec<Anchor>,
    pub guidelines: Vec<Guideline>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Contour {
    pub closed: bool,
    pub points: Vec<PathPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PointKind {
    #[default]
    OnCurve,
    /// Cubic control point
    OffCurve,
    /// Quadratic control point
    OffCurveQuad,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
    pub kind: PointKind,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub smooth: bool,
}

impl PathPoint {
    pub fn on(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            kind: PointKind::OnCurve,
            smooth: false,
        }
    }

    pub fn off(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            kind: PointKind::OffCurve,
            smooth: false,
        }
    }

    pub fn is_on_curve(&self) -> bool {
        self.kind == PointKind::OnCurve
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Component {
    pub name: String,
    pub transformation: DecomposedTransform,
    /// Smart component axis values
    pub location: Location,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_data: CustomData,
}

impl Component {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Anchor {
    pub name: String,
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_data: CustomData,
}

impl Anchor {
    pub fn new(name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            custom_data: CustomData::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Guideline {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub locked: bool,
}

/// A font-level axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontAxis {
    pub name: String,
    pub tag: String,
    pub min_value: f64,
    pub default_value: f64,
    pub max_value: f64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineMetric {
    pub value: f64,
    pub zone: f64,
}

/// A font-level source (a master)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FontSource {
    pub identifier: String,
    pub name: String,
    pub location: Location,
    pub italic_angle: f64,
    pub line_metrics: BTreeMap<String, LineMetric>,
    /// Read-only in this backend
    pub guidelines: Vec<Guideline>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FontInfo {
    pub family_name: Option<String>,
    pub version_major: Option<i64>,
    pub version_minor: Option<i64>,
    pub copyright: Option<String>,
    pub designer: Option<String>,
    #[serde(rename = "designerURL")]
    pub designer_url: Option<String>,
    pub license_description: Option<String>,
    pub manufacturer: Option<String>,
    #[serde(rename = "manufacturerURL")]
    pub manufacturer_url: Option<String>,
    pub trademark: Option<String>,
    #[serde(rename = "vendorID")]
    pub vendor_id: Option<String>,
    pub units_per_em: f64,
    pub axes: Vec<FontAxis>,
    pub sources: Vec<FontSource>,
}

/// One kerning table. Pair values hold one entry per source identifier;
/// `None` marks a pair a source does not kern.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Kerning {
    /// Group name (with its side prefix) to member glyphs
    pub groups: IndexMap<String, Vec<String>>,
    pub source_identifiers: Vec<String>,
    pub values: IndexMap<String, IndexMap<String, Vec<Option<f64>>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenTypeFeatures {
    pub language: String,
    pub text: String,
}

impl OpenTypeFeatures {
    pub fn fea(text: impl Into<String>) -> Self {
        Self {
            language: "fea".to_string(),
            text: text.into(),
        }
    }
}
