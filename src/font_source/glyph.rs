//! Typed view of Glyphs glyph dictionaries
//!
//! Every type keeps the keys it does not understand in an [`Extra`],
//! together with the original key order, so that writing a value back
//! reproduces whatever Glyphs (or a plugin) stored there.

use super::format::{self, FormatVersion, Node};
use crate::neutral::DecomposedTransform;
use crate::plist::{Dict, Plist};
use indexmap::IndexMap;

/// Unknown keys of a dictionary plus the order all keys were read in
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Extra {
    entries: Dict,
    order: Vec<String>,
}

impl Extra {
    /// Split off everything except `known`
    pub fn from_dict(dict: &Dict, known: &[&str]) -> Self {
        Self {
            entries: dict
                .iter()
                .filter(|(key, _)| !known.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            order: dict.keys().cloned().collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Plist> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Plist) {
        self.entries.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rebuild the dictionary from freshly written `known` values. Keys
    /// that were present before keep their position; new keys are placed
    /// alphabetically, which is how Glyphs orders them.
    pub fn compose(&self, mut known: Dict) -> Dict {
        let mut out = Dict::with_capacity(known.len() + self.entries.len());
        for key in &self.order {
            if let Some(value) = known.shift_remove(key) {
                out.insert(key.clone(), value);
            } else if let Some(value) = self.entries.get(key) {
                out.insert(key.clone(), value.clone());
            }
        }
        let pending = known.into_iter().chain(
            self.entries
                .iter()
                .filter(|(key, _)| !self.order.contains(key))
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        for (key, value) in pending {
            insert_sorted(&mut out, key, value);
        }
        out
    }
}

fn insert_sorted(dict: &mut Dict, key: String, value: Plist) {
    let index = dict
        .keys()
        .position(|existing| existing.as_str() > key.as_str())
        .unwrap_or(dict.len());
    dict.shift_insert(index, key, value);
}

fn dict_of(value: &Plist) -> Option<&Dict> {
    value.as_dict()
}

fn number(dict: &Dict, key: &str) -> Option<f64> {
    dict.get(key).and_then(Plist::as_f64)
}

fn pair(dict: &Dict, key: &str) -> Option<(f64, f64)> {
    dict.get(key).and_then(format::parse_position)
}

fn pair_plist(x: f64, y: f64) -> Plist {
    Plist::Array(vec![Plist::number(x), Plist::number(y)])
}

#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub closed: bool,
    pub nodes: Vec<Node>,
    pub extra: Extra,
}

impl Path {
    pub fn new(closed: bool, nodes: Vec<Node>) -> Self {
        Self {
            closed,
            nodes,
            extra: Extra::default(),
        }
    }

    fn from_plist(value: &Plist, version: FormatVersion) -> Result<Self, String> {
        let dict = dict_of(value).ok_or("path is not a dictionary")?;
        let nodes = match dict.get("nodes") {
            Some(Plist::Array(items)) => items
                .iter()
                .map(|item| Node::from_plist(item, version).ok_or("malformed node"))
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err("path nodes are not an array".into()),
            None => Vec::new(),
        };
        Ok(Self {
            closed: dict.get("closed").and_then(Plist::as_bool).unwrap_or(false),
            nodes,
            extra: Extra::from_dict(dict, &["closed", "nodes"]),
        })
    }

    fn to_plist(&self, version: FormatVersion) -> Plist {
        let mut known = Dict::new();
        known.insert("closed".into(), self.closed.into());
        known.insert(
            "nodes".into(),
            Plist::Array(self.nodes.iter().map(|node| node.to_plist(version)).collect()),
        );
        Plist::Dict(self.extra.compose(known))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub base: String,
    pub transform: DecomposedTransform,
    /// Smart component axis values, in file order
    pub piece: IndexMap<String, f64>,
    pub alignment: Option<i64>,
    pub extra: Extra,
}

impl Component {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            transform: DecomposedTransform::default(),
            piece: IndexMap::new(),
            alignment: None,
            extra: Extra::default(),
        }
    }

    fn from_plist(value: &Plist, version: FormatVersion) -> Result<Self, String> {
        let dict = dict_of(value).ok_or("component is not a dictionary")?;
        let base = dict
            .get(version.component_base_key())
            .and_then(Plist::to_text)
            .ok_or("component without a base glyph")?;

        let transform = match version {
            FormatVersion::V3 => {
                let (translate_x, translate_y) = pair(dict, "pos").unwrap_or((0.0, 0.0));
                let (scale_x, scale_y) = pair(dict, "scale").unwrap_or((1.0, 1.0));
                let (skew_x, skew_y) = pair(dict, "slant").unwrap_or((0.0, 0.0));
                DecomposedTransform {
                    translate_x,
                    translate_y,
                    rotation: number(dict, "angle").unwrap_or(0.0),
                    scale_x,
                    scale_y,
                    skew_x,
                    skew_y,
                    ..DecomposedTransform::default()
                }
            }
            FormatVersion::V2 => match dict.get("transform").and_then(Plist::as_str) {
                Some(text) => format::parse_transform_string(text)
                    .map(DecomposedTransform::from_affine)
                    .ok_or("malformed component transform")?,
                None => DecomposedTransform::default(),
            },
        };

        let piece = dict
            .get("piece")
            .and_then(Plist::as_dict)
            .map(|piece| {
                piece
                    .iter()
                    .filter_map(|(axis, value)| value.as_f64().map(|v| (axis.clone(), v)))
                    .collect()
            })
            .unwrap_or_default();

        let known: &[&str] = match version {
            FormatVersion::V3 => &["ref", "pos", "angle", "scale", "slant", "piece", "alignment"],
            FormatVersion::V2 => &["name", "transform", "piece", "alignment"],
        };
        Ok(Self {
            base,
            transform,
            piece,
            alignment: dict.get("alignment").and_then(Plist::as_i64),
            extra: Extra::from_dict(dict, known),
        })
    }

    fn to_plist(&self, version: FormatVersion) -> Plist {
        let mut known = Dict::new();
        if let Some(alignment) = self.alignment.filter(|a| *a != 0) {
            known.insert("alignment".into(), alignment.into());
        }
        let t = self.transform.without_center();
        match version {
            FormatVersion::V3 => {
                if t.rotation != 0.0 {
                    known.insert("angle".into(), Plist::number(t.rotation));
                }
                if t.translate_x != 0.0 || t.translate_y != 0.0 {
                    known.insert("pos".into(), pair_plist(t.translate_x, t.translate_y));
                }
                known.insert("ref".into(), self.base.as_str().into());
                if t.scale_x != 1.0 || t.scale_y != 1.0 {
                    known.insert("scale".into(), pair_plist(t.scale_x, t.scale_y));
                }
                if t.has_skew() {
                    known.insert("slant".into(), pair_plist(t.skew_x, t.skew_y));
                }
            }
            FormatVersion::V2 => {
                known.insert("name".into(), self.base.as_str().into());
                let affine = t.to_affine();
                if affine != kurbo::Affine::IDENTITY {
                    known.insert("transform".into(), format::transform_string(affine).into());
                }
            }
        }
        if !self.piece.is_empty() {
            let piece: Dict = self
                .piece
                .iter()
                .map(|(axis, value)| (axis.clone(), Plist::number(*value)))
                .collect();
            known.insert("piece".into(), piece.into());
        }
        Plist::Dict(self.extra.compose(known))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Path(Path),
    Component(Component),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub user_data: Option<Dict>,
    pub extra: Extra,
}

impl Anchor {
    pub fn new(name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            user_data: None,
            extra: Extra::default(),
        }
    }

    fn from_plist(value: &Plist, version: FormatVersion) -> Result<Self, String> {
        let dict = dict_of(value).ok_or("anchor is not a dictionary")?;
        let key = version.anchor_position_key();
        let (x, y) = pair(dict, key).unwrap_or((0.0, 0.0));
        Ok(Self {
            name: dict.get("name").and_then(Plist::to_text).unwrap_or_default(),
            x,
            y,
            user_data: dict.get("userData").and_then(Plist::as_dict).cloned(),
            extra: Extra::from_dict(dict, &["name", key, "userData"]),
        })
    }

    fn to_plist(&self, version: FormatVersion) -> Plist {
        let mut known = Dict::new();
        known.insert("name".into(), self.name.as_str().into());
        if self.x != 0.0 || self.y != 0.0 {
            known.insert(
                version.anchor_position_key().into(),
                format::position_to_plist(self.x, self.y, version),
            );
        }
        if let Some(user_data) = self.user_data.as_ref().filter(|d| !d.is_empty()) {
            known.insert("userData".into(), user_data.clone().into());
        }
        Plist::Dict(self.extra.compose(known))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Guide {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub name: Option<String>,
    pub locked: bool,
    pub extra: Extra,
}

impl Guide {
    pub fn new(x: f64, y: f64, angle: f64) -> Self {
        Self {
            x,
            y,
            angle,
            name: None,
            locked: false,
            extra: Extra::default(),
        }
    }

    pub(crate) fn from_plist(value: &Plist, version: FormatVersion) -> Result<Self, String> {
        let dict = dict_of(value).ok_or("guide is not a dictionary")?;
        let key = version.anchor_position_key();
        let (x, y) = pair(dict, key).unwrap_or((0.0, 0.0));
        Ok(Self {
            x,
            y,
            angle: number(dict, "angle").unwrap_or(0.0),
            name: dict.get("name").and_then(Plist::to_text),
            locked: dict.get("locked").and_then(Plist::as_bool).unwrap_or(false),
            extra: Extra::from_dict(dict, &[key, "angle", "name", "locked"]),
        })
    }

    fn to_plist(&self, version: FormatVersion) -> Plist {
        let mut known = Dict::new();
        if self.angle != 0.0 {
            known.insert("angle".into(), Plist::number(self.angle));
        }
        if self.locked {
            known.insert("locked".into(), true.into());
        }
        if let Some(name) = &self.name {
            known.insert("name".into(), name.as_str().into());
        }
        if self.x != 0.0 || self.y != 0.0 {
            known.insert(
                version.anchor_position_key().into(),
                format::position_to_plist(self.x, self.y, version),
            );
        }
        Plist::Dict(self.extra.compose(known))
    }
}

/// Which end of a smart axis a smart layer sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pole {
    Min,
    Max,
}

impl Pole {
    fn from_plist(value: &Plist) -> Option<Self> {
        match value.as_i64()? {
            1 => Some(Pole::Min),
            2 => Some(Pole::Max),
            _ => None,
        }
    }

    fn to_plist(self) -> Plist {
        match self {
            Pole::Min => Plist::Integer(1),
            Pole::Max => Plist::Integer(2),
        }
    }
}

/// A smart component axis declared in `partsSettings`
#[derive(Debug, Clone, PartialEq)]
pub struct SmartAxis {
    pub name: String,
    pub bottom: f64,
    pub top: f64,
    pub extra: Extra,
}

impl SmartAxis {
    pub fn new(name: impl Into<String>, bottom: f64, top: f64) -> Self {
        Self {
            name: name.into(),
            bottom,
            top,
            extra: Extra::default(),
        }
    }

    pub fn min(&self) -> f64 {
        self.bottom.min(self.top)
    }

    pub fn max(&self) -> f64 {
        self.bottom.max(self.top)
    }

    pub fn pole_value(&self, pole: Pole) -> f64 {
        match pole {
            Pole::Min => self.bottom,
            Pole::Max => self.top,
        }
    }

    fn from_plist(value: &Plist) -> Result<Self, String> {
        let dict = dict_of(value).ok_or("smart axis is not a dictionary")?;
        Ok(Self {
            name: dict
                .get("name")
                .and_then(Plist::to_text)
                .ok_or("smart axis without a name")?,
            bottom: number(dict, "bottomValue").unwrap_or(0.0),
            top: number(dict, "topValue").unwrap_or(0.0),
            extra: Extra::from_dict(dict, &["name", "bottomValue", "topValue"]),
        })
    }

    fn to_plist(&self) -> Plist {
        let mut known = Dict::new();
        known.insert("name".into(), self.name.as_str().into());
        known.insert("bottomValue".into(), Plist::number(self.bottom));
        known.insert("topValue".into(), Plist::number(self.top));
        Plist::Dict(self.extra.compose(known))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub layer_id: String,
    pub associated_master_id: Option<String>,
    pub name: Option<String>,
    pub width: f64,
    /// Brace layer coordinates, one per declared font axis
    pub brace: Option<Vec<f64>>,
    pub part_selection: IndexMap<String, Pole>,
    pub shapes: Vec<Shape>,
    pub anchors: Vec<Anchor>,
    pub guides: Vec<Guide>,
    pub user_data: Dict,
    /// Glyphs 3 layer attributes other than the brace coordinates
    pub attr: Dict,
    pub extra: Extra,
}

/// Width Glyphs assumes when a layer does not store one
pub const DEFAULT_WIDTH: f64 = 600.0;

impl Layer {
    pub fn new(layer_id: impl Into<String>) -> Self {
        Self {
            layer_id: layer_id.into(),
            associated_master_id: None,
            name: None,
            width: DEFAULT_WIDTH,
            brace: None,
            part_selection: IndexMap::new(),
            shapes: Vec::new(),
            anchors: Vec::new(),
            guides: Vec::new(),
            user_data: Dict::new(),
            attr: Dict::new(),
            extra: Extra::default(),
        }
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.shapes.iter().filter_map(|shape| match shape {
            Shape::Path(path) => Some(path),
            Shape::Component(_) => None,
        })
    }

    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.shapes.iter().filter_map(|shape| match shape {
            Shape::Component(component) => Some(component),
            Shape::Path(_) => None,
        })
    }

    pub fn components_mut(&mut self) -> impl Iterator<Item = &mut Component> {
        self.shapes.iter_mut().filter_map(|shape| match shape {
            Shape::Component(component) => Some(component),
            Shape::Path(_) => None,
        })
    }

    /// The master this layer belongs to, for master layers its own id
    pub fn master_id(&self) -> &str {
        self.associated_master_id.as_deref().unwrap_or(&self.layer_id)
    }

    fn from_plist(value: &Plist, version: FormatVersion) -> Result<Self, String> {
        let dict = dict_of(value).ok_or("layer is not a dictionary")?;
        let layer_id = dict
            .get("layerId")
            .and_then(Plist::to_text)
            .ok_or("layer without a layerId")?;
        let context = |message: String| format!("layer {layer_id}: {message}");

        let mut shapes = Vec::new();
        match version {
            FormatVersion::V3 => {
                for item in array(dict, "shapes").map_err(context)? {
                    let shape = if item.get("ref").is_some() {
                        Shape::Component(Component::from_plist(item, version).map_err(context)?)
                    } else {
                        Shape::Path(Path::from_plist(item, version).map_err(context)?)
                    };
                    shapes.push(shape);
                }
            }
            FormatVersion::V2 => {
                for item in array(dict, "paths").map_err(context)? {
                    shapes.push(Shape::Path(Path::from_plist(item, version).map_err(context)?));
                }
                for item in array(dict, "components").map_err(context)? {
                    shapes.push(Shape::Component(
                        Component::from_plist(item, version).map_err(context)?,
                    ));
                }
            }
        }

        let anchors = array(dict, "anchors")
            .map_err(context)?
            .iter()
            .map(|item| Anchor::from_plist(item, version))
            .collect::<Result<Vec<_>, _>>()
            .map_err(context)?;
        let guides = array(dict, version.guides_key())
            .map_err(context)?
            .iter()
            .map(|item| Guide::from_plist(item, version))
            .collect::<Result<Vec<_>, _>>()
            .map_err(context)?;

        let name = dict.get("name").and_then(Plist::to_text);
        let mut attr = dict.get("attr").and_then(Plist::as_dict).cloned().unwrap_or_default();
        let brace: Option<Vec<f64>> = match version {
            FormatVersion::V3 => attr.shift_remove("coordinates").and_then(|value| {
                value
                    .as_array()
                    .map(|items| items.iter().filter_map(Plist::as_f64).collect())
            }),
            FormatVersion::V2 => name.as_deref().and_then(format::parse_brace_name),
        };

        let part_selection = dict
            .get("partSelection")
            .and_then(Plist::as_dict)
            .map(|selection| {
                selection
                    .iter()
                    .filter_map(|(axis, pole)| Pole::from_plist(pole).map(|p| (axis.clone(), p)))
                    .collect()
            })
            .unwrap_or_default();

        let known: &[&str] = match version {
            FormatVersion::V3 => &[
                "layerId",
                "associatedMasterId",
                "name",
                "width",
                "attr",
                "partSelection",
                "shapes",
                "anchors",
                "guides",
                "userData",
            ],
            FormatVersion::V2 => &[
                "layerId",
                "associatedMasterId",
                "name",
                "width",
                "partSelection",
                "paths",
                "components",
                "anchors",
                "guideLines",
                "userData",
            ],
        };

        Ok(Self {
            associated_master_id: dict.get("associatedMasterId").and_then(Plist::to_text),
            name,
            width: number(dict, "width").unwrap_or(DEFAULT_WIDTH),
            brace,
            part_selection,
            shapes,
            anchors,
            guides,
            user_data: dict.get("userData").and_then(Plist::as_dict).cloned().unwrap_or_default(),
            attr,
            extra: Extra::from_dict(dict, known),
            layer_id,
        })
    }

    fn to_plist(&self, version: FormatVersion) -> Plist {
        let mut known = Dict::new();
        if !self.anchors.is_empty() {
            let anchors = self.anchors.iter().map(|a| a.to_plist(version)).collect::<Vec<_>>();
            known.insert("anchors".into(), anchors.into());
        }
        if let Some(master) = &self.associated_master_id {
            known.insert("associatedMasterId".into(), master.as_str().into());
        }
        if !self.guides.is_empty() {
            let guides = self.guides.iter().map(|g| g.to_plist(version)).collect::<Vec<_>>();
            known.insert(version.guides_key().into(), guides.into());
        }
        known.insert("layerId".into(), self.layer_id.as_str().into());
        if let Some(name) = &self.name {
            known.insert("name".into(), name.as_str().into());
        }
        if !self.part_selection.is_empty() {
            let selection: Dict = self
                .part_selection
                .iter()
                .map(|(axis, pole)| (axis.clone(), pole.to_plist()))
                .collect();
            known.insert("partSelection".into(), selection.into());
        }
        match version {
            FormatVersion::V3 => {
                let mut attr = self.attr.clone();
                if let Some(brace) = &self.brace {
                    let coordinates = brace.iter().map(|v| Plist::number(*v)).collect::<Vec<_>>();
                    attr.insert("coordinates".into(), coordinates.into());
                }
                if !attr.is_empty() {
                    known.insert("attr".into(), attr.into());
                }
                if !self.shapes.is_empty() {
                    let shapes = self
                        .shapes
                        .iter()
                        .map(|shape| match shape {
                            Shape::Path(path) => path.to_plist(version),
                            Shape::Component(component) => component.to_plist(version),
                        })
                        .collect::<Vec<_>>();
                    known.insert("shapes".into(), shapes.into());
                }
            }
            FormatVersion::V2 => {
                let paths = self.paths().map(|p| p.to_plist(version)).collect::<Vec<_>>();
                if !paths.is_empty() {
                    known.insert("paths".into(), paths.into());
                }
                let components = self.components().map(|c| c.to_plist(version)).collect::<Vec<_>>();
                if !components.is_empty() {
                    known.insert("components".into(), components.into());
                }
            }
        }
        if !self.user_data.is_empty() {
            known.insert("userData".into(), self.user_data.clone().into());
        }
        known.insert("width".into(), Plist::number(self.width));
        Plist::Dict(self.extra.compose(known))
    }
}

fn array<'a>(dict: &'a Dict, key: &str) -> Result<&'a [Plist], String> {
    match dict.get(key) {
        Some(Plist::Array(items)) => Ok(items),
        Some(_) => Err(format!("'{key}' is not an array")),
        None => Ok(&[]),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub name: String,
    pub unicodes: Vec<u32>,
    /// Color label, either an index or an RGBA tuple
    pub color: Option<Plist>,
    pub smart_axes: Vec<SmartAxis>,
    pub layers: Vec<Layer>,
    pub extra: Extra,
}

impl Glyph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unicodes: Vec::new(),
            color: None,
            smart_axes: Vec::new(),
            layers: Vec::new(),
            extra: Extra::default(),
        }
    }

    pub fn layer(&self, layer_id: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.layer_id == layer_id)
    }

    pub fn smart_axis(&self, name: &str) -> Option<&SmartAxis> {
        self.smart_axes.iter().find(|axis| axis.name == name)
    }

    pub fn is_smart(&self) -> bool {
        !self.smart_axes.is_empty()
    }

    /// Base glyph names of every component on every layer
    pub fn component_bases(&self) -> impl Iterator<Item = &str> {
        self.layers
            .iter()
            .flat_map(|layer| layer.components())
            .map(|component| component.base.as_str())
    }

    pub fn from_plist(value: &Plist, version: FormatVersion) -> Result<Self, String> {
        let dict = dict_of(value).ok_or("glyph is not a dictionary")?;
        let name = dict
            .get("glyphname")
            .and_then(Plist::to_text)
            .ok_or("glyph without a glyphname")?;
        let context = |message: String| format!("glyph '{name}': {message}");

        let layers = array(dict, "layers")
            .map_err(context)?
            .iter()
            .map(|item| Layer::from_plist(item, version))
            .collect::<Result<Vec<_>, _>>()
            .map_err(context)?;
        let smart_axes = array(dict, "partsSettings")
            .map_err(context)?
            .iter()
            .map(SmartAxis::from_plist)
            .collect::<Result<Vec<_>, _>>()
            .map_err(context)?;

        Ok(Self {
            unicodes: dict
                .get("unicode")
                .map(|value| format::parse_unicodes(value, version))
                .unwrap_or_default(),
            color: dict.get("color").cloned(),
            smart_axes,
            layers,
            extra: Extra::from_dict(
                dict,
                &["glyphname", "unicode", "color", "partsSettings", "layers"],
            ),
            name,
        })
    }

    pub fn to_plist(&self, version: FormatVersion) -> Plist {
        let mut known = Dict::new();
        if let Some(color) = &self.color {
            known.insert("color".into(), color.clone());
        }
        known.insert("glyphname".into(), self.name.as_str().into());
        let layers = self.layers.iter().map(|l| l.to_plist(version)).collect::<Vec<_>>();
        known.insert("layers".into(), layers.into());
        if !self.smart_axes.is_empty() {
            let axes = self.smart_axes.iter().map(SmartAxis::to_plist).collect::<Vec<_>>();
            known.insert("partsSettings".into(), axes.into());
        }
        if let Some(unicode) = format::unicodes_to_plist(&self.unicodes, version) {
            known.insert("unicode".into(), unicode);
        }
        Plist::Dict(self.extra.compose(known))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plist::parse;

    const GLYPH_V3: &str = r#"{
glyphname = e;
lastChange = "2024-01-01 00:00:00 +0000";
layers = (
{
layerId = m01;
shapes = (
{
closed = 1;
nodes = (
(100,0,l),
(200,0,l),
(150,100,l)
);
},
{
piece = {
weight = 50;
};
pos = (10,0);
ref = o.smart;
}
);
hints = (
);
width = 500;
}
);
unicode = 101;
}"#;

    #[test]
    fn test_unchanged_glyph_serializes_identically() {
        let value = parse(GLYPH_V3).unwrap();
        let glyph = Glyph::from_plist(&value, FormatVersion::V3).unwrap();
        assert_eq!(glyph.unicodes, vec![101]);
        assert_eq!(glyph.layers[0].shapes.len(), 2);

        let written = glyph.to_plist(FormatVersion::V3);
        assert_eq!(written, value);
        assert_eq!(crate::plist::to_glyphs_string(&written), GLYPH_V3);
    }

    #[test]
    fn test_component_fields() {
        let value = parse(GLYPH_V3).unwrap();
        let glyph = Glyph::from_plist(&value, FormatVersion::V3).unwrap();
        let component = glyph.layers[0].components().next().unwrap();
        assert_eq!(component.base, "o.smart");
        assert_eq!(component.piece.get("weight"), Some(&50.0));
        assert_eq!(component.transform.translate_x, 10.0);
        assert_eq!(glyph.component_bases().collect::<Vec<_>>(), vec!["o.smart"]);
    }

    #[test]
    fn test_new_keys_are_sorted_in() {
        let mut dict = Dict::new();
        dict.insert("layerId".into(), "m01".into());
        dict.insert("width".into(), Plist::Integer(600));
        let extra = Extra::from_dict(&dict, &["layerId", "width"]);

        let mut known = Dict::new();
        known.insert("layerId".into(), "m01".into());
        known.insert("width".into(), Plist::Integer(500));
        known.insert("name".into(), "{400}".into());
        known.insert("anchors".into(), Plist::Array(vec![]));
        let keys: Vec<String> = extra.compose(known).keys().cloned().collect();
        assert_eq!(keys, vec!["anchors", "layerId", "name", "width"]);
    }

    #[test]
    fn test_glyphs2_layer() {
        let text = r#"{
glyphname = A;
layers = (
{
anchors = (
{
name = top;
position = "{300, 700}";
}
);
associatedMasterId = m01;
components = (
{
name = B;
transform = "{1, 0, 0, 1, 50, 0}";
}
);
layerId = "7B1F";
name = "{400}";
paths = (
{
closed = 1;
nodes = (
"0 0 LINE",
"100 0 LINE"
);
}
);
width = 600;
}
);
unicode = 0041;
}"#;
        let value = parse(text).unwrap();
        let glyph = Glyph::from_plist(&value, FormatVersion::V2).unwrap();
        let layer = &glyph.layers[0];
        assert_eq!(glyph.unicodes, vec![0x41]);
        assert_eq!(layer.brace, Some(vec![400.0]));
        assert_eq!(layer.master_id(), "m01");
        assert_eq!(layer.anchors[0].x, 300.0);
        assert_eq!(layer.components().next().unwrap().transform.translate_x, 50.0);
        assert_eq!(layer.paths().next().unwrap().nodes.len(), 2);

        let reparsed = Glyph::from_plist(&glyph.to_plist(FormatVersion::V2), FormatVersion::V2).unwrap();
        assert_eq!(reparsed, glyph);
    }
}
