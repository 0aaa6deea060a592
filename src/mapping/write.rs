use super::capabilities::{Capability, WriteCapabilities};
use super::order::LayerKind;
use super::read::{default_source_name, layer_name};
use super::{glyph_axis_name, json_to_plist, COMPONENT_ALIGNMENT_KEY, GLYPH_COLOR_KEY, LAYER_NAME_KEY, SOURCE_NAME_KEY};
use crate::core::errors::{BackendError, BackendResult, WriteError};
use crate::font_source::format::brace_name;
use crate::font_source::{self as gs, smart, DesignSpace, Glyph, Node, NodeKind, Package, Pole, Shape, SmartAxis};
use crate::neutral::{self, Contour, GlyphAxis, PointKind, StaticGlyph, VariableGlyph};
use crate::plist::Dict;
use indexmap::IndexMap;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// What a glyph write needs besides the glyph itself
pub struct WriteContext<'a> {
    pub package: &'a Package,
    pub capabilities: &'a WriteCapabilities,
}

/// Where a source ends up in the Glyphs glyph
#[derive(Debug, Clone, PartialEq)]
enum Placement {
    Master { master: String },
    Smart { master: String, poles: IndexMap<String, Pole> },
    Brace { master: String, coordinates: Vec<f64> },
}

impl Placement {
    fn kind(&self) -> LayerKind {
        match self {
            Placement::Master { .. } => LayerKind::Master,
            Placement::Smart { .. } => LayerKind::Smart,
            Placement::Brace { .. } => LayerKind::Brace,
        }
    }

    fn master(&self) -> &str {
        match self {
            Placement::Master { master }
            | Placement::Smart { master, .. }
            | Placement::Brace { master, .. } => master,
        }
    }
}

/// Merge a neutral glyph into the existing Glyphs glyph (or a new one)
pub fn neutral_to_glyph(
    ctx: &WriteContext<'_>,
    name: &str,
    existing: Option<&Glyph>,
    neutral: &VariableGlyph,
) -> BackendResult<Glyph> {
    let design_space = ctx.package.design_space();
    let font_axes: Vec<String> = design_space.axes.iter().map(|a| a.name.clone()).collect();

    let mut glyph = existing.cloned().unwrap_or_else(|| Glyph::new(name));
    glyph.name = name.to_string();

    // host axis name -> Glyphs axis name
    let axis_names: HashMap<&str, &str> = neutral
        .axes
        .iter()
        .map(|axis| (axis.name.as_str(), glyph_axis_name(&axis.name, &font_axes)))
        .collect();
    let removed_axes = update_smart_axes(&mut glyph, neutral, &font_axes)?;
    let glyph_axes: Vec<&GlyphAxis> = neutral.axes.iter().collect();
    let default_poles: IndexMap<String, Pole> = glyph_axes
        .iter()
        .map(|axis| {
            let pole = if axis.default_value == axis.min_value { Pole::Min } else { Pole::Max };
            (axis_names[axis.name.as_str()].to_string(), pole)
        })
        .collect();

    glyph.color = neutral.custom_data.get(GLYPH_COLOR_KEY).and_then(json_to_plist);

    let old_layers = std::mem::take(&mut glyph.layers);
    let old_kinds: Vec<LayerKind> = old_layers
        .iter()
        .map(|layer| LayerKind::classify(layer, design_space))
        .collect();
    let by_name: HashMap<String, usize> = old_layers
        .iter()
        .enumerate()
        .filter(|(i, _)| old_kinds[*i].is_source())
        .map(|(i, layer)| (layer_name(layer), i))
        .collect();

    let mut used_ids: HashSet<String> = old_layers.iter().map(|l| l.layer_id.clone()).collect();
    let mut claimed_masters = HashSet::new();
    let mut claimed_layers = HashSet::new();
    let mut updated: Vec<Option<gs::Layer>> = vec![None; old_layers.len()];
    let mut created = Vec::new();

    for source in &neutral.sources {
        if !claimed_layers.insert(source.layer_name.as_str()) {
            return Err(WriteError::Invalid(format!(
                "glyph '{name}': more than one source uses layer '{}'",
                source.layer_name
            ))
            .into());
        }
        let content = neutral.layers.get(&source.layer_name).ok_or_else(|| {
            WriteError::Invalid(format!(
                "glyph '{name}': source '{}' refers to missing layer '{}'",
                source.name, source.layer_name
            ))
        })?;

        // split the location into font and glyph axes
        let mut font_location = neutral::Location::new();
        let mut glyph_location = HashMap::new();
        for (axis, value) in &source.location {
            if let Some(glyph_axis) = axis_names.get(axis.as_str()) {
                glyph_location.insert(*glyph_axis, *value);
            } else if design_space.axis_index(axis).is_some() {
                font_location.insert(axis.clone(), *value);
            } else {
                return Err(BackendError::unresolved(
                    name,
                    format!("source '{}' uses unknown axis '{axis}'", source.name),
                ));
            }
        }
        let coordinates = design_space.coordinates(&font_location);
        if let Some((axis, value, range)) = design_space.out_of_range(&coordinates) {
            return Err(BackendError::unresolved(
                name,
                format!(
                    "source '{}' sets {}={value}, outside the axis range {}..{}",
                    source.name, axis.name, range.min, range.max
                ),
            ));
        }
        let master = design_space.master_at(&coordinates).map(|m| m.id.clone());

        let mut placement = if glyph_axes.is_empty() {
            match master {
                Some(master) => Placement::Master { master },
                None => Placement::Brace {
                    master: design_space.nearest_master(&coordinates).id.clone(),
                    coordinates,
                },
            }
        } else {
            let Some(master) = master else {
                return Err(WriteError::Unsupported(format!(
                    "glyph '{name}': source '{}' is off the master locations; \
                     brace layers in smart glyphs cannot be written",
                    source.name
                ))
                .into());
            };
            let mut poles = IndexMap::new();
            for axis in &glyph_axes {
                let glyph_axis = axis_names[axis.name.as_str()];
                let value = glyph_location.get(glyph_axis).copied().unwrap_or(axis.default_value);
                let pole = if value == axis.min_value {
                    Pole::Min
                } else if value == axis.max_value {
                    Pole::Max
                } else {
                    return Err(WriteError::Unsupported(format!(
                        "glyph '{name}': source '{}' sits between the poles of axis '{}'; \
                         intermediate smart layers cannot be written",
                        source.name, axis.name
                    ))
                    .into());
                };
                poles.insert(glyph_axis.to_string(), pole);
            }
            if poles == default_poles {
                Placement::Master { master }
            } else {
                Placement::Smart { master, poles }
            }
        };

        // a second source at a master location becomes a brace layer there
        let master = placement.master().to_string();
        if placement.kind() == LayerKind::Master && !claimed_masters.insert(master.clone()) {
            if !glyph_axes.is_empty() {
                return Err(WriteError::Invalid(format!(
                    "glyph '{name}': two sources share the location of master '{master}'"
                ))
                .into());
            }
            placement = Placement::Brace {
                master,
                coordinates: design_space.coordinates(&font_location),
            };
        }

        let old_index = by_name.get(&source.layer_name).copied();
        let old_kind = old_index.map(|i| old_kinds[i]);
        if placement.kind() == LayerKind::Brace && old_kind != Some(LayerKind::Brace) {
            ctx.capabilities.require(Capability::BraceLayers)?;
        }

        let mut layer = match old_index {
            Some(i) => old_layers[i].clone(),
            None => gs::Layer::new(String::new()),
        };
        place_layer(
            &mut layer,
            &placement,
            design_space,
            &default_poles,
            &mut used_ids,
            &source.name,
        );

        let master = design_space
            .master(placement.master())
            .ok_or_else(|| BackendError::unresolved(name, "placement on an unknown master"))?;
        let default_name = default_source_name(&layer, placement.kind(), master);
        set_user_string(&mut layer.user_data, SOURCE_NAME_KEY, &source.name, &default_name);
        let layer_id = layer.layer_id.clone();
        set_user_string(&mut layer.user_data, LAYER_NAME_KEY, &source.layer_name, &layer_id);

        apply_content(ctx, name, &mut layer, &content.glyph)?;
        match old_index {
            Some(i) => updated[i] = Some(layer),
            None => created.push(layer),
        }
    }

    for (i, old) in old_layers.into_iter().enumerate() {
        match updated[i].take() {
            Some(layer) => glyph.layers.push(layer),
            None if old_kinds[i].is_source() => {
                if old_kinds[i] == LayerKind::Brace {
                    ctx.capabilities.require(Capability::BraceLayers)?;
                }
                debug!("Dropping layer {} of glyph '{name}'", old.layer_id);
            }
            None => {
                let mut old = old;
                old.part_selection.retain(|axis, _| !removed_axes.contains(axis));
                glyph.layers.push(old);
            }
        }
    }
    glyph.layers.extend(created);
    Ok(glyph)
}

/// Bring `partsSettings` in line with the host's glyph axes. Returns the
/// names of axes that were removed.
fn update_smart_axes(
    glyph: &mut Glyph,
    neutral: &VariableGlyph,
    font_axes: &[String],
) -> BackendResult<Vec<String>> {
    let mut old: Vec<SmartAxis> = std::mem::take(&mut glyph.smart_axes);
    let mut seen = HashSet::new();
    for axis in &neutral.axes {
        let axis_name = glyph_axis_name(&axis.name, font_axes);
        if !seen.insert(axis_name) {
            return Err(WriteError::Invalid(format!(
                "glyph '{}' declares axis '{axis_name}' twice",
                glyph.name
            ))
            .into());
        }
        if axis.default_value != axis.min_value && axis.default_value != axis.max_value {
            return Err(WriteError::Unsupported(format!(
                "glyph axis '{}' of '{}' must have its default at the minimum or maximum",
                axis.name, glyph.name
            ))
            .into());
        }
        let mut smart_axis = match old.iter().position(|a| a.name == axis_name) {
            Some(i) => old.remove(i),
            None => SmartAxis::new(axis_name, axis.min_value, axis.max_value),
        };
        smart_axis.bottom = axis.min_value;
        smart_axis.top = axis.max_value;
        glyph.smart_axes.push(smart_axis);
    }
    Ok(old.into_iter().map(|axis| axis.name).collect())
}

fn new_layer_id(used: &mut HashSet<String>) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let id = format!(
            "{:08X}-{:04X}-4{:03X}-{:04X}-{:012X}",
            rng.gen::<u32>(),
            rng.gen::<u16>(),
            rng.gen::<u16>() & 0x0fff,
            (rng.gen::<u16>() & 0x3fff) | 0x8000,
            rng.gen::<u64>() & 0xffff_ffff_ffff
        );
        if used.insert(id.clone()) {
            return id;
        }
    }
}

fn place_layer(
    layer: &mut gs::Layer,
    placement: &Placement,
    design_space: &DesignSpace,
    default_poles: &IndexMap<String, Pole>,
    used_ids: &mut HashSet<String>,
    source_name: &str,
) {
    let is_new = layer.layer_id.is_empty();
    let was_master = !is_new && layer.associated_master_id.is_none();
    match placement {
        Placement::Master { master } => {
            layer.layer_id = master.clone();
            layer.associated_master_id = None;
            layer.brace = None;
            layer.part_selection = default_poles.clone();
            if !was_master {
                layer.name = None;
            }
        }
        Placement::Smart { master, poles } => {
            if is_new || was_master {
                layer.layer_id = new_layer_id(used_ids);
                layer.name = Some(source_name.to_string());
            }
            layer.associated_master_id = Some(master.clone());
            layer.brace = None;
            layer.part_selection = poles.clone();
        }
        Placement::Brace { master, coordinates } => {
            if is_new || was_master {
                layer.layer_id = new_layer_id(used_ids);
            }
            layer.associated_master_id = Some(master.clone());
            layer.part_selection.clear();
            // an unchanged location keeps its stored spelling; a short
            // coordinate list stands for the default on the missing axes
            let unchanged = layer.brace.as_ref().is_some_and(|brace| {
                design_space.coordinates(&design_space.location(brace)) == *coordinates
            });
            if !unchanged {
                layer.brace = Some(coordinates.clone());
                layer.name = Some(brace_name(coordinates));
            }
        }
    }
}

/// Store a host-chosen string in user data unless it matches the default
fn set_user_string(user_data: &mut Dict, key: &str, value: &str, default: &str) {
    if value == default {
        user_data.shift_remove(key);
    } else {
        user_data.insert(key.to_string(), value.into());
    }
}

fn apply_content(
    ctx: &WriteContext<'_>,
    glyph_name: &str,
    layer: &mut gs::Layer,
    content: &StaticGlyph,
) -> BackendResult<()> {
    layer.width = content.x_advance;

    let old_paths: Vec<gs::Path> = layer.paths().cloned().collect();
    let old_components: Vec<gs::Component> = layer.components().cloned().collect();
    let paths = content
        .path
        .iter()
        .enumerate()
        .map(|(i, contour)| contour_to_path(contour, old_paths.get(i)))
        .collect::<Result<Vec<_>, _>>()?;
    let components = content
        .components
        .iter()
        .enumerate()
        .map(|(i, component)| {
            component_from_neutral(ctx, glyph_name, component, old_components.get(i))
        })
        .collect::<BackendResult<Vec<_>>>()?;

    if paths.len() == old_paths.len() && components.len() == old_components.len() {
        // same counts: keep the original interleaving
        let mut paths = paths.into_iter();
        let mut components = components.into_iter();
        for shape in &mut layer.shapes {
            match shape {
                Shape::Path(path) => {
                    if let Some(new) = paths.next() {
                        *path = new;
                    }
                }
                Shape::Component(component) => {
                    if let Some(new) = components.next() {
                        *component = new;
                    }
                }
            }
        }
    } else {
        layer.shapes = paths
            .into_iter()
            .map(Shape::Path)
            .chain(components.into_iter().map(Shape::Component))
            .collect();
    }

    let mut old_anchors = std::mem::take(&mut layer.anchors);
    layer.anchors = content
        .anchors
        .iter()
        .map(|anchor| {
            let mut new = match old_anchors.iter().position(|old| old.name == anchor.name) {
                Some(i) => old_anchors.remove(i),
                None => gs::Anchor::new(anchor.name.clone(), 0.0, 0.0),
            };
            new.x = anchor.x;
            new.y = anchor.y;
            let user_data: Dict = anchor
                .custom_data
                .iter()
                .filter_map(|(key, value)| json_to_plist(value).map(|v| (key.clone(), v)))
                .collect();
            // keep an explicitly empty dictionary as read
            if !user_data.is_empty() || new.user_data.as_ref().map_or(false, |d| !d.is_empty()) {
                new.user_data = Some(user_data);
            }
            new
        })
        .collect();

    let old_guides = std::mem::take(&mut layer.guides);
    layer.guides = content
        .guidelines
        .iter()
        .enumerate()
        .map(|(i, guideline)| {
            let mut guide = old_guides
                .get(i)
                .cloned()
                .unwrap_or_else(|| gs::Guide::new(0.0, 0.0, 0.0));
            guide.x = guideline.x;
            guide.y = guideline.y;
            guide.angle = guideline.angle;
            guide.name = guideline.name.clone();
            guide.locked = guideline.locked;
            guide
        })
        .collect();
    Ok(())
}

/// Inverse of the read-side rotation: Glyphs wants a closed contour's
/// first on-curve node last.
fn contour_to_path(contour: &Contour, old: Option<&gs::Path>) -> Result<gs::Path, WriteError> {
    let points = &contour.points;
    let count = points.len();
    if contour.closed && count > 0 && points.iter().all(|p| !p.is_on_curve()) {
        return Err(WriteError::Unsupported(
            "closed contours without on-curve points".into(),
        ));
    }
    let mut nodes: Vec<Node> = points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let kind = match point.kind {
                PointKind::OffCurve | PointKind::OffCurveQuad => NodeKind::OffCurve,
                PointKind::OnCurve => {
                    let previous = if i > 0 {
                        Some(&points[i - 1])
                    } else if contour.closed {
                        points.last()
                    } else {
                        None
                    };
                    match previous.map(|p| p.kind) {
                        Some(PointKind::OffCurve) => NodeKind::Curve,
                        Some(PointKind::OffCurveQuad) => NodeKind::QCurve,
                        _ => NodeKind::Line,
                    }
                }
            };
            Node::new(point.x, point.y, kind, point.smooth && point.is_on_curve())
        })
        .collect();
    if contour.closed && !nodes.is_empty() {
        nodes.rotate_left(1);
    }

    let mut path = match old {
        Some(old) => old.clone(),
        None => gs::Path::new(contour.closed, Vec::new()),
    };
    if path.nodes.len() == nodes.len() {
        for (node, old) in nodes.iter_mut().zip(&path.nodes) {
            node.user_data = old.user_data.clone();
        }
    }
    path.closed = contour.closed;
    path.nodes = nodes;
    Ok(path)
}

fn component_from_neutral(
    ctx: &WriteContext<'_>,
    glyph_name: &str,
    component: &neutral::Component,
    old: Option<&gs::Component>,
) -> BackendResult<gs::Component> {
    if component.transformation.has_skew() {
        ctx.capabilities.require(Capability::ComponentSkew)?;
    }
    let font_axes: Vec<String> = ctx
        .package
        .design_space()
        .axes
        .iter()
        .map(|a| a.name.clone())
        .collect();
    let base = ctx.package.lookup(&component.name).ok();
    let old = old.filter(|old| old.base == component.name);

    // previous key order first, then the base glyph's axis order
    let values: HashMap<&str, f64> = component
        .location
        .iter()
        .map(|(axis, value)| (glyph_axis_name(axis, &font_axes), *value))
        .collect();
    let mut order: Vec<&str> = old.map(|o| o.piece.keys().map(String::as_str).collect()).unwrap_or_default();
    if let Some(base) = base {
        order.extend(base.smart_axes.iter().map(|axis| axis.name.as_str()));
    }
    let mut remaining: Vec<&str> = values.keys().copied().collect();
    remaining.sort_unstable();
    order.extend(remaining);
    let mut piece = IndexMap::new();
    for axis in order {
        if let Some(value) = values.get(axis) {
            piece.entry(axis.to_string()).or_insert(*value);
        }
    }

    // ranges are checked against the base glyph as it is now
    if let Some(base) = base {
        smart::check_values(glyph_name, base, &piece)?;
    }

    let mut new = match old {
        Some(old) => old.clone(),
        None => gs::Component::new(component.name.clone()),
    };
    new.transform = component.transformation;
    new.piece = piece;
    new.alignment = component
        .custom_data
        .get(COMPONENT_ALIGNMENT_KEY)
        .and_then(|value| value.as_i64())
        // read hides a stored 0, so a missing key keeps it; any other
        // stored value is cleared
        .or(new.alignment.filter(|a| *a == 0));
    Ok(new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neutral::PathPoint;
    use crate::plist::Plist;

    #[test]
    fn test_contour_to_path_rotates_and_types_nodes() {
        let contour = Contour {
            closed: true,
            points: vec![
                PathPoint::on(20.0, 0.0),
                PathPoint::on(0.0, 0.0),
                PathPoint::off(10.0, 10.0),
                PathPoint::off(15.0, 10.0),
                PathPoint {
                    smooth: true,
                    ..PathPoint::on(20.0, 10.0)
                },
            ],
        };
        let path = contour_to_path(&contour, None).unwrap();
        let kinds: Vec<NodeKind> = path.nodes.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Line,
                NodeKind::OffCurve,
                NodeKind::OffCurve,
                NodeKind::Curve,
                NodeKind::Line
            ]
        );
        assert!(path.nodes[3].smooth);
        assert_eq!((path.nodes[4].x, path.nodes[4].y), (20.0, 0.0));
    }

    #[test]
    fn test_all_off_curve_contour_is_unsupported() {
        let contour = Contour {
            closed: true,
            points: vec![PathPoint::off(0.0, 0.0), PathPoint::off(10.0, 10.0)],
        };
        assert!(matches!(
            contour_to_path(&contour, None),
            Err(WriteError::Unsupported(_))
        ));
    }

    #[test]
    fn test_component_alignment_follows_custom_data() {
        let package = Package::from_glyphs_text(
            "Test.glyphs",
            crate::test_fixtures::GLYPHS3_SOURCE.to_string(),
        )
        .unwrap();
        let capabilities = WriteCapabilities::default();
        let ctx = WriteContext {
            package: &package,
            capabilities: &capabilities,
        };
        let mut stored = gs::Component::new("A".to_string());
        let mut component = neutral::Component::new("A");

        stored.alignment = Some(0);
        let written = component_from_neutral(&ctx, "B", &component, Some(&stored)).unwrap();
        assert_eq!(written.alignment, Some(0));

        stored.alignment = Some(-1);
        let written = component_from_neutral(&ctx, "B", &component, Some(&stored)).unwrap();
        assert_eq!(written.alignment, None);

        component.custom_data.insert(COMPONENT_ALIGNMENT_KEY.into(), 1.into());
        let written = component_from_neutral(&ctx, "B", &component, Some(&stored)).unwrap();
        assert_eq!(written.alignment, Some(1));
    }

    #[test]
    fn test_user_string_is_only_stored_when_it_differs() {
        let mut user_data = Dict::new();
        set_user_string(&mut user_data, SOURCE_NAME_KEY, "Light", "Light");
        assert!(user_data.is_empty());
        set_user_string(&mut user_data, SOURCE_NAME_KEY, "Thin", "Light");
        assert_eq!(user_data.get(SOURCE_NAME_KEY), Some(&Plist::from("Thin")));
    }
}
