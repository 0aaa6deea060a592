use super::order::{LayerKind, SourceKey};
use super::{local_axis_name, plist_to_json, COMPONENT_ALIGNMENT_KEY, GLYPH_COLOR_KEY, LAYER_NAME_KEY, SOURCE_NAME_KEY};
use crate::core::errors::{BackendError, BackendResult};
use crate::font_source::{self as gs, smart, Glyph, Master, NodeKind, Package};
use crate::neutral::{
    Anchor, Component, Contour, CustomData, GlyphSource, Guideline, Layer, Location, PathPoint,
    PointKind, StaticGlyph, VariableGlyph,
};
use crate::plist::Plist;

/// The host-facing name of a layer
pub fn layer_name(layer: &gs::Layer) -> String {
    layer
        .user_data
        .get(LAYER_NAME_KEY)
        .and_then(Plist::as_str)
        .map_or_else(|| layer.layer_id.clone(), str::to_string)
}

/// Default source name when the host has not chosen one
pub(crate) fn default_source_name(layer: &gs::Layer, kind: LayerKind, master: &Master) -> String {
    match kind {
        LayerKind::Master => master.name.clone(),
        _ => format!("{} / {}", master.name, layer.name.as_deref().unwrap_or_default()),
    }
}

/// Build the neutral variable glyph for a Glyphs glyph
pub fn glyph_to_neutral(package: &Package, glyph: &Glyph) -> BackendResult<VariableGlyph> {
    let design_space = package.design_space();
    let font_axes: Vec<String> = design_space.axes.iter().map(|a| a.name.clone()).collect();
    let glyph_axes = smart::glyph_axes(glyph);

    let mut entries = Vec::new();
    for (index, layer) in glyph.layers.iter().enumerate() {
        let kind = LayerKind::classify(layer, design_space);
        if !kind.is_source() {
            continue;
        }
        let master = design_space.master(layer.master_id()).ok_or_else(|| {
            BackendError::unresolved(
                &glyph.name,
                format!("layer '{}' refers to unknown master '{}'", layer.layer_id, layer.master_id()),
            )
        })?;

        let font = match (&layer.brace, kind) {
            (Some(brace), LayerKind::Brace) => design_space.coordinates(&design_space.location(brace)),
            _ => master.values.clone(),
        };
        let poles: Vec<f64> = glyph
            .smart_axes
            .iter()
            .zip(&glyph_axes)
            .map(|(axis, glyph_axis)| match layer.part_selection.get(&axis.name) {
                Some(pole) => axis.pole_value(*pole),
                None => glyph_axis.default_value,
            })
            .collect();

        let mut location = design_space.location(&font);
        for (axis, value) in glyph_axes.iter().zip(&poles) {
            location.insert(local_axis_name(&axis.name, &font_axes), *value);
        }

        let name = layer
            .user_data
            .get(SOURCE_NAME_KEY)
            .and_then(Plist::as_str)
            .map_or_else(|| default_source_name(layer, kind, master), str::to_string);
        let source = GlyphSource::new(name, layer_name(layer), location);

        let key = SourceKey {
            font: design_space.active_axes().map(|(i, _)| font[i]).collect(),
            glyph: poles,
            kind,
            index,
        };
        entries.push((key, source, layer_to_neutral(layer, &font_axes)));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut neutral = VariableGlyph::new(&glyph.name);
    neutral.axes = glyph_axes
        .into_iter()
        .map(|mut axis| {
            axis.name = local_axis_name(&axis.name, &font_axes);
            axis
        })
        .collect();
    let mut seen: Vec<Location> = Vec::new();
    for (_, mut source, layer) in entries {
        if seen.contains(&source.location) {
            source.inactive = true;
        } else {
            seen.push(source.location.clone());
        }
        neutral.layers.insert(source.layer_name.clone(), layer);
        neutral.sources.push(source);
    }
    if let Some(color) = &glyph.color {
        neutral.custom_data.insert(GLYPH_COLOR_KEY.into(), plist_to_json(color));
    }
    Ok(neutral)
}

fn layer_to_neutral(layer: &gs::Layer, font_axes: &[String]) -> Layer {
    Layer {
        glyph: StaticGlyph {
            x_advance: layer.width,
            path: layer.paths().map(path_to_contour).collect(),
            components: layer
                .components()
                .map(|component| component_to_neutral(component, font_axes))
                .collect(),
            anchors: layer.anchors.iter().map(anchor_to_neutral).collect(),
            guidelines: layer
                .guides
                .iter()
                .map(|guide| Guideline {
                    name: guide.name.clone(),
                    x: guide.x,
                    y: guide.y,
                    angle: guide.angle,
                    locked: guide.locked,
                })
                .collect(),
        },
    }
}

/// Glyphs lists a closed contour starting after its last on-curve node;
/// the host expects that node first.
fn path_to_contour(path: &gs::Path) -> Contour {
    let nodes = &path.nodes;
    let count = nodes.len();
    let mut points: Vec<PathPoint> = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let kind = match node.kind {
                NodeKind::OffCurve => {
                    let next_on_curve = (1..=count)
                        .map(|step| i + step)
                        .take_while(|j| path.closed || *j < count)
                        .map(|j| &nodes[j % count])
                        .find(|n| n.kind != NodeKind::OffCurve);
                    match next_on_curve.map(|n| n.kind) {
                        Some(NodeKind::QCurve) => PointKind::OffCurveQuad,
                        _ => PointKind::OffCurve,
                    }
                }
                _ => PointKind::OnCurve,
            };
            PathPoint {
                x: node.x,
                y: node.y,
                kind,
                smooth: node.smooth,
            }
        })
        .collect();
    if path.closed && !points.is_empty() {
        points.rotate_right(1);
    }
    Contour {
        closed: path.closed,
        points,
    }
}

fn component_to_neutral(component: &gs::Component, font_axes: &[String]) -> Component {
    let mut custom_data = CustomData::new();
    if let Some(alignment) = component.alignment.filter(|a| *a != 0) {
        custom_data.insert(COMPONENT_ALIGNMENT_KEY.into(), alignment.into());
    }
    Component {
        name: component.base.clone(),
        transformation: component.transform,
        location: component
            .piece
            .iter()
            .map(|(axis, value)| (local_axis_name(axis, font_axes), *value))
            .collect(),
        custom_data,
    }
}

fn anchor_to_neutral(anchor: &gs::Anchor) -> Anchor {
    Anchor {
        name: anchor.name.clone(),
        x: anchor.x,
        y: anchor.y,
        custom_data: anchor
            .user_data
            .iter()
            .flatten()
            .map(|(key, value)| (key.clone(), plist_to_json(value)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_source::Node;

    #[test]
    fn test_closed_contour_starts_at_last_node() {
        let path = gs::Path::new(
            true,
            vec![
                Node::new(0.0, 0.0, NodeKind::OffCurve, false),
                Node::new(10.0, 10.0, NodeKind::OffCurve, false),
                Node::new(20.0, 10.0, NodeKind::Curve, true),
                Node::new(20.0, 0.0, NodeKind::Line, false),
            ],
        );
        let contour = path_to_contour(&path);
        let kinds: Vec<PointKind> = contour.points.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![PointKind::OnCurve, PointKind::OffCurve, PointKind::OffCurve, PointKind::OnCurve]
        );
        assert_eq!((contour.points[0].x, contour.points[0].y), (20.0, 0.0));
        assert!(contour.points[3].smooth);
    }

    #[test]
    fn test_quadratic_off_curves() {
        let path = gs::Path::new(
            true,
            vec![
                Node::new(0.0, 0.0, NodeKind::Line, false),
                Node::new(10.0, 10.0, NodeKind::OffCurve, false),
                Node::new(20.0, 0.0, NodeKind::QCurve, false),
            ],
        );
        let contour = path_to_contour(&path);
        assert_eq!(contour.points[2].kind, PointKind::OffCurveQuad);
    }
}
