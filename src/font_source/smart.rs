//! Smart component resolution
//!
//! A smart glyph declares named axes in `partsSettings`; a component
//! using it picks a value per axis in its `piece`. Values are checked
//! against the base glyph every time, never against a cached range, since
//! the base glyph may have been edited in between.

use super::glyph::{Component, Glyph, Pole};
use super::package::Package;
use crate::core::errors::{BackendError, BackendResult};
use crate::neutral::GlyphAxis;
use indexmap::IndexMap;

/// A component whose smart axis values passed the range check
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedComponent {
    pub base: String,
    /// Values as stored on the component
    pub location: IndexMap<String, f64>,
    /// Every axis of the base glyph, unset axes at their default
    pub full_location: IndexMap<String, f64>,
    pub axes: Vec<GlyphAxis>,
}

/// The glyph's smart axes. Glyphs has no default value for them: the
/// default sits at whichever pole the first layer selects.
pub fn glyph_axes(glyph: &Glyph) -> Vec<GlyphAxis> {
    let selection = glyph.layers.first().map(|layer| &layer.part_selection);
    glyph
        .smart_axes
        .iter()
        .map(|axis| {
            let pole = selection
                .and_then(|selection| selection.get(&axis.name))
                .copied()
                .unwrap_or(Pole::Min);
            GlyphAxis::new(axis.name.clone(), axis.min(), axis.pole_value(pole), axis.max())
        })
        .collect()
}

/// Check smart axis values against the base glyph's declared ranges
pub fn check_values(
    glyph_name: &str,
    base: &Glyph,
    values: &IndexMap<String, f64>,
) -> BackendResult<Vec<GlyphAxis>> {
    let axes = glyph_axes(base);
    if values.is_empty() {
        return Ok(axes);
    }
    if axes.is_empty() {
        return Err(BackendError::unresolved(
            glyph_name,
            format!("component '{}' sets axis values but the glyph has no smart axes", base.name),
        ));
    }
    for (name, value) in values {
        let Some(axis) = axes.iter().find(|axis| &axis.name == name) else {
            return Err(BackendError::unresolved(
                glyph_name,
                format!("'{}' has no smart axis named '{name}'", base.name),
            ));
        };
        // NaN fails both comparisons, so test for being inside instead
        if !(axis.min_value <= *value && *value <= axis.max_value) {
            return Err(BackendError::AxisRange {
                glyph: glyph_name.to_string(),
                component: base.name.clone(),
                axis: name.clone(),
                value: *value,
                min: axis.min_value,
                max: axis.max_value,
            });
        }
    }
    Ok(axes)
}

/// Resolve one component of `glyph_name` against its base glyph
pub fn resolve(
    package: &Package,
    glyph_name: &str,
    component: &Component,
) -> BackendResult<ResolvedComponent> {
    let base = package.lookup(&component.base)?;
    let axes = check_values(glyph_name, base, &component.piece)?;
    let full_location = axes
        .iter()
        .map(|axis| {
            let value = component
                .piece
                .get(&axis.name)
                .copied()
                .unwrap_or(axis.default_value);
            (axis.name.clone(), value)
        })
        .collect();
    Ok(ResolvedComponent {
        base: component.base.clone(),
        location: component.piece.clone(),
        full_location,
        axes,
    })
}

/// Resolve the `index`-th component on a layer of a glyph
pub fn resolve_at(
    package: &Package,
    glyph_name: &str,
    layer_id: &str,
    index: usize,
) -> BackendResult<ResolvedComponent> {
    let glyph = package.lookup(glyph_name)?;
    let layer = glyph.layer(layer_id).ok_or_else(|| BackendError::NotFound {
        kind: "layer",
        name: format!("{glyph_name}/{layer_id}"),
    })?;
    let component = layer.components().nth(index).ok_or_else(|| BackendError::NotFound {
        kind: "component",
        name: format!("{glyph_name}/{layer_id}#{index}"),
    })?;
    resolve(package, glyph_name, component)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_source::glyph::{Layer, SmartAxis};

    fn smart_glyph() -> Glyph {
        let mut glyph = Glyph::new("o.smart");
        glyph.smart_axes.push(SmartAxis::new("weight", 0.0, 100.0));
        let mut layer = Layer::new("m01");
        layer.part_selection.insert("weight".into(), Pole::Max);
        glyph.layers.push(layer);
        glyph
    }

    fn values(value: f64) -> IndexMap<String, f64> {
        IndexMap::from([("weight".to_string(), value)])
    }

    #[test]
    fn test_default_follows_first_layer_pole() {
        let axes = glyph_axes(&smart_glyph());
        assert_eq!(axes, vec![GlyphAxis::new("weight", 0.0, 100.0, 100.0)]);
    }

    #[test]
    fn test_boundaries_are_accepted() {
        let base = smart_glyph();
        assert!(check_values("e", &base, &values(0.0)).is_ok());
        assert!(check_values("e", &base, &values(100.0)).is_ok());
        assert!(check_values("e", &base, &values(50.0)).is_ok());
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        let base = smart_glyph();
        for value in [-1e-9, 100.0 + 1e-9, 150.0, f64::NAN] {
            assert!(matches!(
                check_values("e", &base, &values(value)),
                Err(BackendError::AxisRange { .. })
            ));
        }
    }

    #[test]
    fn test_unknown_axis_is_unresolved() {
        let base = smart_glyph();
        let unknown = IndexMap::from([("width".to_string(), 10.0)]);
        assert!(matches!(
            check_values("e", &base, &unknown),
            Err(BackendError::UnresolvedLocation { .. })
        ));
        assert!(matches!(
            check_values("e", &Glyph::new("o"), &values(10.0)),
            Err(BackendError::UnresolvedLocation { .. })
        ));
    }
}
