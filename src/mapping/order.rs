//! Layer classification and source ordering
//!
//! Glyphs keeps layers in whatever order they were created. The host
//! needs a stable order, so sources are sorted with an explicit key:
//! font axis coordinates in axis declaration order, then glyph axis
//! coordinates, then the layer kind, then the declaration index.

use crate::font_source::{DesignSpace, Layer};
use std::cmp::Ordering;

/// The role a layer plays in a glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayerKind {
    /// The layer of a master
    Master,
    /// A smart glyph layer at a master location, with axis poles
    Smart,
    /// An intermediate layer at its own location
    Brace,
    /// A layer that is not a source, such as a backup copy
    Backup,
}

impl LayerKind {
    pub fn classify(layer: &Layer, design_space: &DesignSpace) -> Self {
        if layer.associated_master_id.is_none() || design_space.master(&layer.layer_id).is_some() {
            LayerKind::Master
        } else if layer.brace.is_some() {
            LayerKind::Brace
        } else if !layer.part_selection.is_empty() {
            LayerKind::Smart
        } else {
            LayerKind::Backup
        }
    }

    pub fn is_source(self) -> bool {
        self != LayerKind::Backup
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SourceKey {
    pub(crate) font: Vec<f64>,
    pub(crate) glyph: Vec<f64>,
    pub(crate) kind: LayerKind,
    pub(crate) index: usize,
}

fn compare_coordinates(a: &[f64], b: &[f64]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(a, b)| a.total_cmp(b))
        .find(|ordering| ordering.is_ne())
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}

impl Eq for SourceKey {}

impl Ord for SourceKey {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_coordinates(&self.font, &other.font)
            .then_with(|| compare_coordinates(&self.glyph, &other.glyph))
            .then_with(|| self.kind.cmp(&other.kind))
            .then_with(|| self.index.cmp(&other.index))
    }
}

impl PartialOrd for SourceKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(font: f64, kind: LayerKind, index: usize) -> SourceKey {
        SourceKey {
            font: vec![font],
            glyph: Vec::new(),
            kind,
            index,
        }
    }

    #[test]
    fn test_brace_layers_interleave_by_location() {
        let mut keys = vec![
            key(900.0, LayerKind::Master, 2),
            key(400.0, LayerKind::Brace, 1),
            key(100.0, LayerKind::Master, 0),
        ];
        keys.sort();
        let order: Vec<usize> = keys.iter().map(|k| k.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_ties_fall_back_to_kind_then_declaration() {
        let mut keys = vec![
            key(100.0, LayerKind::Brace, 0),
            key(100.0, LayerKind::Master, 3),
            key(100.0, LayerKind::Brace, 1),
        ];
        keys.sort();
        let order: Vec<(LayerKind, usize)> = keys.iter().map(|k| (k.kind, k.index)).collect();
        assert_eq!(
            order,
            vec![(LayerKind::Master, 3), (LayerKind::Brace, 0), (LayerKind::Brace, 1)]
        );
    }
}
