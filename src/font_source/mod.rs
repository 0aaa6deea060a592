//! Glyphs source data structures
//!
//! This module contains everything that models the Glyphs file itself
//! (masters, glyphs, layers, feature code), as opposed to the neutral
//! model handed to the host.

pub mod designspace;
pub mod features;
pub mod format;
pub mod glyph;
pub mod index;
pub mod metrics;
pub mod package;
pub mod smart;

// Explicit re-exports for public API
pub use designspace::{Axis, DesignSpace, Master};
pub use features::{FeatureBlock, FeatureKind, FeatureTextStore};
pub use format::{FormatVersion, Node, NodeKind};
pub use glyph::{Anchor, Component, Glyph, Guide, Layer, Path, Pole, Shape, SmartAxis};
pub use index::GlyphIndex;
pub use metrics::MasterMetrics;
pub use package::{Layout, Package};
pub use smart::ResolvedComponent;
