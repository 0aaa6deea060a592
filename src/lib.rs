//! Bezy Glyphs
//!
//! A storage backend that serves `.glyphs` and `.glyphspackage` sources
//! through a neutral variable-glyph model and writes edits back with
//! minimal diffs.

pub mod backend;
pub mod core;
pub mod font_source;
pub mod io;
pub mod logging;
pub mod mapping;
pub mod neutral;
pub mod plist;

pub use backend::GlyphsBackend;

#[cfg(test)]
mod test_fixtures;
