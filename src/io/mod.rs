//! Writing sources back to disk

pub mod glyph_files;
pub mod planner;

pub use planner::{render_all, save, save_all, PlannedFile, WritePlan};
