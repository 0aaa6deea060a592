//! Glyph name lookup
//!
//! Maps glyph names to their position in the package's glyph list. The
//! package updates the index in the same call that changes the list, so a
//! lookup never sees a stale or duplicate name.

use crate::core::errors::{BackendError, BackendResult};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphIndex {
    positions: HashMap<String, usize>,
}

impl GlyphIndex {
    /// Index a list of names. Returns the first duplicate name on failure.
    pub fn build<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Self, String> {
        let mut index = Self::default();
        for (position, name) in names.into_iter().enumerate() {
            if index.positions.insert(name.to_string(), position).is_some() {
                return Err(name.to_string());
            }
        }
        Ok(index)
    }

    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn insert(&mut self, name: &str, position: usize) -> BackendResult<()> {
        if self.contains(name) {
            return Err(BackendError::DuplicateGlyph(name.to_string()));
        }
        self.positions.insert(name.to_string(), position);
        Ok(())
    }

    /// Drop a name and close the gap it leaves in the positions
    pub fn remove(&mut self, name: &str) -> BackendResult<usize> {
        let removed = self
            .positions
            .remove(name)
            .ok_or_else(|| BackendError::glyph_not_found(name))?;
        for position in self.positions.values_mut() {
            if *position > removed {
                *position -= 1;
            }
        }
        Ok(removed)
    }

    pub fn rename(&mut self, old: &str, new: &str) -> BackendResult<()> {
        if old == new {
            return self.lookup(old).map(|_| ()).ok_or_else(|| BackendError::glyph_not_found(old));
        }
        if self.contains(new) {
            return Err(BackendError::DuplicateGlyph(new.to_string()));
        }
        let position = self
            .positions
            .remove(old)
            .ok_or_else(|| BackendError::glyph_not_found(old))?;
        self.positions.insert(new.to_string(), position);
        Ok(())
    }
}
