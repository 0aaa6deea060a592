//! Error types for the Glyphs backend
//!
//! Everything the backend can refuse is a typed variant so the host can
//! tell a missing glyph from a rejected edit from an unreadable source.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::plist::SyntaxError;

pub type BackendResult<T> = Result<T, BackendError>;

/// A source could not be opened
#[derive(Debug, Error)]
#[error("failed to parse {}: {message}{}", path.display(), position(*line, *column))]
pub struct ParseError {
    pub path: PathBuf,
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

fn position(line: Option<usize>, column: Option<usize>) -> String {
    match (line, column) {
        (Some(line), Some(column)) => format!(" (line {line}, column {column})"),
        (Some(line), None) => format!(" (line {line})"),
        _ => String::new(),
    }
}

impl ParseError {
    pub fn new(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
            line: None,
            column: None,
        }
    }

    pub fn syntax(path: impl AsRef<Path>, error: SyntaxError) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            message: error.message,
            line: Some(error.line),
            column: Some(error.column),
        }
    }
}

/// An edit could not be persisted; the on-disk source is unchanged
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("I/O error writing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The model would violate a save invariant
    #[error("invariant violated: {0}")]
    Invariant(String),
    /// The edit is outside what this backend can write
    #[error("unsupported: {0}")]
    Unsupported(String),
    /// The edit is malformed
    #[error("invalid edit: {0}")]
    Invalid(String),
}

impl WriteError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        WriteError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("a glyph named '{0}' already exists")]
    DuplicateGlyph(String),

    #[error("unresolved location in glyph '{glyph}': {message}")]
    UnresolvedLocation { glyph: String, message: String },

    #[error(
        "smart component '{component}' in glyph '{glyph}': value {value} for axis '{axis}' \
         is outside [{min}, {max}]"
    )]
    AxisRange {
        glyph: String,
        component: String,
        axis: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error(transparent)]
    Write(#[from] WriteError),
}

impl BackendError {
    pub fn glyph_not_found(name: impl Into<String>) -> Self {
        BackendError::NotFound {
            kind: "glyph",
            name: name.into(),
        }
    }

    pub fn unresolved(glyph: impl Into<String>, message: impl Into<String>) -> Self {
        BackendError::UnresolvedLocation {
            glyph: glyph.into(),
            message: message.into(),
        }
    }

    /// Whether the host may carry on with the source after this error
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, BackendError::Parse(_))
    }
}

/// Check that a path looks like a Glyphs source before trying to open it
pub fn validate_glyphs_path(path: &Path) -> Result<(), ParseError> {
    if !path.exists() {
        return Err(ParseError::new(path, "path does not exist"));
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("glyphs") if path.is_file() => Ok(()),
        Some("glyphspackage") if path.is_dir() => Ok(()),
        _ => Err(ParseError::new(
            path,
            "expected a .glyphs file or a .glyphspackage directory",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let error = ParseError::syntax(
            "Test.glyphs",
            SyntaxError {
                message: "expected ';'".into(),
                line: 4,
                column: 2,
            },
        );
        assert_eq!(
            error.to_string(),
            "failed to parse Test.glyphs: expected ';' (line 4, column 2)"
        );
    }

    #[test]
    fn test_recoverable() {
        assert!(BackendError::glyph_not_found("A").is_recoverable());
        assert!(!BackendError::Parse(ParseError::new("x", "bad")).is_recoverable());
    }

    #[test]
    fn test_validate_rejects_other_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let ufo = dir.path().join("Test.ufo");
        std::fs::create_dir(&ufo).unwrap();
        assert!(validate_glyphs_path(&ufo).is_err());
        assert!(validate_glyphs_path(&dir.path().join("missing.glyphs")).is_err());
    }
}
