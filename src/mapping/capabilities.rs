//! Which edits this backend is allowed to write
//!
//! The table is part of the user configuration. A glyph edit touching an
//! area whose flag is off is refused as a whole before anything is
//! written.

use crate::core::errors::WriteError;
use crate::neutral::{Component, Layer, VariableGlyph};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Paths,
    Components,
    SmartComponents,
    Anchors,
    Guidelines,
    Features,
    GlyphAxes,
    BraceLayers,
    CreateGlyph,
    DeleteGlyph,
    RenameGlyph,
    ComponentSkew,
}

impl Capability {
    pub fn name(self) -> &'static str {
        match self {
            Capability::Paths => "paths",
            Capability::Components => "components",
            Capability::SmartComponents => "smart_components",
            Capability::Anchors => "anchors",
            Capability::Guidelines => "guidelines",
            Capability::Features => "features",
            Capability::GlyphAxes => "glyph_axes",
            Capability::BraceLayers => "brace_layers",
            Capability::CreateGlyph => "create_glyph",
            Capability::DeleteGlyph => "delete_glyph",
            Capability::RenameGlyph => "rename_glyph",
            Capability::ComponentSkew => "component_skew",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteCapabilities {
    pub paths: bool,
    pub components: bool,
    pub smart_components: bool,
    pub anchors: bool,
    pub guidelines: bool,
    pub features: bool,
    pub glyph_axes: bool,
    pub brace_layers: bool,
    pub create_glyph: bool,
    pub delete_glyph: bool,
    pub rename_glyph: bool,
    /// Skewed components, off unless enabled
    pub component_skew: bool,
}

impl Default for WriteCapabilities {
    fn default() -> Self {
        Self {
            paths: true,
            components: true,
            smart_components: true,
            anchors: true,
            guidelines: true,
            features: true,
            glyph_axes: true,
            brace_layers: true,
            create_glyph: true,
            delete_glyph: true,
            rename_glyph: true,
            component_skew: false,
        }
    }
}

impl WriteCapabilities {
    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::Paths => self.paths,
            Capability::Components => self.components,
            Capability::SmartComponents => self.smart_components,
            Capability::Anchors => self.anchors,
            Capability::Guidelines => self.guidelines,
            Capability::Features => self.features,
            Capability::GlyphAxes => self.glyph_axes,
            Capability::BraceLayers => self.brace_layers,
            Capability::CreateGlyph => self.create_glyph,
            Capability::DeleteGlyph => self.delete_glyph,
            Capability::RenameGlyph => self.rename_glyph,
            Capability::ComponentSkew => self.component_skew,
        }
    }

    pub fn require(&self, capability: Capability) -> Result<(), WriteError> {
        if self.allows(capability) {
            Ok(())
        } else {
            Err(WriteError::Unsupported(format!(
                "writing {capability} is disabled"
            )))
        }
    }

    /// Refuse an edit that changes an area this table does not allow
    pub fn check_glyph_edit(
        &self,
        old: Option<&VariableGlyph>,
        new: &VariableGlyph,
    ) -> Result<(), WriteError> {
        let empty = VariableGlyph::default();
        let old = old.unwrap_or(&empty);
        if old.axes != new.axes {
            self.require(Capability::GlyphAxes)?;
        }

        let blank = Layer::default();
        let names = old.layers.keys().chain(new.layers.keys());
        for name in names {
            let before = &old.layers.get(name).unwrap_or(&blank).glyph;
            let after = &new.layers.get(name).unwrap_or(&blank).glyph;
            if before.path != after.path {
                self.require(Capability::Paths)?;
            }
            if !same_components(&before.components, &after.components, |c| {
                (&c.name, &c.transformation, &c.custom_data)
            }) {
                self.require(Capability::Components)?;
            }
            if !same_components(&before.components, &after.components, |c| &c.location) {
                self.require(Capability::SmartComponents)?;
            }
            if before.anchors != after.anchors {
                self.require(Capability::Anchors)?;
            }
            if before.guidelines != after.guidelines {
                self.require(Capability::Guidelines)?;
            }
        }
        Ok(())
    }
}

fn same_components<'a, T: PartialEq>(
    before: &'a [Component],
    after: &'a [Component],
    key: impl Fn(&'a Component) -> T,
) -> bool {
    before.len() == after.len() && before.iter().zip(after).all(|(a, b)| key(a) == key(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neutral::{Anchor, Contour, PathPoint};

    fn glyph_with_anchor(x: f64) -> VariableGlyph {
        let mut glyph = VariableGlyph::new("A");
        let mut layer = Layer::default();
        layer.glyph.anchors.push(Anchor::new("top", x, 700.0));
        glyph.layers.insert("m01".into(), layer);
        glyph
    }

    #[test]
    fn test_defaults() {
        let capabilities = WriteCapabilities::default();
        assert!(capabilities.allows(Capability::Paths));
        assert!(!capabilities.allows(Capability::ComponentSkew));
        let parsed: WriteCapabilities = serde_json::from_str(r#"{"anchors": false}"#).unwrap();
        assert!(!parsed.anchors);
        assert!(parsed.paths);
    }

    #[test]
    fn test_disabled_area_is_refused() {
        let capabilities = WriteCapabilities {
            anchors: false,
            ..WriteCapabilities::default()
        };
        let old = glyph_with_anchor(300.0);
        assert!(capabilities.check_glyph_edit(Some(&old), &old).is_ok());

        let moved = glyph_with_anchor(310.0);
        let error = capabilities.check_glyph_edit(Some(&old), &moved).unwrap_err();
        assert!(matches!(error, WriteError::Unsupported(ref message) if message.contains("anchors")));

        let mut drawn = old.clone();
        if let Some(layer) = drawn.layers.get_mut("m01") {
            layer.glyph.path.push(Contour {
                closed: true,
                points: vec![PathPoint::on(0.0, 0.0), PathPoint::on(10.0, 0.0)],
            });
        }
        assert!(capabilities.check_glyph_edit(Some(&old), &drawn).is_ok());
    }
}
