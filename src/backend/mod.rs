//! The storage backend session
//!
//! A [`GlyphsBackend`] owns one opened source for its whole lifetime:
//! `open`, serve requests, `close`. Reads share the lock. Every mutation
//! takes the lock exclusively, works on a copy of the package and only
//! replaces the session state once the files are on disk, so a failed
//! edit leaves both the disk and the session as they were.

use crate::core::config::ConfigFile;
use crate::core::errors::{BackendError, BackendResult, WriteError};
use crate::font_source::{smart, FeatureBlock, FeatureKind, FormatVersion, Package, ResolvedComponent};
use crate::io;
use crate::mapping::{
    glyph_to_neutral, neutral_to_glyph, read_font_info, read_kerning, Capability, WriteCapabilities,
    WriteContext,
};
use crate::neutral::{FontAxis, FontInfo, FontSource, Kerning, OpenTypeFeatures, VariableGlyph};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct GlyphsBackend {
    path: PathBuf,
    package: RwLock<Package>,
    capabilities: WriteCapabilities,
}

impl GlyphsBackend {
    /// Open a `.glyphs` file or `.glyphspackage` directory
    pub fn open(path: impl AsRef<Path>, config: &ConfigFile) -> BackendResult<Self> {
        let path = path.as_ref();
        let package = Package::load(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            package: RwLock::new(package),
            capabilities: config.capabilities.clone(),
        })
    }

    /// End the session. Every edit is already on disk.
    pub fn close(self) {
        info!("Closed {}", self.path.display());
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format_version(&self) -> FormatVersion {
        self.package.read().format()
    }

    pub fn capabilities(&self) -> &WriteCapabilities {
        &self.capabilities
    }

    /// Run a read-only closure against the package
    pub fn with_package<T>(&self, read: impl FnOnce(&Package) -> T) -> T {
        read(&self.package.read())
    }

    /// Glyph names in glyph order, with their code points
    pub fn glyph_map(&self) -> IndexMap<String, Vec<u32>> {
        self.package
            .read()
            .glyphs()
            .map(|glyph| (glyph.name.clone(), glyph.unicodes.clone()))
            .collect()
    }

    pub fn glyph_names(&self) -> Vec<String> {
        self.package.read().glyph_names().map(str::to_string).collect()
    }

    pub fn get_axes(&self) -> Vec<FontAxis> {
        self.package.read().design_space().font_axes()
    }

    pub fn get_sources(&self) -> Vec<FontSource> {
        self.package.read().design_space().font_sources()
    }

    pub fn units_per_em(&self) -> f64 {
        self.package.read().units_per_em()
    }

    pub fn get_font_info(&self) -> FontInfo {
        read_font_info(&self.package.read())
    }

    /// Font-level data is read-only; writing back what was read is accepted
    pub fn put_font_info(&self, font_info: &FontInfo) -> BackendResult<()> {
        if *font_info == self.get_font_info() {
            return Ok(());
        }
        Err(WriteError::Unsupported("writing font info is not supported".into()).into())
    }

    pub fn put_axes(&self, axes: &[FontAxis]) -> BackendResult<()> {
        if axes == self.get_axes().as_slice() {
            return Ok(());
        }
        Err(WriteError::Unsupported("writing font axes is not supported".into()).into())
    }

    pub fn put_sources(&self, sources: &[FontSource]) -> BackendResult<()> {
        if sources == self.get_sources().as_slice() {
            return Ok(());
        }
        Err(WriteError::Unsupported("writing font sources is not supported".into()).into())
    }

    /// Kerning tables keyed by feature tag (`kern`, `vkrn`)
    pub fn get_kerning(&self) -> IndexMap<String, Kerning> {
        read_kerning(&self.package.read())
    }

    pub fn put_kerning(&self, kerning: &IndexMap<String, Kerning>) -> BackendResult<()> {
        if *kerning == self.get_kerning() {
            return Ok(());
        }
        Err(WriteError::Unsupported("writing kerning is not supported".into()).into())
    }

    pub fn get_glyph(&self, name: &str) -> BackendResult<VariableGlyph> {
        let package = self.package.read();
        let glyph = package.lookup(name)?;
        glyph_to_neutral(&package, glyph)
    }

    /// Write a glyph, creating it when the name is new
    pub fn put_glyph(
        &self,
        name: &str,
        glyph: &VariableGlyph,
        code_points: &[u32],
    ) -> BackendResult<()> {
        let capabilities = &self.capabilities;
        self.mutate(|package| {
            let existing = package.lookup(name).ok().cloned();
            let old_neutral = match &existing {
                Some(existing) => Some(glyph_to_neutral(package, existing)?),
                None => {
                    capabilities.require(Capability::CreateGlyph)?;
                    None
                }
            };
            capabilities.check_glyph_edit(old_neutral.as_ref(), glyph)?;

            let ctx = WriteContext {
                package: &*package,
                capabilities,
            };
            let mut updated = neutral_to_glyph(&ctx, name, existing.as_ref(), glyph)?;
            updated.unicodes = code_points.to_vec();
            if existing.as_ref() == Some(&updated) {
                debug!("Glyph '{}' is unchanged", name);
                return Ok(());
            }
            package.validate_glyph(&updated)?;

            match existing {
                Some(_) => *package.glyph_mut(name)? = updated,
                None => package.insert(updated)?,
            }
            Ok(())
        })
    }

    /// Delete a glyph no other glyph uses as a component
    pub fn delete_glyph(&self, name: &str) -> BackendResult<()> {
        self.capabilities.require(Capability::DeleteGlyph)?;
        self.mutate(|package| {
            package.lookup(name)?;
            let users = package.glyphs_using(name);
            if !users.is_empty() {
                return Err(WriteError::Invariant(format!(
                    "glyph '{name}' is used as a component by {}",
                    users.join(", ")
                ))
                .into());
            }
            package.remove(name)?;
            Ok(())
        })
    }

    /// Rename a glyph and retarget the components that use it
    pub fn rename_glyph(&self, old: &str, new: &str) -> BackendResult<()> {
        self.capabilities.require(Capability::RenameGlyph)?;
        self.mutate(|package| package.rename(old, new))
    }

    /// Names of glyphs with a component based on `name`
    pub fn glyphs_using(&self, name: &str) -> Vec<String> {
        self.package.read().glyphs_using(name)
    }

    pub fn get_features(&self) -> OpenTypeFeatures {
        OpenTypeFeatures::fea(self.package.read().features().compose_text())
    }

    pub fn put_features(&self, features: &OpenTypeFeatures) -> BackendResult<()> {
        self.capabilities.require(Capability::Features)?;
        if features.language != "fea" {
            return Err(WriteError::Unsupported(format!(
                "feature language '{}'",
                features.language
            ))
            .into());
        }
        self.mutate(|package| {
            if !package.features_mut().apply_text(&features.text)? {
                debug!("Feature text is unchanged");
            }
            Ok(())
        })
    }

    /// Prefixes, then classes, then features
    pub fn feature_blocks(&self) -> Vec<FeatureBlock> {
        self.package.read().features().list().cloned().collect()
    }

    pub fn set_feature_block(&self, kind: FeatureKind, name: &str, text: &str) -> BackendResult<()> {
        self.capabilities.require(Capability::Features)?;
        self.mutate(|package| package.features_mut().set(kind, name, text))
    }

    pub fn append_feature_block(
        &self,
        kind: FeatureKind,
        name: &str,
        text: &str,
    ) -> BackendResult<()> {
        self.capabilities.require(Capability::Features)?;
        self.mutate(|package| package.features_mut().append(kind, name, text))
    }

    pub fn remove_feature_block(&self, kind: FeatureKind, name: &str) -> BackendResult<()> {
        self.capabilities.require(Capability::Features)?;
        self.mutate(|package| package.features_mut().remove(kind, name).map(drop))
    }

    /// Resolve the `index`-th component of a layer against its base glyph
    pub fn resolve_component(
        &self,
        glyph: &str,
        layer_id: &str,
        index: usize,
    ) -> BackendResult<ResolvedComponent> {
        smart::resolve_at(&self.package.read(), glyph, layer_id, index)
    }

    /// Rewrite the whole source from the model
    pub fn save_all(&self) -> BackendResult<()> {
        let mut package = self.package.write();
        let mut draft = package.clone();
        io::save_all(&mut draft)?;
        *package = draft;
        Ok(())
    }

    /// Apply an edit to a copy of the package, persist it, then adopt it
    fn mutate<T>(&self, edit: impl FnOnce(&mut Package) -> BackendResult<T>) -> BackendResult<T> {
        let mut package = self.package.write();
        let mut draft = package.clone();
        let value = edit(&mut draft)?;
        io::save(&mut draft).map_err(BackendError::from)?;
        *package = draft;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{write_fixture, GLYPHS2_SOURCE, GLYPHS3_SOURCE};
    use std::fs;

    fn open(dir: &Path, config: &ConfigFile) -> (GlyphsBackend, PathBuf) {
        let path = write_fixture(dir, "Test.glyphs", GLYPHS3_SOURCE);
        (GlyphsBackend::open(&path, config).unwrap(), path)
    }

    #[test]
    fn test_font_level_reads() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, _) = open(dir.path(), &ConfigFile::default());
        assert_eq!(backend.format_version(), FormatVersion::V3);
        assert_eq!(backend.glyph_map()["A"], vec![65]);
        let info = backend.get_font_info();
        assert_eq!(info.family_name.as_deref(), Some("Bezy Test"));
        assert_eq!(info.axes.len(), 1);
        assert_eq!((info.axes[0].min_value, info.axes[0].max_value), (100.0, 900.0));
        assert_eq!(info.sources.len(), 2);
        assert!(backend.put_font_info(&info).is_ok());

        let mut changed = info.clone();
        changed.units_per_em = 2048.0;
        assert!(matches!(
            backend.put_font_info(&changed),
            Err(BackendError::Write(WriteError::Unsupported(_)))
        ));
    }

    #[test]
    fn test_kerning_is_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), "Two.glyphs", GLYPHS2_SOURCE);
        let backend = GlyphsBackend::open(&path, &ConfigFile::default()).unwrap();
        let kerning = backend.get_kerning();
        assert_eq!(kerning.keys().collect::<Vec<_>>(), vec!["kern"]);
        let kern = &kerning["kern"];
        assert_eq!(kern.source_identifiers, vec!["M1", "M2"]);
        assert_eq!(kern.groups["public.kern1.a"], vec!["a"]);
        assert_eq!(kern.values["public.kern1.a"]["b"], vec![None, Some(-30.0)]);
        assert!(backend.put_kerning(&kerning).is_ok());

        let mut changed = kerning.clone();
        changed["kern"].values["public.kern1.a"]["b"][1] = Some(-40.0);
        assert!(matches!(
            backend.put_kerning(&changed),
            Err(BackendError::Write(WriteError::Unsupported(_)))
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), GLYPHS2_SOURCE);

        let (backend, _) = open(dir.path(), &ConfigFile::default());
        assert!(backend.get_kerning().is_empty());
    }

    #[test]
    fn test_delete_is_refused_while_used() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, path) = open(dir.path(), &ConfigFile::default());
        assert_eq!(backend.glyphs_using("o.smart"), vec!["e".to_string()]);
        assert!(matches!(
            backend.delete_glyph("o.smart"),
            Err(BackendError::Write(WriteError::Invariant(_)))
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), GLYPHS3_SOURCE);

        backend.delete_glyph("e").unwrap();
        backend.delete_glyph("o.smart").unwrap();
        assert_eq!(backend.glyph_names(), vec!["A".to_string()]);
        assert!(matches!(
            backend.delete_glyph("e"),
            Err(BackendError::NotFound { .. })
        ));
    }

    #[test]
    fn test_disabled_capabilities() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ConfigFile::default();
        config.capabilities.rename_glyph = false;
        config.capabilities.features = false;
        let (backend, path) = open(dir.path(), &config);

        assert!(matches!(
            backend.rename_glyph("A", "B"),
            Err(BackendError::Write(WriteError::Unsupported(_)))
        ));
        let features = backend.get_features();
        assert!(backend.put_features(&features).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), GLYPHS3_SOURCE);
        assert_eq!(backend.glyph_names().len(), 3);
    }

    #[test]
    fn test_unchanged_glyph_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, path) = open(dir.path(), &ConfigFile::default());
        for name in ["A", "o.smart", "e"] {
            let glyph = backend.get_glyph(name).unwrap();
            let unicodes = backend.glyph_map()[name].clone();
            backend.put_glyph(name, &glyph, &unicodes).unwrap();
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), GLYPHS3_SOURCE);
    }

    #[test]
    fn test_resolve_component() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, _) = open(dir.path(), &ConfigFile::default());
        let resolved = backend.resolve_component("e", "m01", 0).unwrap();
        assert_eq!(resolved.base, "o.smart");
        assert_eq!(resolved.location["weight"], 50.0);
        assert!(matches!(
            backend.resolve_component("e", "m01", 1),
            Err(BackendError::NotFound { .. })
        ));
    }
}
