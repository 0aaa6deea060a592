//! The in-memory Glyphs source
//!
//! A [`Package`] is built once when a source is opened and is the single
//! source of truth afterwards. Besides the typed model it remembers the
//! text it was read from, so the write planner can splice edits into the
//! original bytes instead of regenerating whole files.

use super::designspace::DesignSpace;
use super::features::{FeatureKind, FeatureTextStore};
use super::format::FormatVersion;
use super::glyph::{Extra, Glyph};
use super::index::GlyphIndex;
use crate::core::errors::{
    validate_glyphs_path, BackendError, BackendResult, ParseError, WriteError,
};
use crate::plist::{self, Dict, Plist, RootSpans};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const FONTINFO_FILE: &str = "fontinfo.plist";
pub const ORDER_FILE: &str = "order.plist";
pub const GLYPHS_DIR: &str = "glyphs";
pub const GLYPH_SUFFIX: &str = ".glyph";

/// Root keys the model owns; everything else in the root is kept verbatim
const OWNED_ROOT_KEYS: &[&str] = &["glyphs", "featurePrefixes", "classes", "features"];

/// How a source is laid out on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// A single `.glyphs` file
    Monolithic,
    /// A `.glyphspackage` directory with one file per glyph
    PerGlyph,
}

/// Where a glyph was last read from
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Origin {
    New,
    /// Element of the root `glyphs` list
    Item(usize),
    /// File name inside the `glyphs` directory
    File(String),
}

#[derive(Debug, Clone)]
pub(crate) struct GlyphRecord {
    pub(crate) glyph: Glyph,
    pub(crate) origin: Origin,
}

/// The bytes on disk the model was last synchronized with
#[derive(Debug, Clone, Default)]
pub(crate) struct Baseline {
    /// The `.glyphs` file, or `fontinfo.plist` of a package
    pub(crate) text: String,
    pub(crate) spans: RootSpans,
    pub(crate) order_text: Option<String>,
}

/// Edits not yet written to disk
#[derive(Debug, Clone, Default)]
pub(crate) struct Changes {
    pub(crate) touched: HashSet<String>,
    /// Glyph files to delete from a package
    pub(crate) removed_files: Vec<String>,
    pub(crate) order_changed: bool,
}

impl Changes {
    pub(crate) fn is_empty(&self) -> bool {
        self.touched.is_empty() && self.removed_files.is_empty() && !self.order_changed
    }
}

#[derive(Debug, Clone)]
pub struct Package {
    path: PathBuf,
    layout: Layout,
    format: FormatVersion,
    root: Extra,
    design_space: DesignSpace,
    records: Vec<GlyphRecord>,
    index: GlyphIndex,
    features: FeatureTextStore,
    pub(crate) baseline: Baseline,
    pub(crate) changes: Changes,
}

fn read_text(path: &Path) -> Result<String, ParseError> {
    fs::read_to_string(path).map_err(|e| ParseError::new(path, format!("cannot read file: {e}")))
}

impl Package {
    /// Open a `.glyphs` file or a `.glyphspackage` directory
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref();
        validate_glyphs_path(path)?;
        let package = if path.is_dir() {
            Self::load_package(path)?
        } else {
            let text = read_text(path)?;
            Self::from_glyphs_text(path, text)?
        };
        info!(
            "Loaded {} (Glyphs {}, {} glyphs, {} masters)",
            path.display(),
            package.format.number(),
            package.records.len(),
            package.design_space.masters.len()
        );
        Ok(package)
    }

    /// Build a package from the text of a `.glyphs` file
    pub fn from_glyphs_text(path: impl AsRef<Path>, text: String) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let (root, spans) = plist::parse_with_spans(&text).map_err(|e| ParseError::syntax(path, e))?;
        let root = into_dict(root, path)?;
        let format = FormatVersion::detect(&root);

        let items = match root.get("glyphs") {
            Some(Plist::Array(items)) => items.as_slice(),
            Some(_) => return Err(ParseError::new(path, "'glyphs' is not a list")),
            None => &[],
        };
        let records = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                Glyph::from_plist(item, format)
                    .map(|glyph| GlyphRecord {
                        glyph,
                        origin: Origin::Item(i),
                    })
                    .map_err(|message| ParseError::new(path, message))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::assemble(
            path,
            Layout::Monolithic,
            format,
            &root,
            records,
            Baseline {
                text,
                spans,
                order_text: None,
            },
        )
    }

    fn load_package(path: &Path) -> Result<Self, ParseError> {
        let info_path = path.join(FONTINFO_FILE);
        let text = read_text(&info_path)?;
        let (root, spans) =
            plist::parse_with_spans(&text).map_err(|e| ParseError::syntax(&info_path, e))?;
        let root = into_dict(root, &info_path)?;
        let format = FormatVersion::detect(&root);

        let order_path = path.join(ORDER_FILE);
        let order_text = if order_path.exists() {
            Some(read_text(&order_path)?)
        } else {
            None
        };
        let order: HashMap<String, usize> = match &order_text {
            Some(text) => {
                let value = plist::parse(text).map_err(|e| ParseError::syntax(&order_path, e))?;
                value
                    .as_array()
                    .ok_or_else(|| ParseError::new(&order_path, "glyph order is not a list"))?
                    .iter()
                    .filter_map(Plist::to_text)
                    .enumerate()
                    .map(|(i, name)| (name, i))
                    .collect()
            }
            None => HashMap::new(),
        };

        let glyphs_dir = path.join(GLYPHS_DIR);
        let mut records = Vec::new();
        if glyphs_dir.is_dir() {
            let entries = fs::read_dir(&glyphs_dir)
                .map_err(|e| ParseError::new(&glyphs_dir, format!("cannot list glyphs: {e}")))?;
            for entry in entries {
                let entry = entry.map_err(|e| ParseError::new(&glyphs_dir, e.to_string()))?;
                let file_name = entry.file_name().to_string_lossy().into_owned();
                if !file_name.ends_with(GLYPH_SUFFIX) {
                    continue;
                }
                let glyph_path = entry.path();
                let glyph_text = read_text(&glyph_path)?;
                let value =
                    plist::parse(&glyph_text).map_err(|e| ParseError::syntax(&glyph_path, e))?;
                let glyph = Glyph::from_plist(&value, format)
                    .map_err(|message| ParseError::new(&glyph_path, message))?;
                records.push(GlyphRecord {
                    glyph,
                    origin: Origin::File(file_name),
                });
            }
        }
        // glyphs in order.plist first, the rest by name
        records.sort_by(|a, b| {
            let key = |record: &GlyphRecord| match order.get(&record.glyph.name) {
                Some(i) => (0, *i, String::new()),
                None => (1, 0, record.glyph.name.clone()),
            };
            key(a).cmp(&key(b))
        });

        Self::assemble(
            path,
            Layout::PerGlyph,
            format,
            &root,
            records,
            Baseline {
                text,
                spans,
                order_text,
            },
        )
    }

    fn assemble(
        path: &Path,
        layout: Layout,
        format: FormatVersion,
        root: &Dict,
        records: Vec<GlyphRecord>,
        baseline: Baseline,
    ) -> Result<Self, ParseError> {
        let design_space =
            DesignSpace::from_root(root, format).map_err(|message| ParseError::new(path, message))?;
        let features = FeatureTextStore::from_root(root, format)
            .map_err(|message| ParseError::new(path, message))?;
        let index = GlyphIndex::build(records.iter().map(|r| r.glyph.name.as_str()))
            .map_err(|name| ParseError::new(path, format!("duplicate glyph name '{name}'")))?;
        debug!("Indexed {} glyphs", index.len());

        Ok(Self {
            path: path.to_path_buf(),
            layout,
            format,
            root: Extra::from_dict(root, OWNED_ROOT_KEYS),
            design_space,
            records,
            index,
            features,
            baseline,
            changes: Changes::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn format(&self) -> FormatVersion {
        self.format
    }

    pub fn design_space(&self) -> &DesignSpace {
        &self.design_space
    }

    /// A root value the model does not interpret, such as `familyName`
    pub fn root_value(&self, key: &str) -> Option<&Plist> {
        self.root.get(key)
    }

    /// A root custom parameter by name
    pub fn custom_parameter(&self, name: &str) -> Option<&Plist> {
        self.root_value("customParameters")?
            .as_array()?
            .iter()
            .find(|param| param.get("name").and_then(Plist::as_str) == Some(name))
            .and_then(|param| param.get("value"))
    }

    pub fn units_per_em(&self) -> f64 {
        self.root_value("unitsPerEm").and_then(Plist::as_f64).unwrap_or(1000.0)
    }

    pub fn glyph_count(&self) -> usize {
        self.records.len()
    }

    /// Glyph names in glyph order
    pub fn glyph_names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|record| record.glyph.name.as_str())
    }

    pub fn glyphs(&self) -> impl Iterator<Item = &Glyph> {
        self.records.iter().map(|record| &record.glyph)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains(name)
    }

    pub fn lookup(&self, name: &str) -> BackendResult<&Glyph> {
        self.index
            .lookup(name)
            .map(|i| &self.records[i].glyph)
            .ok_or_else(|| BackendError::glyph_not_found(name))
    }

    /// Mutable access to a glyph; the glyph counts as edited
    pub fn glyph_mut(&mut self, name: &str) -> BackendResult<&mut Glyph> {
        let i = self
            .index
            .lookup(name)
            .ok_or_else(|| BackendError::glyph_not_found(name))?;
        self.changes.touched.insert(name.to_string());
        Ok(&mut self.records[i].glyph)
    }

    /// Add a glyph at the end of the glyph order
    pub fn insert(&mut self, glyph: Glyph) -> BackendResult<()> {
        self.index.insert(&glyph.name, self.records.len())?;
        self.changes.touched.insert(glyph.name.clone());
        self.changes.order_changed = true;
        self.records.push(GlyphRecord {
            glyph,
            origin: Origin::New,
        });
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> BackendResult<Glyph> {
        let i = self.index.remove(name)?;
        let record = self.records.remove(i);
        self.changes.touched.remove(name);
        self.changes.order_changed = true;
        if let Origin::File(file) = record.origin {
            self.changes.removed_files.push(file);
        }
        Ok(record.glyph)
    }

    /// Rename a glyph and point every component using it at the new name
    pub fn rename(&mut self, old: &str, new: &str) -> BackendResult<()> {
        self.index.rename(old, new)?;
        if old == new {
            return Ok(());
        }
        for record in &mut self.records {
            let glyph = &mut record.glyph;
            let mut retargeted = false;
            for layer in &mut glyph.layers {
                for component in layer.components_mut().filter(|c| c.base == old) {
                    component.base = new.to_string();
                    retargeted = true;
                }
            }
            if glyph.name == old {
                glyph.name = new.to_string();
                retargeted = true;
                // the file is named after the glyph
                if let Origin::File(file) = &record.origin {
                    self.changes.removed_files.push(file.clone());
                    record.origin = Origin::New;
                }
            }
            if retargeted {
                self.changes.touched.insert(glyph.name.clone());
            }
        }
        self.changes.touched.remove(old);
        self.changes.order_changed = true;
        Ok(())
    }

    /// Names of glyphs with a component based on `name`
    pub fn glyphs_using(&self, name: &str) -> Vec<String> {
        self.glyphs()
            .filter(|glyph| glyph.name != name && glyph.component_bases().any(|base| base == name))
            .map(|glyph| glyph.name.clone())
            .collect()
    }

    pub fn features(&self) -> &FeatureTextStore {
        &self.features
    }

    pub fn features_mut(&mut self) -> &mut FeatureTextStore {
        &mut self.features
    }

    pub(crate) fn records(&self) -> &[GlyphRecord] {
        &self.records
    }

    /// Whether anything differs from the bytes on disk
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty() || FeatureKind::ALL.iter().any(|k| self.features.is_dirty(*k))
    }

    /// Check the save invariants for a single glyph
    pub fn validate_glyph(&self, glyph: &Glyph) -> Result<(), WriteError> {
        let mut master_layers = HashSet::new();
        for layer in &glyph.layers {
            if self.design_space.master(layer.master_id()).is_none() {
                return Err(WriteError::Invariant(format!(
                    "layer '{}' of glyph '{}' refers to unknown master '{}'",
                    layer.layer_id,
                    glyph.name,
                    layer.master_id()
                )));
            }
            if self.design_space.master(&layer.layer_id).is_some()
                && !master_layers.insert(layer.layer_id.as_str())
            {
                return Err(WriteError::Invariant(format!(
                    "glyph '{}' has more than one layer for master '{}'",
                    glyph.name, layer.layer_id
                )));
            }
            if let Some(brace) = &layer.brace {
                if brace.len() > self.design_space.axes.len() {
                    return Err(WriteError::Invariant(format!(
                        "brace layer '{}' of glyph '{}' has more coordinates than the font has axes",
                        layer.layer_id, glyph.name
                    )));
                }
                let coordinates = self.design_space.coordinates(&self.design_space.location(brace));
                if let Some((axis, value, range)) = self.design_space.out_of_range(&coordinates) {
                    return Err(WriteError::Invariant(format!(
                        "brace layer '{}' of glyph '{}' sits at {}={value}, outside the axis range {}..{}",
                        layer.layer_id, glyph.name, axis.name, range.min, range.max
                    )));
                }
            }
        }
        for base in glyph.component_bases() {
            if !self.index.contains(base) {
                return Err(WriteError::Invariant(format!(
                    "glyph '{}' uses missing component base '{base}'",
                    glyph.name
                )));
            }
        }
        Ok(())
    }

    /// Check the save invariants for every glyph
    pub fn validate(&self) -> Result<(), WriteError> {
        self.glyphs().try_for_each(|glyph| self.validate_glyph(glyph))
    }

    /// The complete root dictionary, glyphs included for single-file sources
    pub fn root_dict(&self) -> Dict {
        let mut known = Dict::new();
        if self.layout == Layout::Monolithic {
            let glyphs: Vec<Plist> = self.glyphs().map(|g| g.to_plist(self.format)).collect();
            known.insert("glyphs".into(), glyphs.into());
        }
        for kind in FeatureKind::ALL {
            let items = self.features.to_plist_items(kind, self.format);
            if !items.is_empty() || self.baseline.spans.entries.contains_key(kind.root_key()) {
                known.insert(kind.root_key().into(), items.into());
            }
        }
        self.root.compose(known)
    }

    /// Adopt freshly written bytes as the new baseline
    pub(crate) fn rebase(&mut self, baseline: Baseline, files: HashMap<String, String>) {
        for (i, record) in self.records.iter_mut().enumerate() {
            record.origin = match self.layout {
                Layout::Monolithic => Origin::Item(i),
                Layout::PerGlyph => match files.get(&record.glyph.name) {
                    Some(file) => Origin::File(file.clone()),
                    None => record.origin.clone(),
                },
            };
        }
        self.baseline = baseline;
        self.changes = Changes::default();
        self.features.rebase();
    }
}

fn into_dict(value: Plist, path: &Path) -> Result<Dict, ParseError> {
    match value {
        Plist::Dict(dict) => Ok(dict),
        _ => Err(ParseError::new(path, "the document root is not a dictionary")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{write_fixture, GLYPHS3_SOURCE};

    #[test]
    fn test_load_and_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), "Test.glyphs", GLYPHS3_SOURCE);
        let package = Package::load(&path).unwrap();
        assert_eq!(package.layout(), Layout::Monolithic);
        assert_eq!(package.format(), FormatVersion::V3);
        assert_eq!(package.units_per_em(), 1000.0);
        assert_eq!(package.glyph_names().collect::<Vec<_>>(), vec!["A", "o.smart", "e"]);
        assert_eq!(package.lookup("A").unwrap().unicodes, vec![65]);
        assert!(matches!(package.lookup("Z"), Err(BackendError::NotFound { .. })));
        assert!(package.validate().is_ok());
        assert!(!package.has_changes());
    }

    #[test]
    fn test_structural_edits_keep_the_index_in_sync() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), "Test.glyphs", GLYPHS3_SOURCE);
        let mut package = Package::load(&path).unwrap();

        assert!(matches!(
            package.insert(Glyph::new("A")),
            Err(BackendError::DuplicateGlyph(_))
        ));
        package.insert(Glyph::new("B")).unwrap();
        assert_eq!(package.lookup("B").unwrap().name, "B");

        package.rename("o.smart", "o.part").unwrap();
        assert!(package.lookup("o.smart").is_err());
        assert_eq!(package.glyphs_using("o.part"), vec!["e".to_string()]);
        assert!(package.changes.touched.contains("e"));

        package.remove("A").unwrap();
        assert!(package.lookup("A").is_err());
        assert_eq!(package.lookup("e").unwrap().name, "e");
        assert_eq!(package.glyph_names().count(), 3);
    }

    #[test]
    fn test_validate_flags_missing_component_base() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), "Test.glyphs", GLYPHS3_SOURCE);
        let mut package = Package::load(&path).unwrap();
        package.remove("o.smart").unwrap();
        assert!(matches!(package.validate(), Err(WriteError::Invariant(_))));
    }

    #[test]
    fn test_validate_flags_brace_outside_the_axis_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), "Test.glyphs", GLYPHS3_SOURCE);
        let mut package = Package::load(&path).unwrap();
        let glyph = package.glyph_mut("A").unwrap();
        let brace = glyph.layers.iter_mut().find(|l| l.brace.is_some()).unwrap();
        brace.brace = Some(vec![900.0]);
        assert!(package.validate().is_ok());

        let glyph = package.glyph_mut("A").unwrap();
        let brace = glyph.layers.iter_mut().find(|l| l.brace.is_some()).unwrap();
        brace.brace = Some(vec![5000.0]);
        let error = package.validate().unwrap_err();
        assert!(matches!(&error, WriteError::Invariant(message) if message.contains("Weight=5000")));
    }

    #[test]
    fn test_malformed_source_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), "Broken.glyphs", "{\n.formatVersion = 3;\nglyphs = (\n");
        let error = Package::load(&path).unwrap_err();
        assert!(error.line.is_some());

        let path = write_fixture(dir.path(), "NoMasters.glyphs", "{\n.formatVersion = 3;\n}\n");
        assert!(Package::load(&path).is_err());
    }
}
