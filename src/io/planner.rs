//! Turning model changes into file writes
//!
//! A save only rewrites what changed. In a `.glyphs` file the edited root
//! values are spliced into the original text and untouched list elements
//! are copied byte for byte; in a `.glyphspackage` only the files of
//! edited glyphs are rewritten. Every file is staged next to its target
//! before the first one is moved into place.

use super::glyph_files::file_name_for;
use crate::core::errors::WriteError;
use crate::font_source::package::{
    Baseline, Origin, FONTINFO_FILE, GLYPHS_DIR, ORDER_FILE,
};
use crate::font_source::{FeatureKind, Glyph, Layout, Package};
use crate::plist::{self, Plist, RootSpans, ValueSpan};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{ErrorKind, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// One file and the bytes it should hold after the save
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedFile {
    pub path: PathBuf,
    pub contents: String,
}

#[derive(Debug)]
pub struct WritePlan {
    pub files: Vec<PlannedFile>,
    pub deletes: Vec<PathBuf>,
    baseline: Baseline,
    /// Glyph name to file name, packages only
    glyph_files: HashMap<String, String>,
}

struct Edit {
    range: Range<usize>,
    text: String,
}

/// Write pending changes. Returns whether anything was written.
pub fn save(package: &mut Package) -> Result<bool, WriteError> {
    if !package.has_changes() {
        debug!("Nothing to save for {}", package.path().display());
        return Ok(false);
    }
    for name in &package.changes.touched {
        let glyph = package
            .lookup(name)
            .map_err(|_| WriteError::Invariant(format!("edited glyph '{name}' is gone")))?;
        package.validate_glyph(glyph)?;
    }
    let plan = plan(package, false)?;
    apply(package, plan)?;
    Ok(true)
}

/// Rewrite the whole source from the model
pub fn save_all(package: &mut Package) -> Result<(), WriteError> {
    package.validate()?;
    let plan = plan(package, true)?;
    apply(package, plan)
}

/// Every file a full rewrite would produce, without touching the disk
pub fn render_all(package: &Package) -> Result<Vec<PlannedFile>, WriteError> {
    Ok(plan(package, true)?.files)
}

fn apply(package: &mut Package, plan: WritePlan) -> Result<(), WriteError> {
    commit(&plan)?;
    info!(
        "Saved {} ({} files written, {} removed)",
        package.path().display(),
        plan.files.len(),
        plan.deletes.len()
    );
    package.rebase(plan.baseline, plan.glyph_files);
    Ok(())
}

pub fn plan(package: &Package, full: bool) -> Result<WritePlan, WriteError> {
    match package.layout() {
        Layout::Monolithic => plan_monolithic(package, full),
        Layout::PerGlyph => plan_package(package, full),
    }
}

fn plan_monolithic(package: &Package, full: bool) -> Result<WritePlan, WriteError> {
    let baseline = &package.baseline;
    let text = if full {
        document(package)
    } else {
        let mut edits = Vec::new();
        if !package.changes.is_empty() {
            let span = baseline.spans.entries.get("glyphs");
            let items = package
                .records()
                .iter()
                .map(|record| {
                    let kept = match (&record.origin, span) {
                        (Origin::Item(i), Some(span))
                            if !package.changes.touched.contains(&record.glyph.name) =>
                        {
                            span.items.get(*i).map(|range| baseline.text[range.clone()].to_string())
                        }
                        _ => None,
                    };
                    kept.unwrap_or_else(|| render_glyph(package, &record.glyph))
                })
                .collect();
            edits.extend(list_edit(baseline, "glyphs", items));
        }
        edits.extend(feature_edits(package));
        splice(&baseline.text, edits)
    };
    let spans = respan(&text, package.path())?;

    Ok(WritePlan {
        files: vec![PlannedFile {
            path: package.path().to_path_buf(),
            contents: text.clone(),
        }],
        deletes: Vec::new(),
        baseline: Baseline {
            text,
            spans,
            order_text: None,
        },
        glyph_files: HashMap::new(),
    })
}

fn plan_package(package: &Package, full: bool) -> Result<WritePlan, WriteError> {
    let root = package.path();
    let baseline = &package.baseline;
    let changes = &package.changes;
    let mut files = Vec::new();

    let features_dirty = FeatureKind::ALL.iter().any(|kind| package.features().is_dirty(*kind));
    let (text, spans) = if full || features_dirty {
        let info_path = root.join(FONTINFO_FILE);
        let text = if full {
            document(package)
        } else {
            splice(&baseline.text, feature_edits(package))
        };
        let spans = respan(&text, &info_path)?;
        files.push(PlannedFile {
            path: info_path,
            contents: text.clone(),
        });
        (text, spans)
    } else {
        (baseline.text.clone(), baseline.spans.clone())
    };

    let mut taken: HashSet<String> = package
        .records()
        .iter()
        .filter_map(|record| match &record.origin {
            Origin::File(file) => Some(file.to_lowercase()),
            _ => None,
        })
        .collect();
    let mut glyph_files = HashMap::new();
    for record in package.records() {
        let name = &record.glyph.name;
        let (file, write) = match &record.origin {
            Origin::File(file) => (file.clone(), full || changes.touched.contains(name)),
            _ => (file_name_for(name, &mut taken), true),
        };
        if write {
            let mut contents = render_glyph(package, &record.glyph);
            contents.push('\n');
            files.push(PlannedFile {
                path: root.join(GLYPHS_DIR).join(&file),
                contents,
            });
        }
        glyph_files.insert(name.clone(), file);
    }

    let in_use: HashSet<String> = glyph_files.values().map(|file| file.to_lowercase()).collect();
    let deletes = changes
        .removed_files
        .iter()
        .filter(|file| !in_use.contains(&file.to_lowercase()))
        .map(|file| root.join(GLYPHS_DIR).join(file))
        .collect();

    let order_text = if full || changes.order_changed || baseline.order_text.is_none() {
        let names: Vec<Plist> = package.glyph_names().map(Plist::from).collect();
        let mut contents = plist::to_glyphs_string(&Plist::Array(names));
        contents.push('\n');
        files.push(PlannedFile {
            path: root.join(ORDER_FILE),
            contents: contents.clone(),
        });
        Some(contents)
    } else {
        baseline.order_text.clone()
    };

    Ok(WritePlan {
        files,
        deletes,
        baseline: Baseline {
            text,
            spans,
            order_text,
        },
        glyph_files,
    })
}

fn render_glyph(package: &Package, glyph: &Glyph) -> String {
    plist::to_glyphs_string(&glyph.to_plist(package.format()))
}

/// The root dictionary rendered from scratch
fn document(package: &Package) -> String {
    let mut text = plist::to_glyphs_string(&Plist::Dict(package.root_dict()));
    text.push('\n');
    text
}

fn feature_edits(package: &Package) -> Vec<Edit> {
    let baseline = &package.baseline;
    let features = package.features();
    FeatureKind::ALL
        .into_iter()
        .filter(|kind| features.is_dirty(*kind))
        .filter_map(|kind| {
            let span = baseline.spans.entries.get(kind.root_key());
            let items = features
                .blocks(kind)
                .iter()
                .map(|block| {
                    let kept = match (block.origin, span) {
                        (Some(i), Some(span)) if !block.edited => {
                            span.items.get(i).map(|range| baseline.text[range.clone()].to_string())
                        }
                        _ => None,
                    };
                    kept.unwrap_or_else(|| {
                        plist::to_glyphs_string(&block.to_plist(package.format()))
                    })
                })
                .collect();
            list_edit(baseline, kind.root_key(), items)
        })
        .collect()
}

/// Replace the list stored under `key`, or add the key if it is missing
fn list_edit(baseline: &Baseline, key: &str, items: Vec<String>) -> Option<Edit> {
    let text = &baseline.text;
    match baseline.spans.entries.get(key) {
        Some(span) => Some(Edit {
            range: span.value.clone(),
            text: render_list(text, Some(span), &items),
        }),
        None if items.is_empty() => None,
        None => {
            // root keys are sorted
            let at = baseline
                .spans
                .entries
                .iter()
                .find(|(existing, _)| existing.as_str() > key)
                .map_or(baseline.spans.close, |(_, span)| line_start(text, span.value.start));
            Some(Edit {
                range: at..at,
                text: format!("{key} = {};\n", render_list(text, None, &items)),
            })
        }
    }
}

fn line_start(text: &str, offset: usize) -> usize {
    text[..offset].rfind('\n').map_or(0, |i| i + 1)
}

/// Join list elements with the separators the original list used
fn render_list(text: &str, span: Option<&ValueSpan>, items: &[String]) -> String {
    if items.is_empty() {
        return "(\n)".to_string();
    }
    let (mut open, mut separator, mut close) = ("\n", ",\n", "\n");
    if let Some(span) = span {
        if let (Some(first), Some(last)) = (span.items.first(), span.items.last()) {
            open = &text[span.value.start + 1..first.start];
            close = &text[last.end..span.value.end - 1];
        }
        if let [first, second, ..] = span.items.as_slice() {
            separator = &text[first.end..second.start];
        }
    }
    format!("({open}{}{close})", items.join(separator))
}

fn splice(text: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|edit| edit.range.start);
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for edit in edits {
        out.push_str(&text[cursor..edit.range.start]);
        out.push_str(&edit.text);
        cursor = edit.range.end;
    }
    out.push_str(&text[cursor..]);
    out
}

fn respan(text: &str, path: &Path) -> Result<RootSpans, WriteError> {
    plist::parse_with_spans(text)
        .map(|(_, spans)| spans)
        .map_err(|e| WriteError::Invariant(format!("rendered {} does not parse: {e}", path.display())))
}

/// Stage every file, then move them into place and remove stale glyph files
pub fn commit(plan: &WritePlan) -> Result<(), WriteError> {
    let mut staged = Vec::with_capacity(plan.files.len());
    for file in &plan.files {
        let dir = file
            .path
            .parent()
            .ok_or_else(|| WriteError::Invalid(format!("{} has no parent", file.path.display())))?;
        fs::create_dir_all(dir).map_err(|e| WriteError::io(dir, e))?;
        let mut temp = NamedTempFile::new_in(dir).map_err(|e| WriteError::io(dir, e))?;
        temp.write_all(file.contents.as_bytes())
            .map_err(|e| WriteError::io(&file.path, e))?;
        if let Ok(metadata) = fs::metadata(&file.path) {
            temp.as_file()
                .set_permissions(metadata.permissions())
                .map_err(|e| WriteError::io(&file.path, e))?;
        }
        staged.push((temp, &file.path));
    }
    for (temp, path) in staged {
        temp.persist(path).map_err(|e| WriteError::io(path, e.error))?;
        debug!("Wrote {}", path.display());
    }
    for path in &plan.deletes {
        match fs::remove_file(path) {
            Ok(()) => debug!("Removed {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(WriteError::io(path, e)),
        }
    }
    Ok(())
}
