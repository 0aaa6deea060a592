//! Application runner logic
//!
//! Opens the source named on the command line and runs one subcommand
//! against it.

use crate::backend::GlyphsBackend;
use crate::core::cli::{parse_unicodes, CliArgs, Command};
use crate::core::config::ConfigFile;
use crate::io;
use crate::logging;
use crate::neutral::{OpenTypeFeatures, VariableGlyph};
use anyhow::{anyhow, Context, Result};
use std::fs;
use tracing::info;

/// Run the command given on the command line.
/// Handles special CLI flags and delegates to the backend.
pub fn run_app(cli_args: CliArgs) -> Result<()> {
    // Handle --new-config flag specially
    if cli_args.new_config {
        return ConfigFile::initialize_config_directory()
            .context("Failed to initialize config directory");
    }

    cli_args.validate().map_err(|message| anyhow!(message))?;

    let mut config = ConfigFile::load_or_default();
    if let Some(level) = &cli_args.log_level {
        config.log_level = Some(level.clone());
    }
    if cli_args.allow_skew {
        config.capabilities.component_skew = true;
    }
    let _guard = logging::init(config.log_level.as_deref(), cli_args.log_file)?;

    let (Some(source), Some(command)) = (&cli_args.source, &cli_args.command) else {
        println!("Nothing to do. Try running with --help for usage information.");
        return Ok(());
    };

    let backend = GlyphsBackend::open(source, &config)
        .with_context(|| format!("Failed to open {}", source.display()))?;
    run_command(&backend, command)?;
    backend.close();
    Ok(())
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run a single subcommand against an open backend
pub fn run_command(backend: &GlyphsBackend, command: &Command) -> Result<()> {
    match command {
        Command::Info => print_json(&backend.get_font_info())?,
        Command::Kerning => print_json(&backend.get_kerning())?,
        Command::Glyphs => {
            for (name, unicodes) in backend.glyph_map() {
                let codes: Vec<String> = unicodes.iter().map(|u| format!("U+{u:04X}")).collect();
                println!("{name}\t{}", codes.join(" "));
            }
        }
        Command::Glyph { name } => print_json(&backend.get_glyph(name)?)?,
        Command::PutGlyph {
            name,
            json,
            unicodes,
        } => {
            let text = fs::read_to_string(json)
                .with_context(|| format!("Failed to read {}", json.display()))?;
            let glyph: VariableGlyph = serde_json::from_str(&text)
                .with_context(|| format!("{} is not a variable glyph", json.display()))?;
            let unicodes = if unicodes.is_empty() {
                backend.glyph_map().get(name).cloned().unwrap_or_default()
            } else {
                parse_unicodes(unicodes).map_err(|message| anyhow!(message))?
            };
            backend
                .put_glyph(name, &glyph, &unicodes)
                .with_context(|| format!("Failed to write glyph '{name}'"))?;
            info!("Wrote glyph '{}'", name);
        }
        Command::Rename { old, new } => backend
            .rename_glyph(old, new)
            .with_context(|| format!("Failed to rename '{old}' to '{new}'"))?,
        Command::Delete { name } => backend
            .delete_glyph(name)
            .with_context(|| format!("Failed to delete '{name}'"))?,
        Command::Features => print!("{}", backend.get_features().text),
        Command::PutFeatures { file } => {
            let text = fs::read_to_string(file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            backend
                .put_features(&OpenTypeFeatures::fea(text))
                .context("Failed to write features")?;
        }
        Command::Roundtrip { write } => roundtrip(backend, *write)?,
    }
    Ok(())
}

/// Compare a full re-render of the model with the files on disk
fn roundtrip(backend: &GlyphsBackend, write: bool) -> Result<()> {
    let files = backend.with_package(io::render_all)?;
    let mut differing = 0;
    for file in &files {
        let on_disk = fs::read_to_string(&file.path).unwrap_or_default();
        if on_disk != file.contents {
            differing += 1;
            println!("differs: {}", file.path.display());
        }
    }
    println!("{} of {} files differ", differing, files.len());
    if write && differing > 0 {
        backend.save_all().context("Failed to rewrite the source")?;
        println!("Rewrote {}", backend.path().display());
    }
    Ok(())
}
