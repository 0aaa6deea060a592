//! Command line interface for the Glyphs backend
//!
//! Handles parsing command line arguments and provides
//! validation for user inputs. Many CLI options are documented with
//! examples to help users understand the expected format.

use crate::core::errors::validate_glyphs_path;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// bezy-glyphs CLI arguments
///
/// Examples:
///   bezy-glyphs --source MyFont.glyphs info             # Axes, masters, metrics
///   bezy-glyphs -s MyFont.glyphspackage glyphs          # Glyph names and code points
///   bezy-glyphs -s MyFont.glyphs glyph A                # One glyph as JSON
///   bezy-glyphs -s MyFont.glyphs put-glyph A a.json -u 41
///   bezy-glyphs -s MyFont.glyphs roundtrip              # Check for a lossless round trip
///   bezy-glyphs --new-config                            # Create ~/.config/bezy-glyphs
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "bezy-glyphs",
    version,
    about = "Read and write Glyphs sources through Bezy's variable glyph model",
    long_about = "bezy-glyphs opens .glyphs files and .glyphspackage directories, exposes their glyphs as neutral variable glyphs and writes edits back with minimal diffs."
)]
pub struct CliArgs {
    /// Path to the Glyphs source
    ///
    /// Either a .glyphs file (Glyphs 2 or 3) or a .glyphspackage directory.
    #[clap(
        long = "source",
        short = 's',
        help = "Glyphs source (.glyphs or .glyphspackage)",
        long_help = "Path to a Glyphs source. Accepts single-file .glyphs sources in format version 2 or 3 and .glyphspackage directories."
    )]
    pub source: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Option<Command>,

    /// Log filter, overriding settings.json
    #[clap(
        long = "log-level",
        help = "Log filter (e.g. info, bezy_glyphs=debug)",
        long_help = "Log filter in tracing-subscriber EnvFilter syntax. Overrides the log_level in settings.json; RUST_LOG overrides both."
    )]
    pub log_level: Option<String>,

    /// Write logs to ~/.config/bezy-glyphs/logs/ instead of stderr
    #[clap(
        long = "log-file",
        help = "Write logs to the log directory instead of stderr",
        long_help = "Write logs to a daily file in ~/.config/bezy-glyphs/logs/ instead of stderr."
    )]
    pub log_file: bool,

    /// Allow writing skewed components for this run
    #[clap(
        long = "allow-skew",
        help = "Allow writing skewed components",
        long_help = "Enable the component_skew capability for this run, regardless of settings.json."
    )]
    pub allow_skew: bool,

    /// Initialize user configuration directory with default settings
    ///
    /// This creates the ~/.config/bezy-glyphs directory with:
    /// - settings.json: log level and the write capability table
    /// - logs/: daily log files written with --log-file
    #[clap(
        long = "new-config",
        help = "Initialize user config directory with default settings",
        long_help = "Initialize the ~/.config/bezy-glyphs directory with a settings.json file holding the log level and the table of edits the backend may write."
    )]
    pub new_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print font info (axes, masters, metrics) as JSON
    Info,
    /// Print the kerning tables as JSON
    Kerning,
    /// List glyph names with their code points
    Glyphs,
    /// Print a glyph as neutral variable glyph JSON
    Glyph { name: String },
    /// Write a glyph from a neutral variable glyph JSON file
    PutGlyph {
        name: String,
        json: PathBuf,
        /// Code points in hex, e.g. -u 41 -u 61
        #[clap(long = "unicode", short = 'u')]
        unicodes: Vec<String>,
    },
    /// Rename a glyph and the components that use it
    Rename { old: String, new: String },
    /// Delete a glyph no other glyph uses
    Delete { name: String },
    /// Print the feature code as one feature file
    Features,
    /// Replace the feature code from a feature file
    PutFeatures { file: PathBuf },
    /// Re-render the source from the model and report differing files
    Roundtrip {
        /// Write the re-rendered files back
        #[clap(long)]
        write: bool,
    },
}

impl CliArgs {
    /// Validate the CLI arguments after parsing
    ///
    /// This ensures that the source exists and looks like a Glyphs source
    /// before anything is opened, providing clear error messages for
    /// common mistakes.
    pub fn validate(&self) -> Result<(), String> {
        if self.command.is_some() && self.source.is_none() {
            return Err("No source given\nUse --source to name a .glyphs file or .glyphspackage directory.".into());
        }
        if let Some(path) = &self.source {
            validate_glyphs_path(path).map_err(|e| e.to_string())?;
        }
        if let Some(Command::PutGlyph { unicodes, .. }) = &self.command {
            parse_unicodes(unicodes)?;
        }
        Ok(())
    }
}

/// Parse hex code points such as `41`, `0x41` or `U+0041`
pub fn parse_unicodes(values: &[String]) -> Result<Vec<u32>, String> {
    values
        .iter()
        .map(|value| {
            let digits = value
                .strip_prefix("U+")
                .or_else(|| value.strip_prefix("u+"))
                .or_else(|| value.strip_prefix("0x"))
                .unwrap_or(value);
            u32::from_str_radix(digits, 16)
                .ok()
                .filter(|code| char::from_u32(*code).is_some())
                .ok_or_else(|| format!("Invalid code point: {value}"))
        })
        .collect()
}
