//! User configuration file handling
//!
//! Manages settings from ~/.config/bezy-glyphs/settings.json

use crate::mapping::WriteCapabilities;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const APP_DIR: &str = "bezy-glyphs";
const SETTINGS_FILE: &str = "settings.json";

/// User configuration from ~/.config/bezy-glyphs/settings.json
///
/// These settings override built-in defaults but are overridden by CLI arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConfigFile {
    /// Log filter used when RUST_LOG is not set (e.g., "info", "bezy_glyphs=debug")
    pub log_level: Option<String>,
    /// Which edits the backend may write
    pub capabilities: WriteCapabilities,
}

impl ConfigFile {
    /// Get the path to the bezy-glyphs config directory
    pub fn config_dir() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")));
        config_dir.join(APP_DIR)
    }

    /// Get the path to the user config file
    pub fn config_path() -> PathBuf {
        Self::config_dir().join(SETTINGS_FILE)
    }

    /// Load configuration from the user config file
    pub fn load() -> Option<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    debug!("Loaded user settings from {:?}", path);
                    Some(config)
                }
                Err(e) => {
                    warn!("Failed to parse {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Load the user config file, falling back to defaults
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Save configuration to the user config file
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;

        debug!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Initialize the user configuration directory
    ///
    /// This creates:
    /// 1. The ~/.config/bezy-glyphs directory
    /// 2. A settings.json file with default values
    /// 3. A logs/ directory for log files
    pub fn initialize_config_directory() -> anyhow::Result<()> {
        let config_dir = Self::config_dir();
        fs::create_dir_all(&config_dir)?;
        println!("Created config directory: {:?}", config_dir);

        let logs_dir = crate::logging::logs_dir();
        fs::create_dir_all(&logs_dir)?;
        println!("Created logs directory: {:?}", logs_dir);

        let settings_path = Self::config_path();
        if !settings_path.exists() {
            let defaults = ConfigFile {
                log_level: Some("info".to_string()),
                ..ConfigFile::default()
            };
            defaults.save()?;
            println!("Created settings file: {:?}", settings_path);
        } else {
            println!("Settings file already exists: {:?}", settings_path);
        }

        println!("\nConfiguration initialized successfully!");
        println!("You can now:");
        println!("  - Edit settings at: {:?}", settings_path);
        println!("  - View log files in: {:?}", logs_dir);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_use_defaults() {
        let config: ConfigFile =
            serde_json::from_str(r#"{"capabilities": {"rename_glyph": false}}"#).unwrap();
        assert_eq!(config.log_level, None);
        assert!(!config.capabilities.rename_glyph);
        assert!(config.capabilities.paths);
        assert!(!config.capabilities.component_skew);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);
        let config = ConfigFile {
            log_level: Some("debug".into()),
            ..ConfigFile::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(ConfigFile::load_from(&path), Some(config));

        fs::write(&path, "{ not json").unwrap();
        assert_eq!(ConfigFile::load_from(&path), None);
        assert_eq!(ConfigFile::load_from(&dir.path().join("missing.json")), None);
    }
}
