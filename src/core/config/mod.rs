//! Application configuration management
//!
//! CLI arguments live in `core::cli`; this module handles the user
//! configuration file.

pub mod user_config;

pub use user_config::ConfigFile;
