//! Core application functionality
//!
//! This module contains the pieces shared by the library and the binary:
//! - Error types
//! - Settings and CLI handling
//! - The command runner

pub mod cli;
pub mod config;
pub mod errors;
pub mod platform;
pub mod runner;

// Re-export commonly used items
pub use cli::CliArgs;
pub use config::ConfigFile;
pub use errors::{BackendError, BackendResult, ParseError, WriteError};
pub use runner::run_app;
