//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (endpoints, timeouts, artifact names, etc.)
//! - CLI option types and parsing

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{
    BuildArgs, Cli, Command, ExportCsvArgs, LogFormat, LogLevel, NamedSource, VerifyArgs,
};
