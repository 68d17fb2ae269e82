//! Error handling.
//!
//! This module provides:
//! - `BuildError`, the single fatal error of a pipeline run, tagged with a
//!   `BuildErrorKind`
//! - `InitializationError` for logger, HTTP client and TLS setup failures
//!
//! Collaborator code works with `anyhow::Result`; errors are folded into a
//! `BuildError` at stage boundaries.

mod types;

// Re-export public API
pub use types::{BuildError, BuildErrorKind, InitializationError};
