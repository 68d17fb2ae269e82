//! Utility functions.
//!
//! This module provides subprocess helpers shared by the proxy checker and
//! the Mubeng summarizer.

mod process;

pub use process::{resolve_binary, run_with_input};
