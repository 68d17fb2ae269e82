//! Artifact writers.
//!
//! This module renders the final relay list as:
//! - JSON (enriched relays) and canonical JSON (plain relays)
//! - a text list of `socks5://` URIs
//! - a PAC script
//! - CSV, also available as a conversion from an existing JSON artifact

mod csv;
mod json;
mod pac;
mod text;

pub use csv::{convert_json_to_csv, write_csv};
pub use json::{write_canonical_json, write_json};
pub use pac::{render_pac, write_pac};
pub use text::{render_text, write_text};

pub(crate) use json::write_pretty;
