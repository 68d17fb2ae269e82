//! Plain-text endpoint list.

use std::path::Path;

use anyhow::{Context, Result};

use crate::relay::Relay;

/// One `socks5://<endpoint>` line per relay.
pub fn render_text(relays: &[Relay]) -> String {
    relays
        .iter()
        .map(|relay| format!("socks5://{}\n", relay.socks5_endpoint()))
        .collect()
}

pub fn write_text(relays: &[Relay], path: &Path) -> Result<()> {
    std::fs::write(path, render_text(relays))
        .with_context(|| format!("Failed to write {}", path.display()))
}
