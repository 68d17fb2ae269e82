//! JSON artifacts.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::enrich::EnrichedRelay;
use crate::relay::Relay;

/// Writes enriched relays as a pretty-printed JSON array.
pub fn write_json(relays: &[EnrichedRelay], path: &Path) -> Result<()> {
    write_pretty(relays, path)
}

/// Writes plain relay records, without enrichment fields.
pub fn write_canonical_json(relays: &[Relay], path: &Path) -> Result<()> {
    write_pretty(relays, path)
}

pub(crate) fn write_pretty<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let mut content = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    content.push('\n');
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
