//! CSV export of relay records.
//!
//! Rows are built from JSON objects so that both freshly enriched relays and
//! previously written JSON artifacts go through the same writer.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use csv::Writer;
use serde_json::Value;

use crate::config::CSV_HEADER;

/// Writes one row per relay object under the fixed CSV header.
///
/// Missing and `null` fields become empty cells.
///
/// # Returns
///
/// The number of rows written.
pub fn write_csv(records: &[Value], path: &Path) -> Result<usize> {
    let mut writer = Writer::from_path(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    writer.write_record(CSV_HEADER)?;
    for record in records {
        let row = CSV_HEADER.iter().map(|column| cell(record.get(*column)));
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(records.len())
}

/// Converts an enriched JSON artifact at `source` into CSV at `destination`.
///
/// # Errors
///
/// Fails unless `source` holds a JSON array of objects.
pub fn convert_json_to_csv(source: &Path, destination: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(source)
        .with_context(|| format!("Failed to read JSON from {}", source.display()))?;
    let payload: Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON at {}", source.display()))?;
    let Value::Array(records) = payload else {
        bail!("Expected a list of relay objects in {}", source.display());
    };
    if records.iter().any(|record| !record.is_object()) {
        return Err(anyhow!("Relay entries must be JSON objects"));
    }

    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("Failed to prepare output directory")?;
    }
    write_csv(&records, destination)
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
