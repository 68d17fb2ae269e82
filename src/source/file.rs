//! Supplemental source backed by a JSON file on disk.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use super::types::SourceAdapter;

/// Reads a payload in the provider's format from a local file.
///
/// Used for mirrors and recorded snapshots added with `--extra-source`.
#[derive(Debug, Clone)]
pub struct FileSourceAdapter {
    name: String,
    path: PathBuf,
}

impl FileSourceAdapter {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[async_trait]
impl SourceAdapter for FileSourceAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, _force_refresh: bool) -> Result<Value> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", self.path.display()))
    }
}
