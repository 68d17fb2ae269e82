//! Source adapter contract and per-source fetch results.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

/// A named origin of relay metadata.
///
/// Implementations return the raw provider payload; normalization happens
/// later, once all sources have been fetched.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Name used in relay `source` tags, logs and the run summary.
    fn name(&self) -> &str;

    /// Fetches the raw payload. `force_refresh` asks the adapter to bypass
    /// any cache it keeps.
    async fn fetch(&self, force_refresh: bool) -> anyhow::Result<Value>;
}

/// Outcome of fetching one named source.
#[derive(Debug)]
pub struct SourceResult {
    pub name: String,
    pub payload: Option<Value>,
    /// Error of the final attempt, set only when every attempt failed.
    pub error: Option<anyhow::Error>,
    /// Wall-clock time from the first attempt to the last.
    pub duration: Duration,
    pub attempts: usize,
    /// Mirrors the `force_refresh` flag handed to the adapter.
    pub cache_bypassed: bool,
}

impl SourceResult {
    pub fn succeeded(&self) -> bool {
        self.payload.is_some()
    }
}
