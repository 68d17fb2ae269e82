//! On-disk cache of JSON responses, keyed by request URL.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use log::debug;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// One JSON file per URL under `dir`; entries expire by modification time.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
    ttl: Duration,
}

impl ResponseCache {
    /// Creates the cache, making sure `dir` exists.
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache directory {}", dir.display()))?;
        Ok(Self { dir, ttl })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the cache file for `url`: the hex SHA-256 of the URL, so
    /// distinct URLs never share a file and names stay short.
    pub fn path_for(&self, url: &str) -> PathBuf {
        let key = hex::encode(Sha256::digest(url.as_bytes()));
        self.dir.join(format!("{key}.json"))
    }

    /// Returns the cached payload for `url` if present and fresh.
    ///
    /// Stale, unreadable or corrupt entries are treated as misses.
    pub fn load(&self, url: &str) -> Option<Value> {
        let path = self.path_for(url);
        let modified = std::fs::metadata(&path).and_then(|meta| meta.modified()).ok()?;
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or_default();
        if age > self.ttl {
            debug!("Cache entry {} expired ({}s old)", path.display(), age.as_secs());
            return None;
        }

        let content = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(value) => {
                debug!("Cache hit for {}", url);
                Some(value)
            }
            Err(e) => {
                debug!("Ignoring corrupt cache entry {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Stores `payload` as the cached response for `url`.
    pub fn store(&self, url: &str, payload: &Value) -> Result<()> {
        let path = self.path_for(url);
        let content = serde_json::to_string(payload).context("Failed to serialize cache entry")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write cache {}", path.display()))?;
        Ok(())
    }
}
