//! Fetching the primary source and supplemental adapters with retries.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use log::{debug, warn};
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;

use crate::config::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY_SECS};

use super::types::{SourceAdapter, SourceResult};

/// Coordinates fetching from the primary source and any supplemental adapters.
///
/// Sources are fetched one after another in configuration order, primary
/// first. Each source is retried independently with a fixed delay between
/// attempts.
pub struct SourceManager {
    primary: Box<dyn SourceAdapter>,
    adapters: Vec<Box<dyn SourceAdapter>>,
    retry_delay: Duration,
    max_attempts: usize,
}

impl SourceManager {
    pub fn new(primary: Box<dyn SourceAdapter>, adapters: Vec<Box<dyn SourceAdapter>>) -> Self {
        Self {
            primary,
            adapters,
            retry_delay: Duration::from_secs_f64(DEFAULT_RETRY_DELAY_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Overrides the retry policy. `max_attempts` is clamped to at least 1.
    pub fn with_retry(mut self, retry_delay: Duration, max_attempts: usize) -> Self {
        self.retry_delay = retry_delay;
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Fetches every source, returning one result per source in order.
    ///
    /// Failures are captured in the results rather than returned; deciding
    /// which failures are fatal is up to the caller.
    pub async fn fetch_all(&self, force_refresh: bool) -> Vec<SourceResult> {
        let mut results = Vec::with_capacity(1 + self.adapters.len());
        results.push(self.fetch_with_retry(self.primary.as_ref(), force_refresh).await);
        for adapter in &self.adapters {
            results.push(self.fetch_with_retry(adapter.as_ref(), force_refresh).await);
        }
        results
    }

    async fn fetch_with_retry(&self, adapter: &dyn SourceAdapter, force_refresh: bool) -> SourceResult {
        let name = adapter.name();
        let max_attempts = self.max_attempts;
        let strategy = FixedInterval::new(self.retry_delay).take(max_attempts - 1);
        let counter = AtomicUsize::new(0);
        let attempts = &counter;
        let start = Instant::now();

        debug!("Fetching source {} (force_refresh={})", name, force_refresh);
        let outcome = Retry::spawn(strategy, move || async move {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            adapter.fetch(force_refresh).await.inspect_err(|e| {
                warn!(
                    "Source {} attempt {}/{} failed: {:#}",
                    name, attempt, max_attempts, e
                );
            })
        })
        .await;

        let duration = start.elapsed();
        let attempts = counter.load(Ordering::SeqCst);
        let (payload, error) = match outcome {
            Ok(payload) => (Some(payload), None),
            Err(e) => (None, Some(e)),
        };
        SourceResult {
            name: name.to_string(),
            payload,
            error,
            duration,
            attempts,
            cache_bypassed: force_refresh,
        }
    }
}
