//! Client for Mullvad's public relay API.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::StatusCode;
use serde_json::Value;

use crate::config::{API_TIMEOUT, API_URL, PRIMARY_SOURCE_NAME};

use super::cache::ResponseCache;
use super::types::SourceAdapter;

/// The primary relay source, with an optional on-disk response cache.
#[derive(Debug, Clone)]
pub struct MullvadApi {
    client: reqwest::Client,
    url: String,
    cache: Option<ResponseCache>,
}

impl MullvadApi {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            url: API_URL.to_string(),
            cache: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Enables the response cache. Without one, every fetch hits the API.
    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the raw relay listing.
    ///
    /// `force_refresh` skips cache reads; a fresh response is still cached.
    pub async fn fetch_wireguard_relays(&self, force_refresh: bool) -> Result<Value> {
        if let Some(cache) = self.cache.as_ref().filter(|_| !force_refresh) {
            if let Some(payload) = cache.load(&self.url) {
                return Ok(payload);
            }
        }

        info!("Fetching relay data from {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .timeout(API_TIMEOUT)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to reach {}: {}", self.url, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            bail!("Unexpected status {} from {}", status.as_u16(), self.url);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| anyhow!("Failed to reach {}: {}", self.url, e))?;
        let payload: Value =
            serde_json::from_slice(&body).context("Mullvad API did not return JSON data")?;

        if let Some(cache) = &self.cache {
            match cache.store(&self.url, &payload) {
                Ok(()) => debug!("Cached response in {}", cache.path_for(&self.url).display()),
                Err(e) => warn!("Response from {} not cached: {:#}", self.url, e),
            }
        }
        Ok(payload)
    }
}

#[async_trait]
impl SourceAdapter for MullvadApi {
    fn name(&self) -> &str {
        PRIMARY_SOURCE_NAME
    }

    async fn fetch(&self, force_refresh: bool) -> Result<Value> {
        self.fetch_wireguard_relays(force_refresh).await
    }
}
