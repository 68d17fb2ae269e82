//! Enrichment types and the proxy checker contract.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::relay::Relay;

/// JSON object as produced by external tools.
pub type JsonMap = Map<String, Value>;

/// External tool that reports availability metadata per proxy endpoint.
#[async_trait]
pub trait ProxyChecker: Send + Sync {
    /// Checks `relays` and returns an optional summary plus one detail map
    /// per endpoint the tool knows about. Each detail carries the endpoint
    /// under `socks5_endpoint` or `endpoint`.
    async fn enrich(&self, relays: &[Relay]) -> anyhow::Result<(Option<JsonMap>, Vec<JsonMap>)>;
}

/// A relay plus metadata computed during enrichment.
///
/// Serializes as the relay's own fields followed by `display_label` and,
/// when known, `availability` and `proxy_checker`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRelay {
    #[serde(flatten)]
    pub relay: Relay,
    pub display_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_checker: Option<JsonMap>,
}

/// Output of the enrichment stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentResult {
    /// One entry per input relay, in input order.
    pub enriched_relays: Vec<EnrichedRelay>,
    pub verification_candidates: Vec<Relay>,
    pub checker_summary: Option<JsonMap>,
}
