//! Enrichment engine.

use std::collections::HashMap;

use log::{debug, info};
use serde_json::Value;

use crate::error_handling::{BuildError, BuildErrorKind};
use crate::relay::Relay;

use super::types::{EnrichedRelay, EnrichmentResult, JsonMap, ProxyChecker};

/// Attaches checker metadata and display labels, and picks verification
/// candidates.
///
/// The checker, when given, runs once over all relays. Relays it has no
/// detail for are kept without `availability` or `proxy_checker`.
/// Candidates are the first `verification_sample_size` relays, or all of
/// them when the size is unset or zero.
///
/// # Errors
///
/// A failing checker is fatal (`ProxyChecker` kind).
pub async fn enrich_relays(
    relays: &[Relay],
    proxy_checker: Option<&dyn ProxyChecker>,
    verification_sample_size: Option<usize>,
) -> Result<EnrichmentResult, BuildError> {
    let mut checker_summary = None;
    let mut by_endpoint: HashMap<String, JsonMap> = HashMap::new();

    if let Some(checker) = proxy_checker.filter(|_| !relays.is_empty()) {
        let (summary, details) = checker.enrich(relays).await.map_err(|e| {
            BuildError::with_cause(BuildErrorKind::ProxyChecker, e.to_string(), e)
        })?;
        for detail in details {
            let endpoint = ["socks5_endpoint", "endpoint"]
                .into_iter()
                .find_map(|key| detail.get(key).and_then(Value::as_str))
                .filter(|endpoint| !endpoint.is_empty())
                .map(str::to_string);
            match endpoint {
                Some(endpoint) => {
                    by_endpoint.insert(endpoint, detail);
                }
                None => debug!("Ignoring checker detail without endpoint"),
            }
        }
        info!("Proxy checker returned metadata for {} endpoint(s)", by_endpoint.len());
        checker_summary = summary;
    }

    let enriched_relays = relays
        .iter()
        .map(|relay| {
            let metadata = by_endpoint.get(relay.socks5_endpoint()).cloned();
            EnrichedRelay {
                relay: relay.clone(),
                display_label: relay.display_label(),
                availability: metadata
                    .as_ref()
                    .and_then(|meta| meta.get("availability"))
                    .filter(|value| !value.is_null())
                    .cloned(),
                proxy_checker: metadata,
            }
        })
        .collect();

    let verification_candidates = match verification_sample_size {
        Some(size) if size > 0 => relays.iter().take(size).cloned().collect(),
        _ => relays.to_vec(),
    };

    Ok(EnrichmentResult {
        enriched_relays,
        verification_candidates,
        checker_summary,
    })
}
