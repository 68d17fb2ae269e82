//! Relay enrichment.
//!
//! Wraps each relay in an [`EnrichedRelay`] carrying a display label and,
//! when a [`ProxyChecker`] is configured, the checker's metadata for the
//! relay's endpoint. Also selects the relays handed to live verification.

mod checker;
mod endpoint;
mod engine;
mod types;

pub use checker::ProxyScraperChecker;
pub use endpoint::extract_endpoint;
pub use engine::enrich_relays;
pub use types::{EnrichedRelay, EnrichmentResult, JsonMap, ProxyChecker};
