//! Live proxy verification.
//!
//! Preflights the HTTP and WebSocket test targets, probes each candidate
//! endpoint through SOCKS5 with a [`ProxyVerifier`], and optionally hands the
//! verified endpoints to an external [`EndpointSummarizer`] such as Mubeng.

mod coordinator;
mod http;
mod live;
mod summarizer;
mod tls;
mod types;
mod websocket;

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde_json::Value;

pub use coordinator::run_verification_stage;
pub use live::LiveVerifier;
pub use summarizer::MubengSummarizer;
pub use tls::client_config;
pub use types::{
    EndpointSummarizer, ProbeResult, ProxyVerifier, TlsPolicy, VerificationRecord,
    VerificationSummary, VerificationTargets,
};

/// Reads `socks5_endpoint` values from a JSON relay artifact, keeping at
/// most `limit` of them.
pub fn load_endpoints(path: &Path, limit: Option<usize>) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read JSON from {}", path.display()))?;
    let data: Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON at {}", path.display()))?;
    let items = data
        .as_array()
        .ok_or_else(|| anyhow!("Expected a list of relay objects in {}", path.display()))?;

    let mut endpoints = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.get("socks5_endpoint")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| anyhow!("Relay entry {index} has no socks5_endpoint"))
        })
        .collect::<Result<Vec<_>>>()?;
    if let Some(limit) = limit {
        endpoints.truncate(limit);
    }
    Ok(endpoints)
}

/// Error text including its source chain.
pub(crate) fn describe_error(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}
