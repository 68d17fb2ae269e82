//! Mubeng as the secondary endpoint summarizer.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::{DEFAULT_MUBENG_BIN, DEFAULT_MUBENG_TIMEOUT_SECS, MUBENG_INSTALL_GUIDANCE};
use crate::enrich::JsonMap;
use crate::utils::{resolve_binary, run_with_input};

use super::types::EndpointSummarizer;

const TOOL: &str = "Mubeng";

/// Runs Mubeng over `socks5://` URIs given on stdin and returns its JSON
/// report.
#[derive(Debug, Clone)]
pub struct MubengSummarizer {
    binary: String,
    args: Vec<String>,
    timeout: Duration,
}

impl Default for MubengSummarizer {
    fn default() -> Self {
        Self::new(DEFAULT_MUBENG_BIN)
    }
}

impl MubengSummarizer {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            args: Vec::new(),
            timeout: Duration::from_secs(DEFAULT_MUBENG_TIMEOUT_SECS),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// `socks5://` URI for an endpoint, left alone if it already is one.
pub(crate) fn socks5_uri(endpoint: &str) -> String {
    if endpoint.starts_with("socks5://") {
        endpoint.to_string()
    } else {
        format!("socks5://{endpoint}")
    }
}

#[async_trait]
impl EndpointSummarizer for MubengSummarizer {
    fn binary(&self) -> String {
        self.binary.clone()
    }

    fn args(&self) -> Vec<String> {
        self.args.clone()
    }

    async fn summarize(&self, endpoints: &[String]) -> Result<JsonMap> {
        if endpoints.is_empty() {
            bail!("No endpoints provided for Mubeng verification");
        }
        let binary_path = resolve_binary(&self.binary)
            .ok_or_else(|| anyhow!("{TOOL} binary not found. {MUBENG_INSTALL_GUIDANCE}"))?;
        let input = endpoints
            .iter()
            .map(|endpoint| socks5_uri(endpoint))
            .collect::<Vec<_>>()
            .join("\n");

        let output = run_with_input(TOOL, &binary_path, &self.args, &input, self.timeout).await?;
        let report: Value = serde_json::from_str(&output)
            .with_context(|| format!("{TOOL} returned invalid JSON output"))?;
        let Value::Object(mut report) = report else {
            bail!("{TOOL} returned unsupported output format");
        };
        report
            .entry("binary")
            .or_insert_with(|| json!(binary_path.display().to_string()));
        report.entry("args").or_insert_with(|| json!(self.args));
        Ok(report)
    }
}
