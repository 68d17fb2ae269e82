//! Proxy Scraper Checker integration.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use log::info;
use serde_json::{json, Value};

use crate::config::{CHECKER_INSTALL_GUIDANCE, DEFAULT_CHECKER_TIMEOUT_SECS};
use crate::relay::{truthy, Relay};
use crate::utils::{resolve_binary, run_with_input};

use super::endpoint::extract_endpoint;
use super::types::{JsonMap, ProxyChecker};

const TOOL: &str = "Proxy Scraper Checker";
const LIST_KEYS: [&str; 3] = ["proxies", "socks5", "items"];

/// Augments relays with verdicts from Proxy Scraper Checker.
///
/// Output comes either from running the binary (endpoints on stdin, JSON on
/// stdout) or from a recorded export file, which takes precedence.
#[derive(Debug, Clone)]
pub struct ProxyScraperChecker {
    binary: Option<String>,
    args: Vec<String>,
    timeout: Duration,
    export_path: Option<PathBuf>,
}

impl ProxyScraperChecker {
    /// # Errors
    ///
    /// Fails if `export_path` is given but does not exist.
    pub fn new(binary: Option<String>, export_path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = &export_path {
            if !path.exists() {
                bail!("{TOOL} export not found: {}", path.display());
            }
        }
        Ok(Self {
            binary,
            args: Vec::new(),
            timeout: Duration::from_secs(DEFAULT_CHECKER_TIMEOUT_SECS),
            export_path,
        })
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn load_items(&self, relays: &[Relay]) -> Result<Vec<JsonMap>> {
        let raw = match &self.export_path {
            Some(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {TOOL} export {}", path.display()))?,
            None => self.run_checker(relays).await?,
        };
        let parsed: Value = serde_json::from_str(&raw)
            .with_context(|| format!("{TOOL} returned invalid JSON output"))?;
        items_from_output(parsed)
    }

    async fn run_checker(&self, relays: &[Relay]) -> Result<String> {
        let binary = self.binary.as_deref().ok_or_else(|| {
            anyhow!(
                "{TOOL} binary not configured. Provide --proxy-checker-bin or \
                 set export_path with recorded output."
            )
        })?;
        let binary_path = resolve_binary(binary)
            .ok_or_else(|| anyhow!("{TOOL} binary not found. {CHECKER_INSTALL_GUIDANCE}"))?;
        let input = relays
            .iter()
            .map(Relay::socks5_endpoint)
            .collect::<Vec<_>>()
            .join("\n");
        info!("Running {} over {} endpoint(s)", binary_path.display(), relays.len());
        run_with_input(TOOL, &binary_path, &self.args, &input, self.timeout).await
    }

    fn summary(&self, total_entries: usize, matched: usize) -> JsonMap {
        let mut summary = JsonMap::new();
        summary.insert("source".into(), json!("proxy-scraper-checker"));
        summary.insert("total_entries".into(), json!(total_entries));
        summary.insert("matched".into(), json!(matched));
        if let Some(binary) = &self.binary {
            summary.insert("binary".into(), json!(binary));
            summary.insert("args".into(), json!(self.args));
            summary.insert("timeout".into(), json!(self.timeout.as_secs()));
        }
        if let Some(path) = &self.export_path {
            summary.insert("export_path".into(), json!(path.display().to_string()));
        }
        summary
    }
}

#[async_trait]
impl ProxyChecker for ProxyScraperChecker {
    async fn enrich(&self, relays: &[Relay]) -> Result<(Option<JsonMap>, Vec<JsonMap>)> {
        if relays.is_empty() {
            return Ok((None, Vec::new()));
        }
        let items = self.load_items(relays).await?;

        // Later items for the same endpoint replace earlier ones in place.
        let mut details: Vec<JsonMap> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for item in &items {
            let Some(endpoint) = extract_endpoint(item) else {
                continue;
            };
            let metadata = normalize_item(&endpoint, item);
            match positions.get(&endpoint) {
                Some(&index) => details[index] = metadata,
                None => {
                    positions.insert(endpoint, details.len());
                    details.push(metadata);
                }
            }
        }

        let summary = self.summary(items.len(), details.len());
        Ok((Some(summary), details))
    }
}

/// Accepts a list of objects, or an object holding one under a list key;
/// any other object counts as a single item.
fn items_from_output(raw: Value) -> Result<Vec<JsonMap>> {
    let objects = |values: Vec<Value>| {
        values
            .into_iter()
            .filter_map(|value| match value {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect::<Vec<_>>()
    };
    match raw {
        Value::Array(values) => Ok(objects(values)),
        Value::Object(mut map) => {
            for key in LIST_KEYS {
                if matches!(map.get(key), Some(Value::Array(_))) {
                    if let Some(Value::Array(values)) = map.remove(key) {
                        return Ok(objects(values));
                    }
                }
            }
            Ok(vec![map])
        }
        _ => bail!("Unsupported proxy checker export format"),
    }
}

fn normalize_item(endpoint: &str, item: &JsonMap) -> JsonMap {
    let first_truthy = |keys: &[&str]| -> Value {
        keys.iter()
            .filter_map(|key| item.get(*key))
            .find(|value| truthy(Some(*value)))
            .or_else(|| keys.last().and_then(|key| item.get(*key)))
            .cloned()
            .unwrap_or(Value::Null)
    };
    let field = |key: &str| item.get(key).cloned().unwrap_or(Value::Null);

    let mut metadata = JsonMap::new();
    metadata.insert("socks5_endpoint".into(), json!(endpoint));
    metadata.insert("availability".into(), first_truthy(&["status", "availability", "alive"]));
    metadata.insert("latency_ms".into(), first_truthy(&["latency_ms", "latency", "ping"]));
    metadata.insert("country".into(), field("country"));
    metadata.insert("city".into(), field("city"));
    metadata.insert("source".into(), field("source"));
    metadata.insert("protocol".into(), field("protocol"));
    metadata
}
