//! Verification targets, probe results and summaries.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::{DEFAULT_VERIFY_TIMEOUT_SECS, HTTP_TEST_URL, WS_TEST_URL};
use crate::enrich::JsonMap;

/// How TLS certificates of the test targets are checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsPolicy {
    /// Verify against the bundled web PKI roots.
    #[default]
    Verify,
    /// Verify against the PEM roots in this file only.
    CaBundle(PathBuf),
    /// Accept any certificate.
    Insecure,
}

impl TlsPolicy {
    /// Maps the CLI flags onto a policy; `insecure` wins over a CA bundle.
    pub fn from_flags(insecure: bool, ca_bundle: Option<&PathBuf>) -> Self {
        match (insecure, ca_bundle) {
            (true, _) => TlsPolicy::Insecure,
            (false, Some(path)) => TlsPolicy::CaBundle(path.clone()),
            (false, None) => TlsPolicy::Verify,
        }
    }
}

/// Endpoints probed through every proxy, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationTargets {
    pub http_url: String,
    pub ws_url: String,
    /// Bound for each individual network check.
    pub timeout: Duration,
    pub tls: TlsPolicy,
}

impl Default for VerificationTargets {
    fn default() -> Self {
        Self {
            http_url: HTTP_TEST_URL.to_string(),
            ws_url: WS_TEST_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_VERIFY_TIMEOUT_SECS),
            tls: TlsPolicy::Verify,
        }
    }
}

/// Result of probing one proxy endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub endpoint: String,
    pub http_ok: bool,
    pub http_error: Option<String>,
    /// `origin` (or `ip`) reported by the HTTP target, when present.
    pub http_origin: Option<String>,
    pub ws_ok: bool,
    pub ws_error: Option<String>,
}

impl ProbeResult {
    /// Both the HTTP and the WebSocket check succeeded.
    pub fn passed(&self) -> bool {
        self.http_ok && self.ws_ok
    }
}

/// Aggregate view over a batch of probe results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationSummary {
    pub total: usize,
    pub http_success: usize,
    pub ws_success: usize,
    /// Endpoints that failed either check, in probe order.
    pub failures: Vec<String>,
    pub results: Vec<ProbeResult>,
}

impl VerificationSummary {
    pub fn from_results(results: Vec<ProbeResult>) -> Self {
        Self {
            total: results.len(),
            http_success: results.iter().filter(|r| r.http_ok).count(),
            ws_success: results.iter().filter(|r| r.ws_ok).count(),
            failures: results
                .iter()
                .filter(|r| !r.passed())
                .map(|r| r.endpoint.clone())
                .collect(),
            results,
        }
    }

    /// Mubeng-style `{checked, ok, failures}` view of the results.
    pub fn local_report(&self) -> JsonMap {
        let mut report = JsonMap::new();
        report.insert("checked".into(), self.total.into());
        report.insert("ok".into(), self.failures.is_empty().into());
        report.insert("failures".into(), self.failures.clone().into());
        report
    }
}

/// Performs live reachability checks through proxies.
#[async_trait]
pub trait ProxyVerifier: Send + Sync {
    /// Direct, non-proxied check that both targets are reachable.
    async fn preflight(&self, targets: &VerificationTargets) -> anyhow::Result<()>;

    /// Probes each endpoint independently, one after another.
    async fn verify(&self, endpoints: &[String], targets: &VerificationTargets) -> Vec<ProbeResult>;
}

/// Secondary, external check over the verified endpoints.
#[async_trait]
pub trait EndpointSummarizer: Send + Sync {
    /// Binary recorded in the run summary.
    fn binary(&self) -> String;

    fn args(&self) -> Vec<String>;

    /// Returns the tool's JSON report. An explicit `"ok": false` in it is
    /// treated as a failure by the caller.
    async fn summarize(&self, endpoints: &[String]) -> anyhow::Result<JsonMap>;
}

/// What the verification stage did, recorded in the run summary even when
/// the stage fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VerificationRecord {
    pub endpoints: Vec<String>,
    pub preflight_ok: bool,
    pub summary: Option<VerificationSummary>,
    /// Mubeng-style view of the live results.
    pub local_report: Option<JsonMap>,
    /// Report of the external summarizer, when one ran.
    pub summarizer: Option<JsonMap>,
}
