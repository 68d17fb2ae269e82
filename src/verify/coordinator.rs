//! Verification stage: preflight, live probes, optional summarizer.

use log::{info, warn};
use serde_json::{json, Value};

use crate::error_handling::{BuildError, BuildErrorKind};

use super::types::{
    EndpointSummarizer, ProxyVerifier, VerificationRecord, VerificationSummary, VerificationTargets,
};

/// Runs the verification stage over `endpoints`, recording progress in
/// `record` as it goes.
///
/// The targets are preflighted directly first; if either is unreachable no
/// proxy is probed. Every endpoint must then pass both the HTTP and the
/// WebSocket probe. When a summarizer is given it runs over the verified
/// endpoints, and a report with `"ok": false` fails the stage.
///
/// # Errors
///
/// `Preflight`, `Verification` or `Summarizer` build errors.
pub async fn run_verification_stage(
    endpoints: &[String],
    targets: &VerificationTargets,
    verifier: &dyn ProxyVerifier,
    summarizer: Option<&dyn EndpointSummarizer>,
    record: &mut VerificationRecord,
) -> Result<VerificationSummary, BuildError> {
    record.endpoints = endpoints.to_vec();

    verifier.preflight(targets).await.map_err(|e| {
        BuildError::with_cause(
            BuildErrorKind::Preflight,
            format!("Verification targets unreachable: {e:#}"),
            e,
        )
    })?;
    record.preflight_ok = true;

    info!("Verifying {} endpoint(s)", endpoints.len());
    let summary = VerificationSummary::from_results(verifier.verify(endpoints, targets).await);
    record.local_report = Some(summary.local_report());
    record.summary = Some(summary.clone());
    info!(
        "HTTP success: {}/{}, WebSocket success: {}/{}",
        summary.http_success, summary.total, summary.ws_success, summary.total
    );

    if !summary.failures.is_empty() {
        for result in summary.results.iter().filter(|r| !r.passed()) {
            warn!(
                "{} failed verification (http: {}, ws: {})",
                result.endpoint,
                result.http_error.as_deref().unwrap_or("ok"),
                result.ws_error.as_deref().unwrap_or("ok")
            );
        }
        return Err(BuildError::new(
            BuildErrorKind::Verification,
            format!("Proxy verification failed for: {}", summary.failures.join(", ")),
        ));
    }

    if let Some(summarizer) = summarizer {
        let mut report = summarizer.summarize(endpoints).await.map_err(|e| {
            BuildError::with_cause(BuildErrorKind::Summarizer, e.to_string(), e)
        })?;
        report
            .entry("binary")
            .or_insert_with(|| json!(summarizer.binary()));
        report.entry("args").or_insert_with(|| json!(summarizer.args()));
        let failed = report.get("ok") == Some(&Value::Bool(false));
        record.summarizer = Some(report.clone());
        if failed {
            return Err(BuildError::new(
                BuildErrorKind::Summarizer,
                format!(
                    "{} reported failures: {}",
                    summarizer.binary(),
                    Value::Object(report)
                ),
            ));
        }
    }

    Ok(summary)
}
