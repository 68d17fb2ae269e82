//! Pipeline orchestration.
//!
//! [`run_pipeline`] sequences one run: fetch, normalize, filter, validate,
//! enrich, verify and write. Each stage is timed, and the run summary is
//! finalized and persisted on every exit path before the outcome is returned.

mod resources;
mod stats;
mod summary;

use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::{info, warn};

use crate::config::{
    CANONICAL_JSON_ARTIFACT, CSV_ARTIFACT, DEFAULT_OUTPUT_DIR, DEFAULT_SLA_SECONDS,
    DIAGNOSTIC_SAMPLE_LIMIT, JSON_ARTIFACT, PAC_ARTIFACT, TEXT_ARTIFACT,
};
use crate::enrich::{enrich_relays, EnrichedRelay};
use crate::error_handling::{BuildError, BuildErrorKind};
use crate::export::{write_canonical_json, write_csv, write_json, write_pac, write_text};
use crate::filter::{filter_relays, format_filter_diagnostics, FilterConfig};
use crate::relay::{normalize_payload, Relay, SourcePayload};
use crate::source::SourceResult;
use crate::validation::validate_relays;
use crate::verify::{
    run_verification_stage, EndpointSummarizer, MubengSummarizer, VerificationRecord,
    VerificationTargets,
};

pub use resources::Collaborators;
pub use stats::{PipelineStats, SourceSummary, StageMeasurement, StageTimer};
pub use summary::{ExclusionSummary, IssueSummary, RunCounts, RunStatus, RunSummary};

/// Settings of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub filter: FilterConfig,
    /// Ask sources to bypass their caches.
    pub force_refresh: bool,
    pub output_dir: PathBuf,
    pub emit_canonical_json: bool,
    /// JSON-lines file the run summary is appended to.
    pub run_log: Option<PathBuf>,
    pub sla_seconds: f64,
    /// Number of relays to live-verify; unset or zero means all of them
    /// once verification is triggered.
    pub verify_sample_size: Option<usize>,
    /// Run the endpoint summarizer after live verification.
    pub verify_summarizer: bool,
    pub targets: VerificationTargets,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            force_refresh: false,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            emit_canonical_json: false,
            run_log: None,
            sla_seconds: DEFAULT_SLA_SECONDS,
            verify_sample_size: None,
            verify_summarizer: false,
            targets: VerificationTargets::default(),
        }
    }
}

impl PipelineOptions {
    /// Verification runs for a positive sample size or when the summarizer
    /// was requested.
    pub fn verification_requested(&self) -> bool {
        self.verify_sample_size.is_some_and(|size| size > 0) || self.verify_summarizer
    }
}

/// Files written by a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub json: PathBuf,
    pub text: PathBuf,
    pub pac: PathBuf,
    pub csv: PathBuf,
    pub canonical_json: Option<PathBuf>,
}

impl Artifacts {
    fn in_dir(dir: &Path, canonical: bool) -> Self {
        Self {
            json: dir.join(JSON_ARTIFACT),
            text: dir.join(TEXT_ARTIFACT),
            pac: dir.join(PAC_ARTIFACT),
            csv: dir.join(CSV_ARTIFACT),
            canonical_json: canonical.then(|| dir.join(CANONICAL_JSON_ARTIFACT)),
        }
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![
            self.json.clone(),
            self.text.clone(),
            self.pac.clone(),
            self.csv.clone(),
        ];
        paths.extend(self.canonical_json.clone());
        paths
    }
}

/// Non-fatal ends of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Artifacts were written for `relay_count` relays.
    Built {
        relay_count: usize,
        artifacts: Artifacts,
    },
    /// No relay survived filtering or validation; nothing was written apart
    /// from the run summary.
    NoMatches { message: String, samples: Vec<String> },
}

/// Runs the pipeline once.
///
/// The summary (`pipeline_summary.json` in the output directory, plus the
/// run log when configured) is written whatever the outcome; failing to
/// write it is logged and does not change the outcome.
///
/// # Errors
///
/// Returns the first fatal [`BuildError`] raised by a stage.
pub async fn run_pipeline(
    options: &PipelineOptions,
    collaborators: &Collaborators,
) -> Result<RunOutcome, BuildError> {
    run_pipeline_until(options, collaborators, std::future::pending()).await
}

/// Like [`run_pipeline`], but stops early once `interrupt` completes.
///
/// An interrupted run still records the stage it was waiting on and persists
/// its summary with the `interrupted` status.
///
/// # Errors
///
/// Returns a [`BuildErrorKind::Interrupted`] error when `interrupt` wins,
/// otherwise the first fatal error raised by a stage.
pub async fn run_pipeline_until(
    options: &PipelineOptions,
    collaborators: &Collaborators,
    interrupt: impl Future<Output = ()>,
) -> Result<RunOutcome, BuildError> {
    let mut stats = PipelineStats::new(options.sla_seconds);
    let mut summary = RunSummary::default();

    let outcome = tokio::select! {
        outcome = execute(options, collaborators, &mut stats, &mut summary) => outcome,
        () = interrupt => Err(BuildError::new(BuildErrorKind::Interrupted, "Interrupted")),
    };
    match &outcome {
        Ok(RunOutcome::Built { artifacts, .. }) => {
            summary.status = RunStatus::Success;
            summary.artifacts = artifacts.paths();
        }
        Ok(RunOutcome::NoMatches { .. }) => summary.status = RunStatus::NoMatches,
        Err(e) => {
            if e.kind() == BuildErrorKind::Interrupted {
                let note = match stats.close_pending_stage() {
                    Some(stage) => format!("Run interrupted during stage '{stage}'"),
                    None => "Run interrupted".to_string(),
                };
                warn!("{}", note);
                stats.add_note(note);
            }
            summary.record_error(e);
        }
    }

    summary.finalize(&mut stats);
    persist_summary(&summary, options);
    outcome
}

async fn execute(
    options: &PipelineOptions,
    collaborators: &Collaborators,
    stats: &mut PipelineStats,
    summary: &mut RunSummary,
) -> Result<RunOutcome, BuildError> {
    info!("Fetching relay metadata");
    let results = stats
        .measure("fetch", collaborators.sources.fetch_all(options.force_refresh))
        .await;
    stats.record_source_results(&results);
    let payloads = successful_payloads(results, stats)?;

    info!("Transforming relays");
    let timer = stats.start_stage("normalize");
    let relays = normalize_sources(&payloads, stats);
    stats.end_stage(timer);
    let relays = relays?;
    summary.counts.normalized = relays.len();

    let timer = stats.start_stage("filter");
    let (filtered, report) = filter_relays(&relays, &options.filter);
    stats.end_stage(timer);
    summary.counts.filtered = filtered.len();
    summary.record_filter_report(&report);
    if filtered.is_empty() {
        let (message, samples) =
            format_filter_diagnostics(&report, filtered.len(), DIAGNOSTIC_SAMPLE_LIMIT);
        warn!("{}", message);
        return Ok(RunOutcome::NoMatches { message, samples });
    }
    info!("{} relay(s) after filtering", filtered.len());

    let timer = stats.start_stage("validate");
    let validation = validate_relays(&filtered);
    stats.end_stage(timer);
    summary.counts.valid = validation.valid_relays.len();
    summary.record_validation_issues(&validation.issues);
    for issue in &validation.issues {
        warn!("Dropping relay {}: {}", issue.relay.hostname(), issue.reason);
    }
    let relays = validation.valid_relays;
    if relays.is_empty() {
        let samples = summary
            .validation_issues
            .iter()
            .take(DIAGNOSTIC_SAMPLE_LIMIT)
            .map(|issue| format!("Invalid: {} ({})", issue.hostname, issue.reason))
            .collect();
        return Ok(RunOutcome::NoMatches {
            message: "Remaining 0 relays after validation".to_string(),
            samples,
        });
    }

    let enrichment = stats
        .measure(
            "enrich",
            enrich_relays(
                &relays,
                collaborators.checker.as_deref(),
                options.verify_sample_size,
            ),
        )
        .await?;
    summary.counts.enriched = enrichment.enriched_relays.len();
    summary.counts.verification_candidates = enrichment.verification_candidates.len();
    summary.checker_summary = enrichment.checker_summary.clone();

    if options.verification_requested() {
        let fallback;
        let summarizer: Option<&dyn EndpointSummarizer> = match (
            options.verify_summarizer,
            collaborators.summarizer.as_deref(),
        ) {
            (false, _) => None,
            (true, Some(summarizer)) => Some(summarizer),
            (true, None) => {
                fallback = MubengSummarizer::default();
                Some(&fallback as &dyn EndpointSummarizer)
            }
        };
        let endpoints: Vec<String> = enrichment
            .verification_candidates
            .iter()
            .map(|relay| relay.socks5_endpoint().to_string())
            .collect();

        let mut record = VerificationRecord::default();
        let verified = stats
            .measure(
                "verify",
                run_verification_stage(
                    &endpoints,
                    &options.targets,
                    &*collaborators.verifier,
                    summarizer,
                    &mut record,
                ),
            )
            .await;
        summary.verification = Some(record);
        verified?;
    }

    let timer = stats.start_stage("write");
    let written = write_artifacts(options, &relays, &enrichment.enriched_relays);
    stats.end_stage(timer);
    let artifacts = written.map_err(|e| {
        BuildError::with_cause(
            BuildErrorKind::Output,
            format!("Failed to write artifacts: {e:#}"),
            e,
        )
    })?;

    Ok(RunOutcome::Built {
        relay_count: relays.len(),
        artifacts,
    })
}

/// Payloads of successful sources, in fetch order.
///
/// Supplemental failures are logged and noted. The primary source is
/// required.
fn successful_payloads(
    results: Vec<SourceResult>,
    stats: &mut PipelineStats,
) -> Result<Vec<SourcePayload>, BuildError> {
    if results.iter().all(|result| !result.succeeded()) {
        let reasons = results
            .iter()
            .map(|result| match &result.error {
                Some(e) => format!("{}: {e}", result.name),
                None => result.name.clone(),
            })
            .collect::<Vec<_>>()
            .join("; ");
        return Err(BuildError::new(
            BuildErrorKind::NoSources,
            format!("No relay sources succeeded ({reasons})"),
        ));
    }

    let mut payloads = Vec::with_capacity(results.len());
    for (index, result) in results.into_iter().enumerate() {
        match (result.payload, result.error) {
            (Some(payload), _) => payloads.push(SourcePayload::new(result.name, payload)),
            (None, Some(e)) if index == 0 => {
                return Err(BuildError::with_cause(BuildErrorKind::Fetch, e.to_string(), e));
            }
            (None, error) => {
                let reason = error.map_or_else(|| "no payload".to_string(), |e| format!("{e:#}"));
                warn!("Supplemental source {} failed: {}", result.name, reason);
                stats.add_note(format!("Source '{}' skipped: {reason}", result.name));
            }
        }
    }
    Ok(payloads)
}

/// Normalizes each payload. A malformed primary payload is fatal; a
/// malformed supplemental payload is dropped with a note.
fn normalize_sources(
    payloads: &[SourcePayload],
    stats: &mut PipelineStats,
) -> Result<Vec<Relay>, BuildError> {
    let mut relays = Vec::new();
    for (index, payload) in payloads.iter().enumerate() {
        match normalize_payload(payload) {
            Ok(normalized) => relays.extend(normalized),
            Err(e) if index == 0 => return Err(e),
            Err(e) => {
                warn!("{}", e);
                stats.add_note(format!("Source '{}' dropped: {}", payload.name, e.message()));
            }
        }
    }
    Ok(relays)
}

fn write_artifacts(
    options: &PipelineOptions,
    relays: &[Relay],
    enriched: &[EnrichedRelay],
) -> anyhow::Result<Artifacts> {
    std::fs::create_dir_all(&options.output_dir)
        .with_context(|| format!("Failed to create {}", options.output_dir.display()))?;
    let artifacts = Artifacts::in_dir(&options.output_dir, options.emit_canonical_json);

    info!("Writing JSON to {}", artifacts.json.display());
    write_json(enriched, &artifacts.json)?;
    info!("Writing text list to {}", artifacts.text.display());
    write_text(relays, &artifacts.text)?;
    info!("Writing PAC script to {}", artifacts.pac.display());
    write_pac(relays, &artifacts.pac)?;
    info!("Writing CSV to {}", artifacts.csv.display());
    let records: Vec<serde_json::Value> = enriched
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<_, _>>()?;
    write_csv(&records, &artifacts.csv)?;
    if let Some(path) = &artifacts.canonical_json {
        info!("Writing canonical JSON to {}", path.display());
        write_canonical_json(relays, path)?;
    }
    Ok(artifacts)
}

fn persist_summary(summary: &RunSummary, options: &PipelineOptions) {
    match summary.write(&options.output_dir) {
        Ok(path) => info!("Run summary written to {}", path.display()),
        Err(e) => warn!("Failed to write run summary: {:#}", e),
    }
    if let Some(run_log) = &options.run_log {
        if let Err(e) = summary.append_to_log(run_log) {
            warn!("Failed to append run log {}: {:#}", run_log.display(), e);
        }
    }
}
