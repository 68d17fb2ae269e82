//! Run summary written at the end of every pipeline run.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use strum_macros::{AsRefStr, Display};

use crate::config::SUMMARY_ARTIFACT;
use crate::enrich::JsonMap;
use crate::error_handling::{BuildError, BuildErrorKind};
use crate::export::write_pretty;
use crate::filter::{ExclusionSample, FilterCategory, FilterReport};
use crate::validation::ValidationIssue;
use crate::verify::VerificationRecord;

use super::stats::{PipelineStats, SourceSummary, StageMeasurement};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Running,
    Success,
    NoMatches,
    Error,
    Interrupted,
}

/// Relay counts after each stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunCounts {
    pub normalized: usize,
    pub filtered: usize,
    pub valid: usize,
    pub validation_issues: usize,
    pub enriched: usize,
    pub verification_candidates: usize,
}

/// A validation rejection, by hostname.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueSummary {
    pub hostname: String,
    pub reason: String,
}

impl From<&ValidationIssue> for IssueSummary {
    fn from(issue: &ValidationIssue) -> Self {
        Self {
            hostname: issue.relay.hostname().to_string(),
            reason: issue.reason.clone(),
        }
    }
}

/// A filter rejection, by hostname.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExclusionSummary {
    pub reason: FilterCategory,
    pub hostname: String,
}

impl From<&ExclusionSample> for ExclusionSummary {
    fn from(sample: &ExclusionSample) -> Self {
        Self {
            reason: sample.reason,
            hostname: sample.relay.hostname().to_string(),
        }
    }
}

/// Everything the run did, including partial progress of failed runs.
///
/// Stages fill in their section as they complete; timing fields are copied
/// from [`PipelineStats`] by [`RunSummary::finalize`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub status: RunStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_seconds: f64,
    pub sla_seconds: f64,
    pub sla_breached: bool,
    pub stages: Vec<StageMeasurement>,
    pub sources: Vec<SourceSummary>,
    pub notes: Vec<String>,
    pub counts: RunCounts,
    pub unmatched_filters: Vec<String>,
    pub excluded_samples: Vec<ExclusionSummary>,
    pub validation_issues: Vec<IssueSummary>,
    pub checker_summary: Option<JsonMap>,
    pub verification: Option<VerificationRecord>,
    pub artifacts: Vec<PathBuf>,
    pub error_kind: Option<String>,
    pub error: Option<String>,
}

impl RunSummary {
    pub fn record_filter_report(&mut self, report: &FilterReport) {
        self.unmatched_filters = report.unmatched_filters.clone();
        self.excluded_samples = report
            .excluded_samples
            .iter()
            .map(ExclusionSummary::from)
            .collect();
    }

    pub fn record_validation_issues(&mut self, issues: &[ValidationIssue]) {
        self.counts.validation_issues = issues.len();
        self.validation_issues = issues.iter().map(IssueSummary::from).collect();
    }

    pub fn record_error(&mut self, error: &BuildError) {
        self.status = match error.kind() {
            BuildErrorKind::Interrupted => RunStatus::Interrupted,
            _ => RunStatus::Error,
        };
        self.error_kind = Some(error.kind().to_string());
        self.error = Some(error.message().to_string());
    }

    /// Finishes `stats` and copies its timing, sources and notes.
    pub fn finalize(&mut self, stats: &mut PipelineStats) {
        stats.finish();
        self.started_at = Some(stats.started_at());
        self.finished_at = stats.finished_at();
        self.duration_seconds = stats.total_duration().as_secs_f64();
        self.sla_seconds = stats.sla_seconds();
        self.sla_breached = stats.sla_breached();
        self.stages = stats.stages().to_vec();
        self.sources = stats.sources().to_vec();
        self.notes = stats.notes().to_vec();
    }

    /// Writes `pipeline_summary.json` into `output_dir`.
    pub fn write(&self, output_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;
        let path = output_dir.join(SUMMARY_ARTIFACT);
        write_pretty(self, &path)?;
        Ok(path)
    }

    /// Appends the summary as one JSON line to `path`.
    pub fn append_to_log(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let line = serde_json::to_string(self).context("Failed to serialize run summary")?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open run log {}", path.display()))?;
        writeln!(file, "{line}").with_context(|| format!("Failed to append to {}", path.display()))
    }
}
