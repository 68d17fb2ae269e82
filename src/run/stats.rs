//! Stage timing and SLA tracking for one pipeline run.

use std::future::Future;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Serialize;

use crate::source::SourceResult;

/// Time spent in one named stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageMeasurement {
    pub name: String,
    #[serde(rename = "duration_seconds", serialize_with = "as_seconds")]
    pub duration: Duration,
}

/// Outcome of one source fetch, as reported in the run summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    pub name: String,
    pub ok: bool,
    pub error: Option<String>,
    #[serde(rename = "duration_seconds", serialize_with = "as_seconds")]
    pub duration: Duration,
    pub attempts: usize,
    pub cache_bypassed: bool,
}

impl From<&SourceResult> for SourceSummary {
    fn from(result: &SourceResult) -> Self {
        Self {
            name: result.name.clone(),
            ok: result.succeeded(),
            error: result.error.as_ref().map(|e| format!("{e:#}")),
            duration: result.duration,
            attempts: result.attempts,
            cache_bypassed: result.cache_bypassed,
        }
    }
}

/// Open stage returned by [`PipelineStats::start_stage`].
#[derive(Debug)]
#[must_use = "a stage is only recorded once passed to `end_stage`"]
pub struct StageTimer {
    name: String,
    started: Instant,
}

/// Timing state of a run, owned by the orchestrator.
///
/// While the run is in progress, [`total_duration`](Self::total_duration) is
/// the sum of the recorded stages. Once [`finish`](Self::finish) has been
/// called it is the wall-clock time between start and finish instead.
#[derive(Debug, Clone)]
pub struct PipelineStats {
    sla_seconds: f64,
    started_at: DateTime<Utc>,
    started: Instant,
    finished_at: Option<DateTime<Utc>>,
    finished: Option<Instant>,
    stages: Vec<StageMeasurement>,
    /// Stage awaited by [`measure`](Self::measure) that has not returned yet.
    pending: Option<(String, Instant)>,
    sources: Vec<SourceSummary>,
    notes: Vec<String>,
}

impl PipelineStats {
    pub fn new(sla_seconds: f64) -> Self {
        Self {
            sla_seconds,
            started_at: Utc::now(),
            started: Instant::now(),
            finished_at: None,
            finished: None,
            stages: Vec::new(),
            pending: None,
            sources: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn start_stage(&self, name: &str) -> StageTimer {
        debug!("Stage {} started", name);
        StageTimer {
            name: name.to_string(),
            started: Instant::now(),
        }
    }

    pub fn end_stage(&mut self, timer: StageTimer) {
        let duration = timer.started.elapsed();
        debug!("Stage {} took {:.3}s", timer.name, duration.as_secs_f64());
        self.stages.push(StageMeasurement {
            name: timer.name,
            duration,
        });
    }

    /// Awaits `stage` inside a named measurement.
    ///
    /// The measurement is recorded whatever the stage returns, errors
    /// included.
    pub async fn measure<T>(&mut self, name: &str, stage: impl Future<Output = T>) -> T {
        let timer = self.start_stage(name);
        self.pending = Some((timer.name.clone(), timer.started));
        let output = stage.await;
        self.pending = None;
        self.end_stage(timer);
        output
    }

    /// Records the stage a cancelled [`measure`](Self::measure) was awaiting,
    /// if any, and returns its name.
    pub fn close_pending_stage(&mut self) -> Option<String> {
        let (name, started) = self.pending.take()?;
        self.end_stage(StageTimer {
            name: name.clone(),
            started,
        });
        Some(name)
    }

    pub fn record_source_results(&mut self, results: &[SourceResult]) {
        self.sources.extend(results.iter().map(SourceSummary::from));
    }

    pub fn add_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    /// Stamps the finish time and notes an SLA breach. Later calls keep the
    /// first finish time.
    pub fn finish(&mut self) {
        if self.finished.is_some() {
            return;
        }
        self.finished_at = Some(Utc::now());
        self.finished = Some(Instant::now());
        if self.sla_breached() {
            let note = format!(
                "SLA breached: run took {:.2}s (limit {:.2}s)",
                self.total_duration().as_secs_f64(),
                self.sla_seconds
            );
            warn!("{}", note);
            self.notes.push(note);
        }
    }

    pub fn total_duration(&self) -> Duration {
        match self.finished {
            Some(finished) => finished.duration_since(self.started),
            None => self.stages.iter().map(|stage| stage.duration).sum(),
        }
    }

    pub fn sla_breached(&self) -> bool {
        self.total_duration().as_secs_f64() > self.sla_seconds
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    pub fn sla_seconds(&self) -> f64 {
        self.sla_seconds
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Stages in execution order.
    pub fn stages(&self) -> &[StageMeasurement] {
        &self.stages
    }

    /// Sources in fetch order, primary first.
    pub fn sources(&self) -> &[SourceSummary] {
        &self.sources
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }
}

fn as_seconds<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stage_is_recorded_when_it_fails() {
        let mut stats = PipelineStats::new(60.0);
        let result: Result<(), &str> = stats.measure("fetch", async { Err("boom") }).await;
        assert!(result.is_err());
        assert_eq!(stats.stages().len(), 1);
        assert_eq!(stats.stages()[0].name, "fetch");
    }

    #[tokio::test]
    async fn test_cancelled_stage_can_be_closed() {
        let mut stats = PipelineStats::new(60.0);
        let cancelled = tokio::time::timeout(
            Duration::from_millis(20),
            stats.measure("fetch", std::future::pending::<()>()),
        )
        .await;
        assert!(cancelled.is_err());
        assert!(stats.stages().is_empty());

        assert_eq!(stats.close_pending_stage().as_deref(), Some("fetch"));
        assert_eq!(stats.stages()[0].name, "fetch");
        assert!(stats.stages()[0].duration >= Duration::from_millis(20));
        assert!(stats.close_pending_stage().is_none());
    }

    #[tokio::test]
    async fn test_stages_keep_execution_order() {
        let mut stats = PipelineStats::new(60.0);
        stats.measure("fetch", async {}).await;
        let timer = stats.start_stage("filter");
        stats.end_stage(timer);
        stats.measure("write", async {}).await;
        let names: Vec<_> = stats.stages().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["fetch", "filter", "write"]);
    }

    #[test]
    fn test_total_duration_sums_stages_while_running() {
        let mut stats = PipelineStats::new(60.0);
        stats.stages.push(StageMeasurement {
            name: "a".into(),
            duration: Duration::from_millis(300),
        });
        stats.stages.push(StageMeasurement {
            name: "b".into(),
            duration: Duration::from_millis(200),
        });
        assert_eq!(stats.total_duration(), Duration::from_millis(500));
        assert!(!stats.is_finished());
    }

    #[test]
    fn test_total_duration_is_wall_clock_after_finish() {
        let mut stats = PipelineStats::new(60.0);
        stats.stages.push(StageMeasurement {
            name: "recorded".into(),
            duration: Duration::from_secs(30),
        });
        stats.finish();
        assert!(stats.is_finished());
        assert!(stats.finished_at().is_some());
        assert!(stats.total_duration() < Duration::from_secs(30));
    }

    #[test]
    fn test_sla_breach_is_noted_not_fatal() {
        let mut stats = PipelineStats::new(0.5);
        stats.stages.push(StageMeasurement {
            name: "slow".into(),
            duration: Duration::from_secs(1),
        });
        assert!(stats.sla_breached());

        let mut stats = PipelineStats::new(-1.0);
        stats.finish();
        assert!(stats.sla_breached());
        assert!(stats.notes().iter().any(|note| note.starts_with("SLA breached")));

        let finished_at = stats.finished_at();
        stats.finish();
        assert_eq!(stats.finished_at(), finished_at);
        assert_eq!(stats.notes().len(), 1);
    }

    #[test]
    fn test_source_summary_from_result() {
        let result = SourceResult {
            name: "mirror".into(),
            payload: None,
            error: Some(anyhow::anyhow!("disk on fire")),
            duration: Duration::from_millis(20),
            attempts: 3,
            cache_bypassed: true,
        };
        let mut stats = PipelineStats::new(60.0);
        stats.record_source_results(std::slice::from_ref(&result));
        let summary = &stats.sources()[0];
        assert!(!summary.ok);
        assert_eq!(summary.error.as_deref(), Some("disk on fire"));
        assert_eq!(summary.attempts, 3);

        let value = serde_json::to_value(summary).unwrap();
        assert_eq!(value["duration_seconds"], serde_json::json!(0.02));
    }
}
