//! Per-tick diagnostics: timing and outcome of every stage.
//!
//! Every [`Manager::run`](crate::Manager::run) leaves its stages holding
//! the outcome of that tick; [`Manager::diagnostics`](crate::Manager::diagnostics)
//! snapshots them into a serializable [`TickDiagnostics`]. Hosts collect
//! one per tick and fold them with [`summarize`] for multi-tick reports.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::Roi;

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Outcome of a stage's most recent tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageStatus {
    /// The stage has never run.
    Pending,
    /// The body produced an output frame.
    Ok,
    /// The body failed or produced no frame.
    Failed {
        /// Rendered error.
        message: String,
    },
    /// An upstream stage failed so the body was not run.
    Skipped,
}

impl StageStatus {
    /// Short label for tables.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Ok => "ok",
            Self::Failed { .. } => "FAILED",
            Self::Skipped => "skipped",
        }
    }
}

/// Snapshot of one stage after a tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Stage name.
    pub name: String,
    /// Wall-clock duration of the body (seconds; zero when skipped).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Outcome.
    #[serde(flatten)]
    pub status: StageStatus,
    /// Output frame size, when a frame was produced.
    pub output_size: Option<(u32, u32)>,
    /// One-line summary of the output payload.
    pub data: String,
    /// `(name, formatted value)` for every parameter in declaration order.
    pub params: Vec<(String, String)>,
}

/// Diagnostics for a single pipeline tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickDiagnostics {
    /// Zero-based tick counter of the manager.
    pub tick: u64,
    /// Active region of interest.
    pub roi: Option<Roi>,
    /// Per-stage snapshots in pipeline order.
    pub stages: Vec<StageDiagnostics>,
    /// Sum of stage durations (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
}

impl TickDiagnostics {
    /// Number of stages whose body failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.stages
            .iter()
            .filter(|s| matches!(s.status, StageStatus::Failed { .. }))
            .count()
    }

    /// Number of stages bypassed by fault isolation.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.stages
            .iter()
            .filter(|s| s.status == StageStatus::Skipped)
            .count()
    }

    /// Returns `true` if every stage ran successfully.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.stages.iter().all(|s| s.status == StageStatus::Ok)
    }

    /// Human-readable table of this tick.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Tick {} Diagnostics\n{}", self.tick, "=".repeat(60)));
        if let Some(roi) = self.roi {
            lines.push(format!("ROI: {roi}"));
        }
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for stage in &self.stages {
            let ms = duration_ms(stage.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "{:<24} {ms:>8.3}ms {pct:>9.1}%  {}",
                stage.name,
                format_details(stage)
            ));
        }

        lines.push(String::new());
        lines.push(format!(
            "Stages: {}  |  Failed: {}  |  Skipped: {}",
            self.stages.len(),
            self.failed_count(),
            self.skipped_count(),
        ));

        lines.join("\n")
    }
}

/// Format a stage's outcome and outputs into a compact detail string.
fn format_details(stage: &StageDiagnostics) -> String {
    match &stage.status {
        StageStatus::Failed { message } => format!("FAILED: {message}"),
        StageStatus::Ok => {
            let size = stage
                .output_size
                .map_or_else(String::new, |(w, h)| format!("{w}x{h}"));
            if stage.data == "empty" {
                size
            } else {
                format!("{size} [{}]", stage.data)
            }
        }
        status => status.label().to_string(),
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Per-stage aggregate over many ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSummary {
    /// Stage name.
    pub name: String,
    /// Ticks in which the body ran (successfully or not).
    pub runs: usize,
    /// Ticks in which the body failed.
    pub failures: usize,
    /// Ticks in which the stage was skipped.
    pub skips: usize,
    /// Fastest run (seconds).
    #[serde(with = "duration_serde")]
    pub min: Duration,
    /// Mean run (seconds).
    #[serde(with = "duration_serde")]
    pub mean: Duration,
    /// Slowest run (seconds).
    #[serde(with = "duration_serde")]
    pub max: Duration,
}

/// Aggregate of a sequence of ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsSummary {
    /// Number of ticks folded in.
    pub ticks: usize,
    /// Per-stage aggregates in first-seen order.
    pub stages: Vec<StageSummary>,
    /// Mean total tick duration (seconds).
    #[serde(with = "duration_serde")]
    pub mean_total: Duration,
}

impl DiagnosticsSummary {
    /// Human-readable min/mean/max table.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!(
            "Summary over {} ticks\n{}",
            self.ticks,
            "=".repeat(60)
        ));
        lines.push(format!(
            "Mean tick duration: {:.3}ms",
            duration_ms(self.mean_total)
        ));
        lines.push(String::new());
        lines.push(format!(
            "{:<24} {:>10} {:>10} {:>10} {:>6} {:>6}",
            "Stage", "Min", "Mean", "Max", "Fail", "Skip"
        ));
        lines.push("-".repeat(72));
        for s in &self.stages {
            lines.push(format!(
                "{:<24} {:>8.3}ms {:>8.3}ms {:>8.3}ms {:>6} {:>6}",
                s.name,
                duration_ms(s.min),
                duration_ms(s.mean),
                duration_ms(s.max),
                s.failures,
                s.skips,
            ));
        }
        lines.join("\n")
    }
}

/// Fold per-tick diagnostics into min/mean/max per stage.
///
/// Skipped ticks do not contribute to timing. Stages are matched by name
/// so a summary survives stages being added between runs.
#[must_use]
pub fn summarize(ticks: &[TickDiagnostics]) -> DiagnosticsSummary {
    let mut stages: Vec<(StageSummary, Duration)> = Vec::new();

    for tick in ticks {
        for stage in &tick.stages {
            let index = match stages.iter().position(|(s, _)| s.name == stage.name) {
                Some(index) => index,
                None => {
                    stages.push((
                        StageSummary {
                            name: stage.name.clone(),
                            runs: 0,
                            failures: 0,
                            skips: 0,
                            min: Duration::MAX,
                            mean: Duration::ZERO,
                            max: Duration::ZERO,
                        },
                        Duration::ZERO,
                    ));
                    stages.len() - 1
                }
            };
            let (summary, total) = &mut stages[index];
            match stage.status {
                StageStatus::Pending => continue,
                StageStatus::Skipped => {
                    summary.skips += 1;
                    continue;
                }
                StageStatus::Failed { .. } => summary.failures += 1,
                StageStatus::Ok => {}
            }
            summary.runs += 1;
            summary.min = summary.min.min(stage.duration);
            summary.max = summary.max.max(stage.duration);
            *total += stage.duration;
        }
    }

    let stages = stages
        .into_iter()
        .map(|(mut summary, total)| {
            if summary.runs == 0 {
                summary.min = Duration::ZERO;
            } else {
                summary.mean = total / count_u32(summary.runs);
            }
            summary
        })
        .collect();

    let mean_total = if ticks.is_empty() {
        Duration::ZERO
    } else {
        ticks.iter().map(|t| t.total_duration).sum::<Duration>() / count_u32(ticks.len())
    };

    DiagnosticsSummary {
        ticks: ticks.len(),
        stages,
        mean_total,
    }
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
