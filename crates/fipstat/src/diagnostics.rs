//! Recoverable problems met while analysing a session.
//!
//! Nothing here aborts an analysis. Each warning names the session it came
//! from and the stage that gave up, and is logged with `tracing::warn!` as it
//! is recorded so that a subscriber sees it inside the session span.

use serde::{Deserialize, Serialize};

use fipstat_core::StatError;

/// Analysis step a warning was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisStage {
    /// Mean/SEM traces of a contrast group.
    Aggregate,
    /// CS or US peak extraction.
    Peaks,
    /// CS/US ratio.
    Ratio,
    /// Above/below threshold split.
    ThresholdSplit,
    /// Early/late split by trial order.
    OrderSplit,
    /// Early/late split by event time.
    TimeSplit,
    /// CS peak vs contrast regression.
    ContrastRegression,
    /// Normal fit and histogram of CS peak times.
    PeakTimeFit,
    /// Mean CS peak vs session regression.
    SessionTrend,
}

impl std::fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AnalysisStage::Aggregate => "aggregate",
            AnalysisStage::Peaks => "peaks",
            AnalysisStage::Ratio => "CS/US ratio",
            AnalysisStage::ThresholdSplit => "threshold split",
            AnalysisStage::OrderSplit => "order split",
            AnalysisStage::TimeSplit => "time split",
            AnalysisStage::ContrastRegression => "contrast regression",
            AnalysisStage::PeakTimeFit => "peak time fit",
            AnalysisStage::SessionTrend => "session trend",
        };
        write!(f, "{}", name)
    }
}

/// Warning severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// A result is missing but the rest of the report is sound.
    Informational,
    /// A result is present but computed on substituted data.
    ResultUndermining,
}

/// A recoverable problem, tagged with its origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnalysisWarning {
    /// The session had no usable threshold and the policy default was used.
    ThresholdDefaulted {
        /// Session index.
        session: usize,
        /// Value found on the session, if any.
        found: Option<f64>,
        /// Default substituted.
        used: f64,
    },

    /// One stage failed for one contrast; the stage result is omitted.
    ContrastSkipped {
        /// Session index.
        session: usize,
        /// Contrast percent.
        contrast: u32,
        /// Stage that failed.
        stage: AnalysisStage,
        /// Underlying error.
        reason: StatError,
    },

    /// A session-wide stage failed; its result is omitted.
    StageSkipped {
        /// Session index, or `None` for cross-session stages.
        session: Option<usize>,
        /// Stage that failed.
        stage: AnalysisStage,
        /// Underlying error.
        reason: StatError,
    },

    /// Trials could not be aligned with event times and every trial was used
    /// for both the early and the late group.
    TemporalFallback {
        /// Session index.
        session: usize,
        /// Contrast percent.
        contrast: u32,
        /// Trial rows in the group.
        rows: usize,
        /// Event timestamps available.
        timestamps: usize,
    },

    /// The whole session was left out of a batch.
    SessionSkipped {
        /// Session index.
        session: usize,
        /// Underlying error.
        reason: StatError,
    },
}

impl AnalysisWarning {
    /// Session the warning belongs to, if any.
    pub fn session(&self) -> Option<usize> {
        match self {
            AnalysisWarning::ThresholdDefaulted { session, .. }
            | AnalysisWarning::ContrastSkipped { session, .. }
            | AnalysisWarning::TemporalFallback { session, .. }
            | AnalysisWarning::SessionSkipped { session, .. } => Some(*session),
            AnalysisWarning::StageSkipped { session, .. } => *session,
        }
    }

    /// Get the severity of this warning.
    pub fn severity(&self) -> Severity {
        match self {
            AnalysisWarning::ThresholdDefaulted { .. } | AnalysisWarning::TemporalFallback { .. } => {
                Severity::ResultUndermining
            }
            _ => Severity::Informational,
        }
    }

    /// Check if this warning undermines a reported result.
    pub fn is_result_undermining(&self) -> bool {
        self.severity() == Severity::ResultUndermining
    }

    /// Get a human-readable description of the warning.
    pub fn description(&self) -> String {
        match self {
            AnalysisWarning::ThresholdDefaulted {
                session,
                found: Some(found),
                used,
            } => format!(
                "Session {}: threshold {} is not a proportion; using {:.2} instead.",
                session, found, used
            ),
            AnalysisWarning::ThresholdDefaulted {
                session,
                found: None,
                used,
            } => format!(
                "Session {}: no psychometric threshold; using {:.2}.",
                session, used
            ),
            AnalysisWarning::ContrastSkipped {
                session,
                contrast,
                stage,
                reason,
            } => format!(
                "Session {}, contrast {}%: {} skipped ({}).",
                session, contrast, stage, reason
            ),
            AnalysisWarning::StageSkipped {
                session: Some(session),
                stage,
                reason,
            } => format!("Session {}: {} skipped ({}).", session, stage, reason),
            AnalysisWarning::StageSkipped {
                session: None,
                stage,
                reason,
            } => format!("{} skipped ({}).", stage, reason),
            AnalysisWarning::TemporalFallback {
                session,
                contrast,
                rows,
                timestamps,
            } => format!(
                "Session {}, contrast {}%: {} trials but {} event times; early and late \
                 groups both use every trial, so the comparison is not temporal.",
                session, contrast, rows, timestamps
            ),
            AnalysisWarning::SessionSkipped { session, reason } => {
                format!("Session {} skipped ({}).", session, reason)
            }
        }
    }
}

/// Ordered warning sink that logs as it records.
#[derive(Debug, Clone, Default)]
pub(crate) struct WarningLog {
    items: Vec<AnalysisWarning>,
}

impl WarningLog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, warning: AnalysisWarning) {
        tracing::warn!(
            session = warning.session(),
            undermining = warning.is_result_undermining(),
            "{}",
            warning.description()
        );
        self.items.push(warning);
    }

    pub(crate) fn contrast_skipped(
        &mut self,
        session: usize,
        contrast: u32,
        stage: AnalysisStage,
        reason: StatError,
    ) {
        self.push(AnalysisWarning::ContrastSkipped {
            session,
            contrast,
            stage,
            reason,
        });
    }

    pub(crate) fn stage_skipped(&mut self, session: Option<usize>, stage: AnalysisStage, reason: StatError) {
        self.push(AnalysisWarning::StageSkipped {
            session,
            stage,
            reason,
        });
    }

    pub(crate) fn into_vec(self) -> Vec<AnalysisWarning> {
        self.items
    }
}
