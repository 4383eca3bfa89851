//! Analysis of an ordered collection of sessions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use fipstat_core::regression::fit_linear_with_alpha;
use fipstat_core::{RegressionResult, StatError};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::session::{analyze_session, SessionReport};
use crate::config::AnalysisConfig;
use crate::diagnostics::{AnalysisStage, AnalysisWarning, WarningLog};
use crate::session::Session;

/// Conditions that stop a batch before any session is analysed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BatchError {
    /// No sessions were supplied.
    #[error("no sessions to analyse")]
    EmptyCollection,

    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result of one session within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionOutcome {
    /// The session was analysed.
    Analyzed(Box<SessionReport>),
    /// The session was left out.
    Skipped {
        /// Session index.
        index: usize,
        /// Why it was left out.
        reason: StatError,
    },
}

impl SessionOutcome {
    /// Session index.
    pub fn index(&self) -> usize {
        match self {
            SessionOutcome::Analyzed(report) => report.index,
            SessionOutcome::Skipped { index, .. } => *index,
        }
    }

    /// The report, if the session was analysed.
    pub fn report(&self) -> Option<&SessionReport> {
        match self {
            SessionOutcome::Analyzed(report) => Some(report.as_ref()),
            SessionOutcome::Skipped { .. } => None,
        }
    }
}

/// Mean CS peak of one contrast regressed on session index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionTrend {
    /// Contrast tracked.
    pub contrast: u32,
    /// Session indices of the fitted points.
    pub sessions: Vec<usize>,
    /// Mean CS peak of each fitted session.
    #[serde(with = "fipstat_core::nonfinite::vec")]
    pub mean_peaks: Vec<f64>,
    /// Fit of mean peak against session index.
    pub fit: RegressionResult,
}

/// Results of a batch, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// One outcome per input session.
    pub outcomes: Vec<SessionOutcome>,
    /// Cross-session trend, when enough sessions support it.
    pub session_trend: Option<SessionTrend>,
    /// Batch-level warnings (skipped sessions, trend problems).
    pub warnings: Vec<AnalysisWarning>,
}

impl BatchReport {
    /// Reports of the analysed sessions.
    pub fn reports(&self) -> impl Iterator<Item = &SessionReport> + '_ {
        self.outcomes.iter().filter_map(SessionOutcome::report)
    }

    /// Number of analysed sessions.
    pub fn analyzed_count(&self) -> usize {
        self.reports().count()
    }

    /// Number of skipped sessions.
    pub fn skipped_count(&self) -> usize {
        self.outcomes.len() - self.analyzed_count()
    }

    /// Batch warnings followed by every session's warnings.
    pub fn all_warnings(&self) -> impl Iterator<Item = &AnalysisWarning> + '_ {
        self.warnings
            .iter()
            .chain(self.reports().flat_map(|r| r.warnings.iter()))
    }
}

fn analyze_one(session: &Session, config: &AnalysisConfig) -> SessionOutcome {
    let span = tracing::info_span!("session", index = session.index);
    let _enter = span.enter();

    match analyze_session(session, config) {
        Ok(report) => {
            tracing::debug!(
                contrasts = report.contrasts.len(),
                warnings = report.warnings.len(),
                "session analysed"
            );
            SessionOutcome::Analyzed(Box::new(report))
        }
        Err(reason) => {
            tracing::debug!(
                recoverable = reason.is_recoverable(),
                %reason,
                "session failed, skipping"
            );
            SessionOutcome::Skipped {
                index: session.index,
                reason,
            }
        }
    }
}

/// Analyse every session independently.
///
/// A failing session becomes [`SessionOutcome::Skipped`] and never stops the
/// batch. With the `parallel` feature sessions run on the rayon pool; the
/// outcome order always matches the input order.
///
/// # Errors
///
/// - [`BatchError::EmptyCollection`] for an empty slice
/// - [`BatchError::Config`] if `config` fails validation
pub fn analyze_sessions(sessions: &[Session], config: &AnalysisConfig) -> Result<BatchReport, BatchError> {
    if sessions.is_empty() {
        return Err(BatchError::EmptyCollection);
    }
    config.validate().map_err(BatchError::Config)?;

    #[cfg(feature = "parallel")]
    let outcomes: Vec<SessionOutcome> = sessions
        .par_iter()
        .map(|session| analyze_one(session, config))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<SessionOutcome> = sessions
        .iter()
        .map(|session| analyze_one(session, config))
        .collect();

    let mut log = WarningLog::new();
    for outcome in &outcomes {
        if let SessionOutcome::Skipped { index, reason } = outcome {
            log.push(AnalysisWarning::SessionSkipped {
                session: *index,
                reason: reason.clone(),
            });
        }
    }

    let reports: Vec<&SessionReport> = outcomes.iter().filter_map(SessionOutcome::report).collect();
    let session_trend = fit_session_trend(&reports, config, &mut log)
        .map_err(|e| log.stage_skipped(None, AnalysisStage::SessionTrend, e))
        .ok();

    tracing::debug!(
        sessions = outcomes.len(),
        analysed = reports.len(),
        "batch complete"
    );

    Ok(BatchReport {
        outcomes,
        session_trend,
        warnings: log.into_vec(),
    })
}

/// Highest contrast with a CS peak summary in every report.
fn common_contrast(reports: &[&SessionReport]) -> Option<u32> {
    let first = reports.first()?;
    first
        .contrasts
        .iter()
        .rev()
        .filter(|c| c.cs_peak.is_some())
        .map(|c| c.contrast)
        .find(|&contrast| {
            reports
                .iter()
                .all(|r| r.contrast(contrast).is_some_and(|c| c.cs_peak.is_some()))
        })
}

/// Regress the mean CS peak of one contrast on session index.
///
/// Sessions without a CS peak at the tracked contrast are left out, each
/// with a `ContrastSkipped` warning.
fn fit_session_trend(
    reports: &[&SessionReport],
    config: &AnalysisConfig,
    log: &mut WarningLog,
) -> Result<SessionTrend, StatError> {
    let contrast = config
        .trend_contrast
        .or_else(|| common_contrast(reports))
        .ok_or_else(|| StatError::missing("contrast with a CS peak in every session"))?;

    let mut sessions = Vec::with_capacity(reports.len());
    let mut mean_peaks = Vec::with_capacity(reports.len());
    for report in reports {
        match report.contrast(contrast).and_then(|c| c.cs_peak) {
            Some(peak) => {
                sessions.push(report.index);
                mean_peaks.push(peak.value.mean);
            }
            None => log.contrast_skipped(
                report.index,
                contrast,
                AnalysisStage::SessionTrend,
                StatError::missing(format!("CS peak at {}% contrast", contrast)),
            ),
        }
    }

    let x: Vec<f64> = sessions.iter().map(|&s| s as f64).collect();
    let fit = fit_linear_with_alpha(&x, &mean_peaks, config.alpha)?;

    Ok(SessionTrend {
        contrast,
        sessions,
        mean_peaks,
        fit,
    })
}
