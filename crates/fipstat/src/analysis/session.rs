//! Analysis of a single session.
//!
//! Every stage runs on its own: a failing contrast or stage is recorded as
//! an [`AnalysisWarning`] and its result left out, while the remaining
//! stages still run. Only problems that invalidate the whole session
//! (unusable configuration, inconsistent time grids, no trials of the
//! requested category, a refused threshold) are returned as errors.

use serde::{Deserialize, Serialize};

use fipstat_core::aggregate::{aggregate, cs_us_ratio, summarize_peaks, summarize_ratios};
use fipstat_core::regression::{fit_linear_with_alpha, fit_normal, histogram, uniform_edges};
use fipstat_core::split::{
    match_rows_to_timestamps, split_by_median_time, split_by_order, split_by_threshold,
    MedianSplit,
};
use fipstat_core::window::{peaks_in_window, window_indices};
use fipstat_core::{
    AggregateStat, ContrastKey, ContrastTrialGroup, Histogram, MeanSem, NormalFit, PeakRecord,
    PeakSummary, RatioSet, RatioSummary, RegressionResult, StatError, TrialCategory, TrialMatrix,
    WindowKind,
};

use crate::config::{AnalysisConfig, ResolvedThreshold};
use crate::diagnostics::{AnalysisStage, AnalysisWarning, WarningLog};
use crate::session::Session;

/// Per-contrast results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContrastSummary {
    /// Contrast percent.
    pub contrast: u32,
    /// Contrast proportion.
    pub proportion: f64,
    /// Trials in the group.
    pub n_trials: usize,
    /// Mean/SEM traces.
    pub trace: Option<AggregateStat>,
    /// CS-window peak summary.
    pub cs_peak: Option<PeakSummary>,
    /// US-window peak summary.
    pub us_peak: Option<PeakSummary>,
    /// Per-trial CS/US ratios, NaN where undefined.
    pub ratios: Option<RatioSet>,
    /// Summary of the finite ratios.
    pub ratio: Option<RatioSummary>,
    /// Reaction times at this contrast (hit trials only).
    pub reaction_time: Option<MeanSem>,
}

/// Traces and peaks of a derived trial group (a split side).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// Trials in the group.
    pub n_trials: usize,
    /// Mean/SEM traces.
    pub trace: AggregateStat,
    /// CS-window peak summary, if any peak was finite.
    pub cs_peak: Option<PeakSummary>,
    /// US-window peak summary, if any peak was finite.
    pub us_peak: Option<PeakSummary>,
}

/// Above/below threshold aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSummary {
    /// Threshold used.
    pub threshold: f64,
    /// Contrasts pooled above the threshold.
    pub above_contrasts: Vec<u32>,
    /// Contrasts pooled at or below the threshold.
    pub below_contrasts: Vec<u32>,
    /// Above-threshold group, absent when no contrast lies above.
    pub above: Option<GroupSummary>,
    /// Below-threshold group, absent when no contrast lies below.
    pub below: Option<GroupSummary>,
}

/// Early and late halves of one contrast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyLate {
    /// Early trials.
    pub early: GroupSummary,
    /// Late trials.
    pub late: GroupSummary,
}

/// Early/late comparison by event time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedEarlyLate {
    /// Session median event time.
    pub median_time: f64,
    /// Every trial was used on both sides.
    pub fallback_used: bool,
    /// Early and late groups.
    pub groups: EarlyLate,
}

/// Early/late results of one contrast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyLateSummary {
    /// Contrast percent.
    pub contrast: u32,
    /// Split by trial order.
    pub by_order: Option<EarlyLate>,
    /// Split by event time around the session median.
    pub by_time: Option<TimedEarlyLate>,
}

/// Everything computed for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Session index.
    pub index: usize,
    /// Recording date.
    pub date: String,
    /// Category analysed.
    pub category: TrialCategory,
    /// Threshold used for the above/below split.
    pub threshold: ResolvedThreshold,
    /// Sampling times shared by all traces.
    pub time: Vec<f64>,
    /// One entry per analysable contrast, ascending.
    pub contrasts: Vec<ContrastSummary>,
    /// Above/below threshold aggregates.
    pub threshold_split: Option<ThresholdSummary>,
    /// Early/late results per contrast.
    pub early_late: Vec<EarlyLateSummary>,
    /// Per-trial CS peak against contrast proportion.
    pub contrast_regression: Option<RegressionResult>,
    /// Normal fit of CS peak times.
    pub peak_time_fit: Option<NormalFit>,
    /// Histogram of CS peak times over the CS window.
    pub peak_time_histogram: Option<Histogram>,
    /// Recoverable problems, in the order they were met.
    pub warnings: Vec<AnalysisWarning>,
}

impl SessionReport {
    /// Summary of one contrast, if it was analysed.
    pub fn contrast(&self, contrast: u32) -> Option<&ContrastSummary> {
        self.contrasts.iter().find(|c| c.contrast == contrast)
    }

    /// Whether any warning undermines a reported result.
    pub fn has_undermining_warnings(&self) -> bool {
        self.warnings.iter().any(|w| w.is_result_undermining())
    }
}

/// CS peaks of one contrast, kept for the session-wide fits.
struct ContrastPeaks {
    proportion: f64,
    peaks: Vec<PeakRecord>,
}

/// Analyse one session.
///
/// # Errors
///
/// - [`StatError::InvalidInput`] if `config` fails validation
/// - [`StatError::InvalidThreshold`] if the threshold is refused by
///   [`crate::ThresholdPolicy::Require`]
/// - [`StatError::MissingField`] if the session has no usable group of the
///   configured category
/// - [`StatError::TimeGridMismatch`] / [`StatError::InvalidInput`] if groups
///   disagree on the sampling grid
/// - [`StatError::EmptyWindow`] if the CS or US window holds no sample
pub fn analyze_session(session: &Session, config: &AnalysisConfig) -> Result<SessionReport, StatError> {
    config.validate().map_err(StatError::InvalidInput)?;
    session.validate()?;

    let mut log = WarningLog::new();
    let threshold = config.threshold_policy.resolve(session.threshold)?;
    if threshold.defaulted {
        log.push(AnalysisWarning::ThresholdDefaulted {
            session: session.index,
            found: session.threshold,
            used: threshold.value,
        });
    }

    let category = config.category;
    let groups: Vec<&ContrastTrialGroup> = session.groups_in(category).collect();
    if groups.is_empty() {
        return Err(StatError::missing(format!(
            "{} trials in session {}",
            category, session.index
        )));
    }
    let time = session
        .time_grid()
        .ok_or_else(|| StatError::missing(format!("time vector in session {}", session.index)))?
        .to_vec();
    window_indices(&time, &config.cs_window)?;
    window_indices(&time, &config.us_window)?;

    tracing::debug!(
        session = session.index,
        contrasts = groups.len(),
        threshold = threshold.value,
        "analysing session"
    );

    let mut contrasts = Vec::with_capacity(groups.len());
    let mut cs_peaks = Vec::with_capacity(groups.len());
    for group in &groups {
        if let Err(e) = group.check() {
            log.contrast_skipped(session.index, group.contrast, AnalysisStage::Aggregate, e);
            continue;
        }
        let (summary, peaks) = summarize_contrast(session, group, config, &mut log);
        contrasts.push(summary);
        if let Some(peaks) = peaks {
            cs_peaks.push(ContrastPeaks {
                proportion: group.proportion(),
                peaks,
            });
        }
    }

    let threshold_split = summarize_threshold_split(session, &groups, threshold.value, config, &mut log);
    let early_late = summarize_early_late(session, &groups, config, &mut log);

    let contrast_regression = fit_contrast_response(&cs_peaks, config.alpha)
        .map_err(|e| log.stage_skipped(Some(session.index), AnalysisStage::ContrastRegression, e))
        .ok();

    let peak_times: Vec<f64> = cs_peaks
        .iter()
        .flat_map(|c| c.peaks.iter())
        .filter(|p| p.value.is_finite())
        .map(|p| p.time)
        .collect();
    let peak_time_fit = fit_normal(&peak_times)
        .map_err(|e| log.stage_skipped(Some(session.index), AnalysisStage::PeakTimeFit, e))
        .ok();
    let edges = uniform_edges(config.cs_window.start, config.cs_window.end, config.peak_time_bins);
    let peak_time_histogram = histogram(&peak_times, &edges)
        .map_err(|e| log.stage_skipped(Some(session.index), AnalysisStage::PeakTimeFit, e))
        .ok();

    Ok(SessionReport {
        index: session.index,
        date: session.date.clone(),
        category,
        threshold,
        time,
        contrasts,
        threshold_split,
        early_late,
        contrast_regression,
        peak_time_fit,
        peak_time_histogram,
        warnings: log.into_vec(),
    })
}

/// Per-contrast traces, peaks and ratios. Also returns the CS peaks for the
/// session-wide fits.
fn summarize_contrast(
    session: &Session,
    group: &ContrastTrialGroup,
    config: &AnalysisConfig,
    log: &mut WarningLog,
) -> (ContrastSummary, Option<Vec<PeakRecord>>) {
    let index = session.index;
    let contrast = group.contrast;

    let trace = aggregate(&group.trials, config.smoothing_window)
        .map_err(|e| log.contrast_skipped(index, contrast, AnalysisStage::Aggregate, e))
        .ok();

    let cs = peaks_in_window(&group.trials, &group.time, &config.cs_window, WindowKind::Cs)
        .map_err(|e| log.contrast_skipped(index, contrast, AnalysisStage::Peaks, e))
        .ok();
    let us = peaks_in_window(&group.trials, &group.time, &config.us_window, WindowKind::Us)
        .map_err(|e| log.contrast_skipped(index, contrast, AnalysisStage::Peaks, e))
        .ok();
    let cs_peak = cs.as_deref().and_then(|p| {
        summarize_peaks(p)
            .map_err(|e| log.contrast_skipped(index, contrast, AnalysisStage::Peaks, e))
            .ok()
    });
    let us_peak = us.as_deref().and_then(|p| {
        summarize_peaks(p)
            .map_err(|e| log.contrast_skipped(index, contrast, AnalysisStage::Peaks, e))
            .ok()
    });

    let ratios = cs_us_ratio(&group.trials, &group.time, &config.cs_window, &config.us_window)
        .map_err(|e| log.contrast_skipped(index, contrast, AnalysisStage::Ratio, e))
        .ok();
    let ratio = ratios.as_ref().and_then(|r| {
        summarize_ratios(r)
            .map_err(|e| log.contrast_skipped(index, contrast, AnalysisStage::Ratio, e))
            .ok()
    });

    let reaction_time = match config.category {
        TrialCategory::Hit => session.behavior.reaction_times(contrast).and_then(MeanSem::of),
        TrialCategory::Miss => None,
    };

    let summary = ContrastSummary {
        contrast,
        proportion: group.proportion(),
        n_trials: group.trial_count(),
        trace,
        cs_peak,
        us_peak,
        ratios,
        ratio,
        reaction_time,
    };
    (summary, cs)
}

/// Session, contrast and stage a derived group belongs to.
#[derive(Debug, Clone, Copy)]
struct GroupOrigin {
    session: usize,
    /// `None` for groups pooled across contrasts.
    contrast: Option<u32>,
    stage: AnalysisStage,
}

impl GroupOrigin {
    fn skipped(&self, log: &mut WarningLog, reason: StatError) {
        match self.contrast {
            Some(contrast) => log.contrast_skipped(self.session, contrast, self.stage, reason),
            None => log.stage_skipped(Some(self.session), self.stage, reason),
        }
    }
}

/// Traces and peak summaries of a derived group.
///
/// A window without any finite peak leaves that summary out and records a
/// warning against `origin`.
fn summarize_group(
    trials: &TrialMatrix,
    time: &[f64],
    config: &AnalysisConfig,
    origin: GroupOrigin,
    log: &mut WarningLog,
) -> Result<GroupSummary, StatError> {
    let trace = aggregate(trials, config.smoothing_window)?;
    let cs = peaks_in_window(trials, time, &config.cs_window, WindowKind::Cs)?;
    let us = peaks_in_window(trials, time, &config.us_window, WindowKind::Us)?;

    let mut peak_summary = |peaks: &[PeakRecord]| {
        summarize_peaks(peaks)
            .map_err(|e| origin.skipped(log, e))
            .ok()
    };
    let cs_peak = peak_summary(cs.as_slice());
    let us_peak = peak_summary(us.as_slice());

    Ok(GroupSummary {
        n_trials: trials.nrows(),
        trace,
        cs_peak,
        us_peak,
    })
}

fn summarize_threshold_split(
    session: &Session,
    groups: &[&ContrastTrialGroup],
    threshold: f64,
    config: &AnalysisConfig,
    log: &mut WarningLog,
) -> Option<ThresholdSummary> {
    let index = session.index;
    let split = split_by_threshold(groups.iter().copied(), threshold)
        .map_err(|e| log.stage_skipped(Some(index), AnalysisStage::ThresholdSplit, e))
        .ok()?;

    for skipped in &split.skipped {
        log.contrast_skipped(
            index,
            skipped.contrast,
            AnalysisStage::ThresholdSplit,
            skipped.reason.clone(),
        );
    }

    let time = groups
        .iter()
        .find(|g| g.check().is_ok())
        .map(|g| g.time.as_slice())?;

    let origin = GroupOrigin {
        session: index,
        contrast: None,
        stage: AnalysisStage::ThresholdSplit,
    };
    let mut side = |trials: &TrialMatrix| -> Option<GroupSummary> {
        if trials.nrows() == 0 {
            return None;
        }
        summarize_group(trials, time, config, origin, log)
            .map_err(|e| origin.skipped(log, e))
            .ok()
    };
    let above = side(&split.above);
    let below = side(&split.below);

    Some(ThresholdSummary {
        threshold: split.threshold,
        above_contrasts: split.above_contrasts,
        below_contrasts: split.below_contrasts,
        above,
        below,
    })
}

fn summarize_early_late(
    session: &Session,
    groups: &[&ContrastTrialGroup],
    config: &AnalysisConfig,
    log: &mut WarningLog,
) -> Vec<EarlyLateSummary> {
    let index = session.index;

    let median = if session.behavior.is_empty() {
        tracing::debug!(session = index, "no event times, skipping time split");
        None
    } else {
        split_by_median_time(&session.behavior.pooled_event_times())
            .map_err(|e| log.stage_skipped(Some(index), AnalysisStage::TimeSplit, e))
            .ok()
    };

    let mut out = Vec::new();
    for group in groups.iter().filter(|g| g.check().is_ok()) {
        let origin = GroupOrigin {
            session: index,
            contrast: Some(group.contrast),
            stage: AnalysisStage::OrderSplit,
        };
        let by_order = split_by_order(&group.trials)
            .and_then(|split| {
                Ok(EarlyLate {
                    early: summarize_group(&split.early, &group.time, config, origin, log)?,
                    late: summarize_group(&split.late, &group.time, config, origin, log)?,
                })
            })
            .map_err(|e| origin.skipped(log, e))
            .ok();

        let by_time = median
            .as_ref()
            .and_then(|m| split_group_by_time(session, group, m, config, log));

        if by_order.is_some() || by_time.is_some() {
            out.push(EarlyLateSummary {
                contrast: group.contrast,
                by_order,
                by_time,
            });
        }
    }
    out
}

fn split_group_by_time(
    session: &Session,
    group: &ContrastTrialGroup,
    median: &MedianSplit,
    config: &AnalysisConfig,
    log: &mut WarningLog,
) -> Option<TimedEarlyLate> {
    let index = session.index;
    let key = ContrastKey::new(config.category, group.contrast);

    let result = session
        .behavior
        .event_times(key)
        .ok_or_else(|| StatError::missing(format!("event times for {}", key)))
        .and_then(|timestamps| {
            let split = match_rows_to_timestamps(
                &group.trials,
                timestamps,
                median.median_time,
                config.mismatch_policy,
            )?;
            Ok((split, timestamps.len()))
        });

    let (split, n_timestamps) = result
        .map_err(|e| log.contrast_skipped(index, group.contrast, AnalysisStage::TimeSplit, e))
        .ok()?;

    if split.fallback_used {
        log.push(AnalysisWarning::TemporalFallback {
            session: index,
            contrast: group.contrast,
            rows: group.trial_count(),
            timestamps: n_timestamps,
        });
    }

    let origin = GroupOrigin {
        session: index,
        contrast: Some(group.contrast),
        stage: AnalysisStage::TimeSplit,
    };
    let groups = summarize_group(&split.early, &group.time, config, origin, log)
        .and_then(|early| {
            Ok(EarlyLate {
                early,
                late: summarize_group(&split.late, &group.time, config, origin, log)?,
            })
        })
        .map_err(|e| origin.skipped(log, e))
        .ok()?;

    Some(TimedEarlyLate {
        median_time: split.median_time,
        fallback_used: split.fallback_used,
        groups,
    })
}

/// Regress every finite per-trial CS peak on its contrast proportion.
fn fit_contrast_response(peaks: &[ContrastPeaks], alpha: f64) -> Result<RegressionResult, StatError> {
    let (x, y): (Vec<f64>, Vec<f64>) = peaks
        .iter()
        .flat_map(|c| {
            c.peaks
                .iter()
                .filter(|p| p.value.is_finite())
                .map(move |p| (c.proportion, p.value))
        })
        .unzip();
    fit_linear_with_alpha(&x, &y, alpha)
}
