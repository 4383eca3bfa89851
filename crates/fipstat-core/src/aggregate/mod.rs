//! Trial-group aggregation: mean/SEM traces, smoothing and peak summaries.
//!
//! All functions take borrowed trial data and return new vectors; nothing is
//! cached between calls.

mod ratio;

pub use ratio::{cs_us_ratio, summarize_ratios, RatioSet, RatioSummary};

use serde::{Deserialize, Serialize};

use crate::error::StatError;
use crate::types::TrialMatrix;
use crate::window::PeakRecord;

/// Mean and standard error of a trial group, per time sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStat {
    /// Column means (one per time sample).
    #[serde(with = "crate::nonfinite::vec")]
    pub mean: Vec<f64>,
    /// Column standard errors.
    #[serde(with = "crate::nonfinite::vec")]
    pub sem: Vec<f64>,
    /// Moving-average smoothed mean, when smoothing was requested.
    #[serde(with = "crate::nonfinite::option_vec")]
    pub smoothed_mean: Option<Vec<f64>>,
    /// Moving-average smoothed SEM, when smoothing was requested.
    #[serde(with = "crate::nonfinite::option_vec")]
    pub smoothed_sem: Option<Vec<f64>>,
    /// Number of trials aggregated.
    pub n_trials: usize,
}

/// Mean and standard error of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanSem {
    /// Sample mean.
    #[serde(with = "crate::nonfinite::scalar")]
    pub mean: f64,
    /// Standard error of the mean (zero for a single value).
    #[serde(with = "crate::nonfinite::scalar")]
    pub sem: f64,
    /// Sample size.
    pub n: usize,
}

impl MeanSem {
    /// Mean and SEM of `values`, or `None` when empty.
    pub fn of(values: &[f64]) -> Option<Self> {
        let n = values.len();
        if n == 0 {
            return None;
        }
        let mean = values.iter().sum::<f64>() / n as f64;
        Some(Self {
            mean,
            sem: sem_about(values.iter().copied(), mean, n),
            n,
        })
    }
}

/// Summary of per-trial peaks within one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakSummary {
    /// Mean and SEM of peak values.
    pub value: MeanSem,
    /// Mean and SEM of peak times.
    pub time: MeanSem,
}

/// Standard error about a known mean: sample std (n - 1) over sqrt(n).
///
/// Defined as zero for a single observation.
fn sem_about(values: impl Iterator<Item = f64>, mean: f64, n: usize) -> f64 {
    if n < 2 {
        return 0.0;
    }
    let ss: f64 = values.map(|v| (v - mean) * (v - mean)).sum();
    let variance = ss / (n - 1) as f64;
    (variance / n as f64).sqrt()
}

/// Column-wise mean and standard error of a trial matrix.
///
/// SEM is the column sample standard deviation divided by `sqrt(n)`, and is
/// all zeros for a single trial.
///
/// # Errors
///
/// [`StatError::InsufficientData`] for a matrix without rows.
pub fn mean_sem(trials: &TrialMatrix) -> Result<(Vec<f64>, Vec<f64>), StatError> {
    let n = trials.nrows();
    if n == 0 {
        return Err(StatError::insufficient("mean/SEM", 0, 1));
    }

    let (mean, sem): (Vec<f64>, Vec<f64>) = trials
        .column_iter()
        .map(|col| {
            let m = col.sum() / n as f64;
            (m, sem_about(col.iter().copied(), m, n))
        })
        .unzip();

    Ok((mean, sem))
}

/// Centered moving average with windows that shrink at the edges.
///
/// Each output sample averages `series[i - back ..= i + forward]` clipped to
/// the series bounds, with `back = window / 2` and
/// `forward = (window - 1) / 2`. Odd windows are symmetric; even windows
/// lean one sample into the past. No padding is introduced, so the output
/// has the same length as the input.
///
/// # Errors
///
/// [`StatError::InvalidInput`] for a zero-length window.
pub fn smooth(series: &[f64], window: usize) -> Result<Vec<f64>, StatError> {
    if window == 0 {
        return Err(StatError::InvalidInput(
            "smoothing window must be at least 1".to_string(),
        ));
    }
    let n = series.len();
    if window == 1 || n == 0 {
        return Ok(series.to_vec());
    }

    let back = window / 2;
    let forward = (window - 1) / 2;

    // prefix[i] = sum of series[..i]
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0);
    for v in series {
        prefix.push(prefix[prefix.len() - 1] + v);
    }

    Ok((0..n)
        .map(|i| {
            let lo = i.saturating_sub(back);
            let hi = (i + forward).min(n - 1);
            (prefix[hi + 1] - prefix[lo]) / (hi + 1 - lo) as f64
        })
        .collect())
}

/// Mean/SEM traces of a trial group, optionally smoothed.
pub fn aggregate(trials: &TrialMatrix, smoothing: Option<usize>) -> Result<AggregateStat, StatError> {
    let (mean, sem) = mean_sem(trials)?;

    let (smoothed_mean, smoothed_sem) = match smoothing {
        Some(window) => (Some(smooth(&mean, window)?), Some(smooth(&sem, window)?)),
        None => (None, None),
    };

    Ok(AggregateStat {
        mean,
        sem,
        smoothed_mean,
        smoothed_sem,
        n_trials: trials.nrows(),
    })
}

/// Mean/SEM of peak values and peak times over a set of trials.
///
/// Non-finite peak values are ignored.
///
/// # Errors
///
/// [`StatError::InsufficientData`] when no finite peak is available.
pub fn summarize_peaks(peaks: &[PeakRecord]) -> Result<PeakSummary, StatError> {
    let finite: Vec<&PeakRecord> = peaks.iter().filter(|p| p.value.is_finite()).collect();
    let values: Vec<f64> = finite.iter().map(|p| p.value).collect();
    let times: Vec<f64> = finite.iter().map(|p| p.time).collect();

    match (MeanSem::of(&values), MeanSem::of(&times)) {
        (Some(value), Some(time)) => Ok(PeakSummary { value, time }),
        _ => Err(StatError::insufficient("peak summary", 0, 1)),
    }
}
