//! Early/late split of trials, by order or by event time.

use serde::{Deserialize, Serialize};

use crate::constants::MIN_SPLIT_TRIALS;
use crate::error::StatError;
use crate::types::TrialMatrix;

/// Early and late halves of a trial matrix split by trial order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSplit {
    /// First `floor(n / 2)` trials.
    pub early: TrialMatrix,
    /// Remaining trials.
    pub late: TrialMatrix,
}

/// Median split of a set of event timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedianSplit {
    /// Median of the pooled, sorted timestamps.
    #[serde(with = "crate::nonfinite::scalar")]
    pub median_time: f64,
    /// `true` where the timestamp is strictly before the median.
    pub early_mask: Vec<bool>,
    /// `true` where the timestamp is at or after the median.
    pub late_mask: Vec<bool>,
}

impl MedianSplit {
    /// Number of early events.
    pub fn early_count(&self) -> usize {
        self.early_mask.iter().filter(|m| **m).count()
    }

    /// Number of late events.
    pub fn late_count(&self) -> usize {
        self.late_mask.iter().filter(|m| **m).count()
    }
}

/// What to do when trial rows cannot be aligned with their timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MismatchPolicy {
    /// Refuse the split and report [`StatError::RowTimestampMismatch`].
    #[default]
    Skip,
    /// Use every trial for both the early and the late group, flagging the
    /// result with `fallback_used`. The early/late comparison is then no
    /// longer temporal, so callers must surface the flag.
    UseAllTrials,
}

impl MismatchPolicy {
    /// Read the policy from `FIPSTAT_MISMATCH_POLICY`, or use `default`.
    ///
    /// Accepts `skip` and `use_all` (or `all`).
    pub fn from_env_or(default: Self) -> Self {
        match std::env::var("FIPSTAT_MISMATCH_POLICY").ok().as_deref() {
            Some("skip") => Self::Skip,
            Some("use_all") | Some("all") => Self::UseAllTrials,
            _ => default,
        }
    }
}

impl std::fmt::Display for MismatchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MismatchPolicy::Skip => write!(f, "skip"),
            MismatchPolicy::UseAllTrials => write!(f, "use all trials"),
        }
    }
}

/// Early/late trials of one matrix split by event time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalSplit {
    /// Median time the split was made at.
    pub median_time: f64,
    /// Trials whose event precedes the median.
    pub early: TrialMatrix,
    /// Trials whose event is at or after the median.
    pub late: TrialMatrix,
    /// Rows could not be aligned and every trial was used on both sides.
    pub fallback_used: bool,
}

/// Split a trial matrix into its first and second halves.
///
/// `early` receives the first `floor(n / 2)` rows and `late` the rest.
///
/// # Errors
///
/// [`StatError::InsufficientData`] with fewer than four trials.
pub fn split_by_order(trials: &TrialMatrix) -> Result<OrderSplit, StatError> {
    let n = trials.nrows();
    if n < MIN_SPLIT_TRIALS {
        return Err(StatError::insufficient("early/late split", n, MIN_SPLIT_TRIALS));
    }

    let half = n / 2;
    Ok(OrderSplit {
        early: trials.rows(0, half).into_owned(),
        late: trials.rows(half, n - half).into_owned(),
    })
}

/// Median of a non-empty slice (mean of the two middle values when even).
fn median_of(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        0.5 * (sorted[n / 2 - 1] + sorted[n / 2])
    }
}

/// Split pooled event timestamps (hits and misses) at their median.
///
/// Events strictly before the median are early; the rest are late.
///
/// # Errors
///
/// - [`StatError::InsufficientData`] with fewer than four timestamps
/// - [`StatError::InvalidInput`] if any timestamp is not finite
pub fn split_by_median_time(timestamps: &[f64]) -> Result<MedianSplit, StatError> {
    if timestamps.len() < MIN_SPLIT_TRIALS {
        return Err(StatError::insufficient(
            "median time split",
            timestamps.len(),
            MIN_SPLIT_TRIALS,
        ));
    }
    if timestamps.iter().any(|t| !t.is_finite()) {
        return Err(StatError::InvalidInput(
            "event timestamps must be finite".to_string(),
        ));
    }

    let median_time = median_of(timestamps);
    let early_mask: Vec<bool> = timestamps.iter().map(|t| *t < median_time).collect();
    let late_mask = early_mask.iter().map(|e| !e).collect();

    Ok(MedianSplit {
        median_time,
        early_mask,
        late_mask,
    })
}

/// Split the rows of `trials` by their event `timestamps` around `median_time`.
///
/// Rows are matched to timestamps only when both counts agree. Otherwise
/// `policy` decides between refusing the split and the flagged all-trials
/// fallback.
///
/// # Errors
///
/// - [`StatError::RowTimestampMismatch`] on misalignment under
///   [`MismatchPolicy::Skip`]
/// - [`StatError::InvalidInput`] if `median_time` is not finite
pub fn match_rows_to_timestamps(
    trials: &TrialMatrix,
    timestamps: &[f64],
    median_time: f64,
    policy: MismatchPolicy,
) -> Result<TemporalSplit, StatError> {
    if !median_time.is_finite() {
        return Err(StatError::InvalidInput(format!(
            "median split time {} is not finite",
            median_time
        )));
    }

    if trials.nrows() != timestamps.len() {
        return match policy {
            MismatchPolicy::Skip => Err(StatError::RowTimestampMismatch {
                rows: trials.nrows(),
                timestamps: timestamps.len(),
            }),
            MismatchPolicy::UseAllTrials => Ok(TemporalSplit {
                median_time,
                early: trials.clone(),
                late: trials.clone(),
                fallback_used: true,
            }),
        };
    }

    let (early_rows, late_rows): (Vec<usize>, Vec<usize>) =
        (0..trials.nrows()).partition(|&i| timestamps[i] < median_time);

    Ok(TemporalSplit {
        median_time,
        early: trials.select_rows(early_rows.iter()),
        late: trials.select_rows(late_rows.iter()),
        fallback_used: false,
    })
}
