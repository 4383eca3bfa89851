//! Above/below split of contrast groups by psychometric threshold.

use serde::{Deserialize, Serialize};

use super::stack_rows;
use crate::error::StatError;
use crate::types::{ContrastTrialGroup, TrialMatrix};

/// A contrast group left out of a threshold split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedGroup {
    /// Contrast of the skipped group.
    pub contrast: u32,
    /// Why it was skipped.
    pub reason: StatError,
}

/// Result of [`split_by_threshold`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSplit {
    /// Threshold used (proportion).
    pub threshold: f64,
    /// Stacked trials of contrasts strictly above the threshold.
    pub above: TrialMatrix,
    /// Stacked trials of contrasts at or below the threshold.
    pub below: TrialMatrix,
    /// Contrasts contributing to `above`, in stacking order.
    pub above_contrasts: Vec<u32>,
    /// Contrasts contributing to `below`, in stacking order.
    pub below_contrasts: Vec<u32>,
    /// Groups skipped because their data was missing or malformed.
    pub skipped: Vec<SkippedGroup>,
}

impl ThresholdSplit {
    /// Number of trials above threshold.
    pub fn above_count(&self) -> usize {
        self.above.nrows()
    }

    /// Number of trials at or below threshold.
    pub fn below_count(&self) -> usize {
        self.below.nrows()
    }
}

/// Check that `threshold` is a finite proportion in [0, 1].
pub fn validate_threshold(threshold: f64) -> Result<f64, StatError> {
    if threshold.is_finite() && (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(StatError::InvalidThreshold(threshold))
    }
}

/// Partition contrast groups around `threshold`.
///
/// Each group's contrast is converted to a proportion; groups with
/// `proportion > threshold` contribute all their rows to `above`, all others
/// (including `proportion == threshold`) to `below`. Groups are stacked in
/// ascending contrast order.
///
/// Groups failing [`ContrastTrialGroup::check`], or whose column count
/// differs from the first usable group, are reported in `skipped` instead of
/// aborting the split.
///
/// # Errors
///
/// [`StatError::InvalidThreshold`] if `threshold` is not a proportion.
pub fn split_by_threshold<'a, I>(groups: I, threshold: f64) -> Result<ThresholdSplit, StatError>
where
    I: IntoIterator<Item = &'a ContrastTrialGroup>,
{
    let threshold = validate_threshold(threshold)?;

    let mut ordered: Vec<&ContrastTrialGroup> = groups.into_iter().collect();
    ordered.sort_by_key(|g| g.contrast);

    let mut ncols: Option<usize> = None;
    let mut above: Vec<&TrialMatrix> = Vec::new();
    let mut below: Vec<&TrialMatrix> = Vec::new();
    let mut above_contrasts = Vec::new();
    let mut below_contrasts = Vec::new();
    let mut skipped = Vec::new();

    for group in ordered {
        if let Err(reason) = group.check() {
            skipped.push(SkippedGroup {
                contrast: group.contrast,
                reason,
            });
            continue;
        }

        let expected = *ncols.get_or_insert(group.sample_count());
        if group.sample_count() != expected {
            skipped.push(SkippedGroup {
                contrast: group.contrast,
                reason: StatError::TimeGridMismatch {
                    expected,
                    found: group.sample_count(),
                },
            });
            continue;
        }

        if group.proportion() > threshold {
            above.push(&group.trials);
            above_contrasts.push(group.contrast);
        } else {
            below.push(&group.trials);
            below_contrasts.push(group.contrast);
        }
    }

    let ncols = ncols.unwrap_or(0);
    Ok(ThresholdSplit {
        threshold,
        above: stack_rows(&above, ncols),
        below: stack_rows(&below, ncols),
        above_contrasts,
        below_contrasts,
        skipped,
    })
}
