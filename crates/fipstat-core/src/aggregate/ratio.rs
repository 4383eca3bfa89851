//! CS/US response-amplitude ratios.

use serde::{Deserialize, Serialize};

use super::MeanSem;
use crate::error::StatError;
use crate::types::{TrialMatrix, Window, WindowKind};
use crate::window::peaks_in_window;

/// Per-trial CS/US peak ratios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioSet {
    /// One ratio per trial; NaN where the ratio is undefined (zero US peak
    /// or a non-finite peak). Kept for diagnostics.
    #[serde(with = "crate::nonfinite::vec")]
    pub raw: Vec<f64>,
    /// Indices into `raw` of the finite ratios used downstream.
    pub used: Vec<usize>,
}

impl RatioSet {
    /// Finite ratios, in trial order.
    pub fn finite(&self) -> Vec<f64> {
        self.used.iter().map(|&i| self.raw[i]).collect()
    }

    /// Number of trials whose ratio was excluded.
    pub fn excluded_count(&self) -> usize {
        self.raw.len() - self.used.len()
    }
}

/// Group-level ratio statistic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioSummary {
    /// Mean and SEM of the finite ratios.
    pub ratio: MeanSem,
    /// Trials excluded because their ratio was undefined.
    pub excluded: usize,
}

/// Ratio of each trial's CS-window peak to its US-window peak.
///
/// # Errors
///
/// Propagates [`StatError::EmptyWindow`] / [`StatError::TimeGridMismatch`]
/// from peak extraction.
pub fn cs_us_ratio(
    trials: &TrialMatrix,
    time: &[f64],
    cs: &Window,
    us: &Window,
) -> Result<RatioSet, StatError> {
    let cs_peaks = peaks_in_window(trials, time, cs, WindowKind::Cs)?;
    let us_peaks = peaks_in_window(trials, time, us, WindowKind::Us)?;

    let raw: Vec<f64> = cs_peaks
        .iter()
        .zip(&us_peaks)
        .map(|(c, u)| {
            if u.value == 0.0 {
                return f64::NAN;
            }
            // Non-finite peaks or an overflowing quotient.
            let ratio = c.value / u.value;
            if ratio.is_finite() {
                ratio
            } else {
                f64::NAN
            }
        })
        .collect();

    let used = raw
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_finite())
        .map(|(i, _)| i)
        .collect();

    Ok(RatioSet { raw, used })
}

/// Mean and SEM of the finite ratios of a [`RatioSet`].
///
/// # Errors
///
/// [`StatError::InsufficientData`] when no ratio is finite.
pub fn summarize_ratios(ratios: &RatioSet) -> Result<RatioSummary, StatError> {
    let finite = ratios.finite();
    let ratio = MeanSem::of(&finite)
        .ok_or_else(|| StatError::insufficient("CS/US ratio", 0, 1))?;

    Ok(RatioSummary {
        ratio,
        excluded: ratios.excluded_count(),
    })
}
