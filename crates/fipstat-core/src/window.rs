//! Time-window extraction and per-trial peak detection.
//!
//! A window selects the samples whose timestamps fall inside a closed
//! interval. Peaks are the maximum of a trial restricted to those samples,
//! with ties resolved to the earliest sample.

use serde::{Deserialize, Serialize};

use crate::error::StatError;
use crate::types::{TrialMatrix, Window, WindowKind};

/// Peak value and the time at which it occurs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    /// Maximum value inside the window.
    #[serde(with = "crate::nonfinite::scalar")]
    pub value: f64,
    /// Time of the maximum.
    #[serde(with = "crate::nonfinite::scalar")]
    pub time: f64,
}

/// Peak of one trial within one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakRecord {
    /// Row index of the trial in its matrix.
    pub trial: usize,
    /// Window the peak was taken from.
    pub kind: WindowKind,
    /// Peak value.
    #[serde(with = "crate::nonfinite::scalar")]
    pub value: f64,
    /// Peak time.
    #[serde(with = "crate::nonfinite::scalar")]
    pub time: f64,
}

/// Indices `i` with `window.start <= time[i] <= window.end`.
///
/// The result may be empty.
pub fn extract_window(time: &[f64], window: &Window) -> Vec<usize> {
    time.iter()
        .enumerate()
        .filter(|(_, t)| window.contains(**t))
        .map(|(i, _)| i)
        .collect()
}

/// Like [`extract_window`] but fails with [`StatError::EmptyWindow`] when
/// nothing falls inside the window.
pub fn window_indices(time: &[f64], window: &Window) -> Result<Vec<usize>, StatError> {
    let indices = extract_window(time, window);
    if indices.is_empty() {
        return Err(StatError::EmptyWindow {
            start: window.start,
            end: window.end,
        });
    }
    Ok(indices)
}

/// Maximum over `indices` of `value_at(i)`.
///
/// Only strictly greater values replace the current best, so the first
/// occurrence wins ties and NaN never displaces a number. If every value is
/// NaN the first index is reported with a NaN value.
fn peak_over(indices: &[usize], time: &[f64], value_at: impl Fn(usize) -> f64) -> Peak {
    let mut best_idx = indices[0];
    let mut best = value_at(best_idx);

    for &i in &indices[1..] {
        let v = value_at(i);
        if v > best || (best.is_nan() && !v.is_nan()) {
            best = v;
            best_idx = i;
        }
    }

    Peak {
        value: best,
        time: time[best_idx],
    }
}

/// Peak of a single trial inside `window`.
///
/// # Errors
///
/// - [`StatError::InvalidInput`] if `row` and `time` differ in length
/// - [`StatError::EmptyWindow`] if no sample falls inside the window
pub fn peak_in_window(row: &[f64], time: &[f64], window: &Window) -> Result<Peak, StatError> {
    if row.len() != time.len() {
        return Err(StatError::InvalidInput(format!(
            "trial has {} samples, time vector has {}",
            row.len(),
            time.len()
        )));
    }
    let indices = window_indices(time, window)?;
    Ok(peak_over(&indices, time, |i| row[i]))
}

/// Peak of every trial (row) of `trials` inside `window`.
///
/// The window indices are resolved once and shared by all rows.
pub fn peaks_in_window(
    trials: &TrialMatrix,
    time: &[f64],
    window: &Window,
    kind: WindowKind,
) -> Result<Vec<PeakRecord>, StatError> {
    if trials.ncols() != time.len() {
        return Err(StatError::TimeGridMismatch {
            expected: time.len(),
            found: trials.ncols(),
        });
    }
    let indices = window_indices(time, window)?;

    Ok((0..trials.nrows())
        .map(|trial| {
            let peak = peak_over(&indices, time, |j| trials[(trial, j)]);
            PeakRecord {
                trial,
                kind,
                value: peak.value,
                time: peak.time,
            }
        })
        .collect())
}
