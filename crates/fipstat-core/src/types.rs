//! Type aliases and common types.

use nalgebra::{DMatrix, SMatrix, SVector};
use serde::{Deserialize, Serialize};

use crate::constants::CONTRAST_SCALE;
use crate::error::StatError;

/// Trials × time-samples matrix of z-scored signal.
pub type TrialMatrix = DMatrix<f64>;

/// 2x2 matrix for regression covariance ([intercept, slope]).
pub type Matrix2 = SMatrix<f64, 2, 2>;

/// 2-dimensional vector for regression coefficients ([intercept, slope]).
pub type Vector2 = SVector<f64, 2>;

/// A closed time interval `[start, end]`, inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Window {
    /// Start of the window.
    pub start: f64,
    /// End of the window.
    pub end: f64,
}

impl Window {
    /// Create a window, rejecting non-finite or reversed bounds.
    pub fn new(start: f64, end: f64) -> Result<Self, StatError> {
        if !start.is_finite() || !end.is_finite() || start > end {
            return Err(StatError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Whether `t` lies inside the window (inclusive).
    #[inline]
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t <= self.end
    }

    /// Width of the window.
    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Which response window a peak was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowKind {
    /// Conditioned-stimulus window (early post-stimulus).
    Cs,
    /// Unconditioned-stimulus / reward window.
    Us,
}

impl std::fmt::Display for WindowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowKind::Cs => write!(f, "CS"),
            WindowKind::Us => write!(f, "US"),
        }
    }
}

/// Behavioural outcome a trial group belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrialCategory {
    /// Animal responded to the stimulus.
    Hit,
    /// Animal did not respond.
    Miss,
}

impl std::fmt::Display for TrialCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrialCategory::Hit => write!(f, "hit"),
            TrialCategory::Miss => write!(f, "miss"),
        }
    }
}

/// Lookup key for a trial group: category plus contrast in integer percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContrastKey {
    /// Trial category.
    pub category: TrialCategory,
    /// Stimulus contrast in percent.
    pub contrast: u32,
}

impl ContrastKey {
    /// Create a key.
    pub fn new(category: TrialCategory, contrast: u32) -> Self {
        Self { category, contrast }
    }

    /// Key for a hit group.
    pub fn hit(contrast: u32) -> Self {
        Self::new(TrialCategory::Hit, contrast)
    }

    /// Key for a miss group.
    pub fn miss(contrast: u32) -> Self {
        Self::new(TrialCategory::Miss, contrast)
    }
}

impl std::fmt::Display for ContrastKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}%", self.category, self.contrast)
    }
}

/// Convert an integer-percent contrast to a proportion.
#[inline]
pub fn contrast_proportion(contrast: u32) -> f64 {
    contrast as f64 / CONTRAST_SCALE
}

/// Trials recorded at one contrast level.
///
/// `trials` has one row per trial and one column per entry of `time`.
/// Groups built with [`ContrastTrialGroup::new`] are always well formed;
/// groups assembled field-by-field (e.g. from deserialized data) can be
/// checked with [`ContrastTrialGroup::check`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContrastTrialGroup {
    /// Stimulus contrast in percent.
    pub contrast: u32,
    /// Trial matrix (rows = trials, columns = time samples).
    pub trials: TrialMatrix,
    /// Sampling times shared by every trial.
    pub time: Vec<f64>,
}

impl ContrastTrialGroup {
    /// Create a group, validating that `time` matches the column count.
    pub fn new(contrast: u32, trials: TrialMatrix, time: Vec<f64>) -> Result<Self, StatError> {
        let group = Self {
            contrast,
            trials,
            time,
        };
        group.check()?;
        Ok(group)
    }

    /// Build a group from per-trial rows.
    pub fn from_rows(contrast: u32, rows: &[Vec<f64>], time: Vec<f64>) -> Result<Self, StatError> {
        let ncols = time.len();
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != ncols) {
            return Err(StatError::InvalidInput(format!(
                "trial {} has {} samples, time vector has {}",
                i,
                row.len(),
                ncols
            )));
        }
        let trials = TrialMatrix::from_fn(rows.len(), ncols, |i, j| rows[i][j]);
        Self::new(contrast, trials, time)
    }

    /// Number of trials (rows).
    pub fn trial_count(&self) -> usize {
        self.trials.nrows()
    }

    /// Number of time samples (columns).
    pub fn sample_count(&self) -> usize {
        self.time.len()
    }

    /// Contrast as a proportion in [0, 1].
    pub fn proportion(&self) -> f64 {
        contrast_proportion(self.contrast)
    }

    /// Verify the group carries a usable trial matrix and time vector.
    pub fn check(&self) -> Result<(), StatError> {
        if self.time.is_empty() {
            return Err(StatError::missing(format!(
                "time vector for contrast {}%",
                self.contrast
            )));
        }
        if self.trials.nrows() == 0 {
            return Err(StatError::missing(format!(
                "trial matrix for contrast {}%",
                self.contrast
            )));
        }
        if self.trials.ncols() != self.time.len() {
            return Err(StatError::TimeGridMismatch {
                expected: self.time.len(),
                found: self.trials.ncols(),
            });
        }
        if self.time.iter().any(|t| !t.is_finite()) || self.time.windows(2).any(|w| w[0] >= w[1]) {
            return Err(StatError::InvalidInput(format!(
                "time vector for contrast {}% is not strictly increasing",
                self.contrast
            )));
        }
        Ok(())
    }
}
