//! Constants shared by the aggregation and inference routines.

/// Psychometric threshold substituted when a session has none (proportion).
pub const DEFAULT_THRESHOLD: f64 = 0.1;

/// Significance level for the slope Wald test.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Minimum trial (or timestamp) count for an early/late split.
pub const MIN_SPLIT_TRIALS: usize = 4;

/// Minimum number of points for a linear fit with a defined Wald test.
///
/// Two coefficients leave `n - 2` residual degrees of freedom, which must be
/// at least one.
pub const MIN_REGRESSION_POINTS: usize = 3;

/// Minimum number of samples for a normal fit.
pub const MIN_NORMAL_SAMPLES: usize = 2;

/// Contrast values are stored as integer percent.
pub const CONTRAST_SCALE: f64 = 100.0;

// =============================================================================
// Default analysis windows (seconds relative to stimulus onset)
// =============================================================================

/// Default CS window start.
pub const DEFAULT_CS_START: f64 = 0.0;

/// Default CS window end.
pub const DEFAULT_CS_END: f64 = 0.5;

/// Default US window start.
pub const DEFAULT_US_START: f64 = 1.0;

/// Default US window end.
pub const DEFAULT_US_END: f64 = 1.5;

/// Default moving-average window length in samples.
pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;
