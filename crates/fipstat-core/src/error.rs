//! Error taxonomy for the statistical engine.
//!
//! Every variant except [`StatError::InvalidThreshold`] is recoverable within
//! a session: the caller logs it, skips the affected contrast or stage and
//! keeps going. Threshold errors only surface when the caller has turned off
//! default substitution, and then fail the whole session. A batch still
//! records such a session as skipped and continues with the next one.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by the aggregation and inference routines.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum StatError {
    /// Not enough trials, points or samples for the requested statistic.
    #[error("insufficient data for {what}: got {got}, need at least {min}")]
    InsufficientData {
        /// What was being computed.
        what: String,
        /// Number of items available.
        got: usize,
        /// Minimum required.
        min: usize,
    },

    /// Expected data was absent (e.g. no trial matrix for a contrast).
    #[error("missing field: {what}")]
    MissingField {
        /// Description of the absent field.
        what: String,
    },

    /// The regression design matrix is singular (all predictor values equal).
    #[error("singular design: predictor has no variance")]
    SingularDesign,

    /// No time samples fall inside the requested window.
    #[error("no samples inside window [{start}, {end}]")]
    EmptyWindow {
        /// Window start.
        start: f64,
        /// Window end.
        end: f64,
    },

    /// Threshold is not a finite proportion in [0, 1].
    #[error("invalid psychometric threshold {0}: expected a proportion in [0, 1]")]
    InvalidThreshold(#[serde(with = "crate::nonfinite::scalar")] f64),

    /// Window bounds are non-finite or reversed.
    #[error("invalid window [{start}, {end}]")]
    InvalidWindow {
        /// Window start.
        #[serde(with = "crate::nonfinite::scalar")]
        start: f64,
        /// Window end.
        #[serde(with = "crate::nonfinite::scalar")]
        end: f64,
    },

    /// Inputs have inconsistent shapes or contain invalid values.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Groups of one session do not share the same sampling grid.
    #[error("time grid mismatch: expected {expected} samples, found {found}")]
    TimeGridMismatch {
        /// Samples in the reference grid.
        expected: usize,
        /// Samples in the offending group.
        found: usize,
    },

    /// Trial rows cannot be aligned 1:1 with event timestamps.
    #[error("cannot align {rows} trial rows with {timestamps} timestamps")]
    RowTimestampMismatch {
        /// Rows in the trial matrix.
        rows: usize,
        /// Timestamps available for the same trials.
        timestamps: usize,
    },
}

impl StatError {
    /// Shorthand for [`StatError::InsufficientData`].
    pub fn insufficient(what: impl Into<String>, got: usize, min: usize) -> Self {
        StatError::InsufficientData {
            what: what.into(),
            got,
            min,
        }
    }

    /// Shorthand for [`StatError::MissingField`].
    pub fn missing(what: impl Into<String>) -> Self {
        StatError::MissingField { what: what.into() }
    }

    /// Whether a session analysis can skip the affected contrast or stage
    /// and continue.
    ///
    /// `false` means the session itself fails. Batches never abort on a
    /// `StatError`: a failed session is recorded as skipped either way.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, StatError::InvalidThreshold(_))
    }
}
