//! Core trial aggregation and statistical inference for fiber-photometry data.
//!
//! This crate holds the numerical engine behind session-level dopamine
//! analyses. It knows nothing about files, sessions or rendering: every
//! function takes borrowed trial matrices and time vectors and returns new
//! values.
//!
//! # Components
//!
//! - [`window`]: sample indices inside a time window and per-trial peaks
//! - [`split`]: threshold (above/below) and temporal (early/late) partitions
//! - [`aggregate`]: mean/SEM traces, edge-shrinking moving average, CS/US ratios
//! - [`regression`]: OLS with a slope Wald test, normal fits, histograms
//! - [`nonfinite`]: serde helpers so NaN fields survive a JSON round trip
//!
//! # Usage
//!
//! This crate is typically used through the `fipstat` crate, which adds the
//! session data model, loading, configuration and batch orchestration.
//!
//! ```ignore
//! use fipstat_core::{
//!     aggregate::aggregate,
//!     regression::fit_linear,
//!     split::split_by_threshold,
//!     window::peaks_in_window,
//! };
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregate;
pub mod constants;
pub mod error;
pub mod nonfinite;
pub mod regression;
pub mod split;
pub mod types;
pub mod window;

// Re-export commonly used items at crate root
pub use aggregate::{AggregateStat, MeanSem, PeakSummary, RatioSet, RatioSummary};
pub use error::StatError;
pub use regression::{Histogram, NormalFit, RegressionResult};
pub use split::{MismatchPolicy, OrderSplit, TemporalSplit, ThresholdSplit};
pub use types::{
    contrast_proportion, ContrastKey, ContrastTrialGroup, TrialCategory, TrialMatrix, Window,
    WindowKind,
};
pub use window::{Peak, PeakRecord};
