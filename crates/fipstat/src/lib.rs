//! # fipstat
//!
//! Contrast-conditioned trial aggregation and inference for fiber-photometry
//! sessions.
//!
//! Given per-trial dopamine traces grouped by stimulus contrast, this crate
//! produces, per session:
//! - Mean/SEM traces per contrast, optionally smoothed
//! - CS and US peak summaries and CS/US amplitude ratios
//! - Above/below psychometric-threshold aggregates
//! - Early/late comparisons by trial order and by event time
//! - A contrast-response regression with a Wald test on the slope
//!
//! and, across sessions, a regression of the mean CS peak on session index.
//!
//! ## Recoverable Failures
//!
//! A contrast with too few trials or a stage that cannot run never stops a
//! session; it becomes an [`AnalysisWarning`] in the report and is logged
//! through `tracing`. Likewise a failing session is skipped, never aborting
//! a batch. Install a `tracing` subscriber to see warnings as they happen.
//!
//! ## Quick Start
//!
//! ```ignore
//! use fipstat::{analyze_sessions, data::load_dataset_json, AnalysisConfig};
//! use std::path::Path;
//!
//! let dataset = load_dataset_json(Path::new("mouse_12.json"))?;
//! let config = AnalysisConfig::new().with_smoothing(7);
//! let batch = analyze_sessions(&dataset.sessions, &config)?;
//!
//! for report in batch.reports() {
//!     if let Some(fit) = &report.contrast_regression {
//!         println!("session {}: slope {:.3}, p = {:.3}", report.index, fit.b1, fit.p_value);
//!     }
//! }
//! println!("{}", fipstat::output::to_json_pretty(&batch)?);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod diagnostics;
mod session;

pub mod analysis;
pub mod data;
pub mod output;

pub use analysis::{
    analyze_session, analyze_sessions, BatchError, BatchReport, ContrastSummary, SessionOutcome,
    SessionReport, SessionTrend,
};
pub use config::{AnalysisConfig, ResolvedThreshold, ThresholdPolicy};
pub use diagnostics::{AnalysisStage, AnalysisWarning, Severity};
pub use session::{BehaviorRecord, ContrastBehavior, Dataset, Session};

// Re-export the engine types that appear in reports and sessions
pub use fipstat_core::{
    ContrastKey, ContrastTrialGroup, MismatchPolicy, StatError, TrialCategory, TrialMatrix, Window,
};
