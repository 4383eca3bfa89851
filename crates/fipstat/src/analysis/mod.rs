//! Session and batch analyses built on the core engine.
//!
//! [`analyze_session`] turns one [`crate::Session`] into a [`SessionReport`];
//! [`analyze_sessions`] runs it over a collection and adds the cross-session
//! trend.

mod batch;
mod session;

pub use batch::{analyze_sessions, BatchError, BatchReport, SessionOutcome, SessionTrend};
pub use session::{
    analyze_session, ContrastSummary, EarlyLate, EarlyLateSummary, GroupSummary, SessionReport,
    ThresholdSummary, TimedEarlyLate,
};
