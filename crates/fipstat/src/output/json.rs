//! JSON serialization for session and batch reports.
//!
//! Non-finite numbers (NaN ratios of excluded trials, infinite Wald
//! statistics) are written as `null` and read back as NaN, so every report
//! can be deserialized from its own output.

use serde::Serialize;

/// Serialize a report to a compact JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for reports).
pub fn to_json<T: Serialize + ?Sized>(report: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(report)
}

/// Serialize a report to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for reports).
pub fn to_json_pretty<T: Serialize + ?Sized>(report: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
