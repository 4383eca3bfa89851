//! Output formatting for analysis reports.
//!
//! Reports are numeric only; plotting is left to the caller. This module
//! provides machine-readable serialization of any report type.

mod json;

pub use json::{to_json, to_json_pretty};
