//! Loading of recorded sessions and trial matrices.
//!
//! # Supported Formats
//!
//! - **JSON dataset**: every session of an experiment, with trial groups,
//!   thresholds and behavioural events ([`load_dataset_json`])
//! - **CSV trial matrix**: one contrast group, a `time` header row followed
//!   by one row per trial ([`load_trial_matrix_csv`])
//!
//! # Example
//!
//! ```ignore
//! use fipstat::data::load_dataset_json;
//! use std::path::Path;
//!
//! let dataset = load_dataset_json(Path::new("mouse_12.json"))?;
//! println!("Loaded {} sessions", dataset.len());
//! ```

mod csv;
mod json;

pub use csv::load_trial_matrix_csv;
pub use json::{dataset_from_json_str, load_dataset_json};

use std::fmt;

use fipstat_core::StatError;

/// Errors that can occur during data loading.
#[derive(Debug)]
pub enum DataError {
    /// IO error reading file.
    Io(std::io::Error),

    /// Malformed JSON.
    Json(serde_json::Error),

    /// CSV structure error at a specific line.
    Parse {
        /// Line number where the error occurred (1-indexed).
        line: usize,
        /// Description of the parse error.
        message: String,
    },

    /// Non-numeric CSV field.
    InvalidValue {
        /// Line number where the invalid value was found (1-indexed).
        line: usize,
        /// The invalid value string.
        value: String,
    },

    /// Trial rows that cannot form a matrix.
    Shape {
        /// Where the rows came from.
        context: String,
        /// What was wrong with them.
        message: String,
    },

    /// Data that parsed but fails validation.
    Invalid(StatError),
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Io(e) => write!(f, "IO error: {}", e),
            DataError::Json(e) => write!(f, "JSON error: {}", e),
            DataError::Parse { line, message } => {
                write!(f, "Parse error at line {}: {}", line, message)
            }
            DataError::InvalidValue { line, value } => {
                write!(f, "Invalid sample value at line {}: '{}'", line, value)
            }
            DataError::Shape { context, message } => write!(f, "{}: {}", context, message),
            DataError::Invalid(e) => write!(f, "Invalid data: {}", e),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Io(e) => Some(e),
            DataError::Json(e) => Some(e),
            DataError::Invalid(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DataError {
    fn from(e: std::io::Error) -> Self {
        DataError::Io(e)
    }
}

impl From<serde_json::Error> for DataError {
    fn from(e: serde_json::Error) -> Self {
        DataError::Json(e)
    }
}

impl From<StatError> for DataError {
    fn from(e: StatError) -> Self {
        DataError::Invalid(e)
    }
}
