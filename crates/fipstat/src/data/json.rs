//! JSON dataset files.
//!
//! ```text
//! {
//!   "sessions": [{
//!     "index": 0,
//!     "date": "2024-03-01",
//!     "threshold": 0.12,
//!     "groups": [{ "category": "hit", "contrast": 50,
//!                  "time": [..], "trials": [[..], ..] }],
//!     "behavior": { "by_contrast": { "50": { "hit_times": [..],
//!                   "miss_times": [..], "reaction_times": [..] } } }
//!   }]
//! }
//! ```
//!
//! `threshold` and `behavior` may be omitted. Groups with no trials or no
//! time vector load as empty groups and are skipped during analysis; ragged
//! trial rows are rejected here since they cannot form a matrix.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use fipstat_core::{ContrastTrialGroup, TrialCategory, TrialMatrix};

use super::DataError;
use crate::session::{BehaviorRecord, Dataset, Session};

#[derive(Deserialize)]
struct DatasetFile {
    sessions: Vec<SessionFile>,
}

#[derive(Deserialize)]
struct SessionFile {
    index: usize,
    #[serde(default)]
    date: String,
    #[serde(default)]
    threshold: Option<f64>,
    #[serde(default)]
    groups: Vec<GroupFile>,
    #[serde(default)]
    behavior: BehaviorRecord,
}

#[derive(Deserialize)]
struct GroupFile {
    category: TrialCategory,
    contrast: u32,
    #[serde(default)]
    time: Vec<f64>,
    #[serde(default)]
    trials: Vec<Vec<f64>>,
}

impl GroupFile {
    fn into_group(self, session: usize) -> Result<ContrastTrialGroup, DataError> {
        let ncols = self.trials.first().map_or(self.time.len(), Vec::len);
        if let Some((i, row)) = self
            .trials
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != ncols)
        {
            return Err(DataError::Shape {
                context: format!(
                    "session {}, {} {}%",
                    session, self.category, self.contrast
                ),
                message: format!("trial {} has {} samples, trial 0 has {}", i, row.len(), ncols),
            });
        }

        let trials = TrialMatrix::from_fn(self.trials.len(), ncols, |i, j| self.trials[i][j]);
        Ok(ContrastTrialGroup {
            contrast: self.contrast,
            trials,
            time: self.time,
        })
    }
}

impl SessionFile {
    fn into_session(self) -> Result<Session, DataError> {
        let mut session = Session::new(self.index, self.date).with_behavior(self.behavior);
        session.threshold = self.threshold;
        for group in self.groups {
            let category = group.category;
            let (contrast, index) = (group.contrast, self.index);
            if session
                .insert_group(category, group.into_group(index)?)
                .is_some()
            {
                tracing::warn!(
                    session = index,
                    contrast,
                    %category,
                    "duplicate trial group, keeping the last one"
                );
            }
        }
        Ok(session)
    }
}

/// Parse a dataset from a JSON string.
pub fn dataset_from_json_str(json: &str) -> Result<Dataset, DataError> {
    let file: DatasetFile = serde_json::from_str(json)?;
    let sessions = file
        .sessions
        .into_iter()
        .map(SessionFile::into_session)
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(sessions = sessions.len(), "dataset loaded");
    Ok(Dataset::new(sessions))
}

/// Load a dataset from a JSON file.
pub fn load_dataset_json(path: &Path) -> Result<Dataset, DataError> {
    let json = fs::read_to_string(path)?;
    dataset_from_json_str(&json)
}
