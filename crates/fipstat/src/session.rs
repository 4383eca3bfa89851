//! Session data model: the read-only trial store consumed by the analyses.
//!
//! A [`Session`] is one recording day. Its trial groups are keyed by
//! [`ContrastKey`] (category plus contrast percent); lookups return a
//! `Result` so callers decide whether a missing group is worth a warning.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use fipstat_core::{ContrastKey, ContrastTrialGroup, StatError, TrialCategory};

/// Behavioural events recorded at one contrast.
///
/// Times are in seconds from session start.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContrastBehavior {
    /// Stimulus onset times of hit trials.
    #[serde(default)]
    pub hit_times: Vec<f64>,
    /// Stimulus onset times of miss trials.
    #[serde(default)]
    pub miss_times: Vec<f64>,
    /// Reaction times of hit trials.
    #[serde(default)]
    pub reaction_times: Vec<f64>,
}

impl ContrastBehavior {
    /// Event times of one category.
    pub fn times(&self, category: TrialCategory) -> &[f64] {
        match category {
            TrialCategory::Hit => &self.hit_times,
            TrialCategory::Miss => &self.miss_times,
        }
    }
}

/// Trial-level behavioural record of a session, partitioned per contrast.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BehaviorRecord {
    /// Events per contrast percent.
    #[serde(default)]
    pub by_contrast: BTreeMap<u32, ContrastBehavior>,
}

impl BehaviorRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the events of one contrast.
    pub fn with_contrast(mut self, contrast: u32, behavior: ContrastBehavior) -> Self {
        self.by_contrast.insert(contrast, behavior);
        self
    }

    /// Whether any events were recorded.
    pub fn is_empty(&self) -> bool {
        self.by_contrast
            .values()
            .all(|b| b.hit_times.is_empty() && b.miss_times.is_empty())
    }

    /// Event times for a category at one contrast.
    pub fn event_times(&self, key: ContrastKey) -> Option<&[f64]> {
        self.by_contrast
            .get(&key.contrast)
            .map(|b| b.times(key.category))
            .filter(|t| !t.is_empty())
    }

    /// Reaction times at one contrast.
    pub fn reaction_times(&self, contrast: u32) -> Option<&[f64]> {
        self.by_contrast
            .get(&contrast)
            .map(|b| b.reaction_times.as_slice())
            .filter(|t| !t.is_empty())
    }

    /// Hit and miss times of every contrast, pooled and sorted.
    pub fn pooled_event_times(&self) -> Vec<f64> {
        let mut pooled: Vec<f64> = self
            .by_contrast
            .values()
            .flat_map(|b| b.hit_times.iter().chain(&b.miss_times).copied())
            .collect();
        pooled.sort_by(|a, b| a.total_cmp(b));
        pooled
    }
}

/// One recording day.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Position of the session in its dataset.
    pub index: usize,
    /// Recording date.
    pub date: String,
    /// Psychometric threshold (proportion), if one was fitted.
    pub threshold: Option<f64>,
    /// Behavioural events.
    pub behavior: BehaviorRecord,
    groups: BTreeMap<ContrastKey, ContrastTrialGroup>,
}

impl Session {
    /// Create an empty session.
    pub fn new(index: usize, date: impl Into<String>) -> Self {
        Self {
            index,
            date: date.into(),
            threshold: None,
            behavior: BehaviorRecord::default(),
            groups: BTreeMap::new(),
        }
    }

    /// Set the psychometric threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Set the behavioural record.
    pub fn with_behavior(mut self, behavior: BehaviorRecord) -> Self {
        self.behavior = behavior;
        self
    }

    /// Add a trial group under `category`.
    pub fn with_group(mut self, category: TrialCategory, group: ContrastTrialGroup) -> Self {
        self.insert_group(category, group);
        self
    }

    /// Insert a trial group, returning any group it replaces.
    pub fn insert_group(
        &mut self,
        category: TrialCategory,
        group: ContrastTrialGroup,
    ) -> Option<ContrastTrialGroup> {
        self.groups
            .insert(ContrastKey::new(category, group.contrast), group)
    }

    /// Look up a trial group.
    ///
    /// # Errors
    ///
    /// [`StatError::MissingField`] when the session has no such group.
    pub fn group(&self, key: ContrastKey) -> Result<&ContrastTrialGroup, StatError> {
        self.groups
            .get(&key)
            .ok_or_else(|| StatError::missing(format!("{} trials in session {}", key, self.index)))
    }

    /// All groups of one category, in ascending contrast order.
    pub fn groups_in(
        &self,
        category: TrialCategory,
    ) -> impl Iterator<Item = &ContrastTrialGroup> + '_ {
        self.groups
            .iter()
            .filter(move |(k, _)| k.category == category)
            .map(|(_, g)| g)
    }

    /// Contrasts available for one category, ascending.
    pub fn contrasts(&self, category: TrialCategory) -> Vec<u32> {
        self.groups_in(category).map(|g| g.contrast).collect()
    }

    /// Every key in the session.
    pub fn keys(&self) -> impl Iterator<Item = &ContrastKey> + '_ {
        self.groups.keys()
    }

    /// Number of trial groups.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Time grid of the first well-formed group.
    pub fn time_grid(&self) -> Option<&[f64]> {
        self.groups
            .values()
            .find(|g| g.check().is_ok())
            .map(|g| g.time.as_slice())
    }

    /// Check that all well-formed groups share one sampling grid.
    ///
    /// Malformed groups are left for the analyses to skip individually.
    ///
    /// # Errors
    ///
    /// - [`StatError::MissingField`] if no group is usable
    /// - [`StatError::TimeGridMismatch`] if two groups disagree on the grid
    pub fn validate(&self) -> Result<(), StatError> {
        let reference = self
            .time_grid()
            .ok_or_else(|| StatError::missing(format!("usable trial groups in session {}", self.index)))?;

        for group in self.groups.values().filter(|g| g.check().is_ok()) {
            if group.time.len() != reference.len() {
                return Err(StatError::TimeGridMismatch {
                    expected: reference.len(),
                    found: group.time.len(),
                });
            }
            let tolerance = 1e-9 * reference.iter().fold(1.0_f64, |m, t| m.max(t.abs()));
            if group
                .time
                .iter()
                .zip(reference)
                .any(|(a, b)| (a - b).abs() > tolerance)
            {
                return Err(StatError::InvalidInput(format!(
                    "contrast {}% is sampled on a different time grid",
                    group.contrast
                )));
            }
        }

        Ok(())
    }
}

/// An ordered collection of sessions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Sessions in recording order.
    pub sessions: Vec<Session>,
}

impl Dataset {
    /// Create a dataset from sessions.
    pub fn new(sessions: Vec<Session>) -> Self {
        Self { sessions }
    }

    /// Number of sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the dataset has no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Session with the given index.
    pub fn session(&self, index: usize) -> Option<&Session> {
        self.sessions.iter().find(|s| s.index == index)
    }
}
