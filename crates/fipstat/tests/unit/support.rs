//! Synthetic sessions with a known contrast response.
//!
//! Each trial is a CS bump at 0.3 s whose height grows with contrast, plus a
//! fixed US bump at 1.2 s and a small per-trial offset.

#![allow(dead_code)]

use fipstat::{BehaviorRecord, ContrastBehavior, ContrastTrialGroup, Session, TrialCategory, TrialMatrix};
use fipstat_core::contrast_proportion;

pub const CONTRASTS: [u32; 5] = [5, 12, 25, 50, 100];

/// 0.0 to 2.0 s at 10 Hz.
pub fn time_grid() -> Vec<f64> {
    (0..=20).map(|i| i as f64 * 0.1).collect()
}

fn bump(t: f64, center: f64) -> f64 {
    (-((t - center) / 0.1).powi(2)).exp()
}

/// Per-trial offset, identical across contrasts and sessions.
pub fn jitter(trial: usize) -> f64 {
    0.01 * ((trial * 7 + 9) % 5) as f64
}

/// CS peak height for a contrast.
pub fn gain(contrast: u32, boost: f64) -> f64 {
    1.0 + 2.0 * contrast_proportion(contrast) + boost
}

/// 12% has only two trials; everything else has six.
pub fn trials_for(contrast: u32) -> usize {
    if contrast == 12 {
        2
    } else {
        6
    }
}

pub fn contrast_group(contrast: u32, trials: usize, boost: f64) -> ContrastTrialGroup {
    let time = time_grid();
    let g = gain(contrast, boost);
    let matrix = TrialMatrix::from_fn(trials, time.len(), |i, j| {
        g * bump(time[j], 0.3) + 0.5 * bump(time[j], 1.2) + jitter(i)
    });
    ContrastTrialGroup::new(contrast, matrix, time).unwrap()
}

/// Hit time of trial `trial` at the `k`-th contrast.
pub fn event_time(k: usize, trial: usize) -> f64 {
    1.0 + 10.0 * (trial * 5 + k) as f64
}

pub fn behavior() -> BehaviorRecord {
    CONTRASTS
        .iter()
        .enumerate()
        .fold(BehaviorRecord::new(), |record, (k, &contrast)| {
            let n = trials_for(contrast);
            record.with_contrast(
                contrast,
                ContrastBehavior {
                    hit_times: (0..n).map(|i| event_time(k, i)).collect(),
                    miss_times: Vec::new(),
                    reaction_times: (0..n).map(|i| 0.3 + 0.01 * i as f64).collect(),
                },
            )
        })
}

/// Session with every contrast, threshold 0.2 and aligned event times.
pub fn session(index: usize, boost: f64) -> Session {
    CONTRASTS.iter().fold(
        Session::new(index, format!("2024-03-{:02}", index + 1))
            .with_threshold(0.2)
            .with_behavior(behavior()),
        |s, &c| s.with_group(TrialCategory::Hit, contrast_group(c, trials_for(c), boost)),
    )
}

/// Session whose groups disagree on the time grid.
pub fn broken_session(index: usize) -> Session {
    let short = ContrastTrialGroup::new(50, TrialMatrix::zeros(3, 4), vec![0.0, 0.5, 1.0, 1.5]).unwrap();
    session(index, 0.0).with_group(TrialCategory::Hit, short)
}
