//! Loading datasets from disk and analysing them.

use std::io::Write;

use fipstat::data::{load_dataset_json, load_trial_matrix_csv, DataError};
use fipstat::{analyze_session, analyze_sessions, AnalysisConfig, ContrastKey, Session, TrialCategory};
use serde_json::json;

use crate::support::{self, CONTRASTS};

fn rows(group: &fipstat::ContrastTrialGroup) -> Vec<Vec<f64>> {
    group
        .trials
        .row_iter()
        .map(|r| r.iter().copied().collect())
        .collect()
}

fn session_json(index: usize, boost: f64) -> serde_json::Value {
    let groups: Vec<_> = CONTRASTS
        .iter()
        .map(|&c| {
            let group = support::contrast_group(c, support::trials_for(c), boost);
            json!({
                "category": "hit",
                "contrast": c,
                "time": group.time,
                "trials": rows(&group),
            })
        })
        .collect();
    json!({
        "index": index,
        "date": format!("2024-04-{:02}", index + 1),
        "threshold": 0.2,
        "groups": groups,
        "behavior": support::behavior(),
    })
}

fn temp_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn json_dataset_matches_in_memory_sessions() {
    let dataset = json!({
        "sessions": [session_json(0, 0.0), session_json(1, 0.5), session_json(2, 1.0)]
    });
    let file = temp_file(&dataset.to_string());

    let loaded = load_dataset_json(file.path()).unwrap();
    assert_eq!(loaded.len(), 3);

    let expected = support::session(0, 0.0);
    let session = loaded.session(0).unwrap();
    assert_eq!(session.threshold, Some(0.2));
    assert_eq!(
        session.behavior.pooled_event_times(),
        expected.behavior.pooled_event_times()
    );
    let got = session.group(ContrastKey::hit(50)).unwrap();
    let want = expected.group(ContrastKey::hit(50)).unwrap();
    assert_eq!(got.trials.shape(), want.trials.shape());
    assert!(got.trials.iter().zip(want.trials.iter()).all(|(a, b)| (a - b).abs() < 1e-12));
    assert!(got.time.iter().zip(&want.time).all(|(a, b)| (a - b).abs() < 1e-12));

    let batch = analyze_sessions(&loaded.sessions, &AnalysisConfig::default()).unwrap();
    assert_eq!(batch.analyzed_count(), 3);
    assert!(batch.session_trend.is_some());
}

#[test]
fn json_dataset_missing_file() {
    let err = load_dataset_json(std::path::Path::new("/nonexistent/fipstat.json")).unwrap_err();
    assert!(matches!(err, DataError::Io(_)));
}

#[test]
fn csv_group_feeds_a_session() {
    let original = support::contrast_group(50, 6, 0.0);
    let mut csv = String::from("# 50% hits\ntime");
    for t in &original.time {
        csv.push_str(&format!(",{}", t));
    }
    csv.push('\n');
    for (i, row) in rows(&original).iter().enumerate() {
        csv.push_str(&format!("trial{}", i + 1));
        for v in row {
            csv.push_str(&format!(",{}", v));
        }
        csv.push('\n');
    }
    let file = temp_file(&csv);

    let group = load_trial_matrix_csv(file.path(), 50).unwrap();
    assert_eq!(group, original);

    let session = Session::new(7, "2024-05-01")
        .with_threshold(0.3)
        .with_group(TrialCategory::Hit, group);
    let report = analyze_session(&session, &AnalysisConfig::default()).unwrap();
    assert_eq!(report.index, 7);
    assert_eq!(report.contrasts.len(), 1);
    // a single contrast cannot support the contrast regression
    assert!(report.contrast_regression.is_none());
}
