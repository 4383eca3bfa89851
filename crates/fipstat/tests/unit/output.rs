//! JSON rendering of reports.

use fipstat::output::{to_json, to_json_pretty};
use fipstat::{
    analyze_session, analyze_sessions, AnalysisConfig, BatchReport, SessionOutcome, SessionReport,
    StatError, TrialCategory,
};

use crate::support;

#[test]
fn session_report_json_fields() {
    let report = analyze_session(&support::session(0, 0.0), &AnalysisConfig::default()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&to_json(&report).unwrap()).unwrap();

    assert_eq!(value["index"], 0);
    assert_eq!(value["category"], "hit");
    assert_eq!(value["threshold"]["defaulted"], false);
    assert_eq!(value["contrasts"].as_array().unwrap().len(), 5);
    assert!(value["contrast_regression"]["b1"].as_f64().is_some());
    assert!(value["warnings"].is_array());
}

#[test]
fn batch_report_json_outcome_layout() {
    let sessions = vec![support::session(0, 0.0), support::broken_session(1)];
    let batch = analyze_sessions(&sessions, &AnalysisConfig::default()).unwrap();
    let pretty = to_json_pretty(&batch).unwrap();
    assert!(pretty.contains('\n'));

    let value: serde_json::Value = serde_json::from_str(&pretty).unwrap();
    let outcomes = value["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].get("Analyzed").is_some());
    assert_eq!(outcomes[1]["Skipped"]["index"], 1);
    assert!(outcomes[1]["Skipped"]["reason"].get("TimeGridMismatch").is_some());
}

/// Session whose first 50% trial is flat zero across the US window.
fn session_with_zero_us_peak() -> fipstat::Session {
    let mut group = support::contrast_group(50, 6, 0.0);
    for j in 0..group.time.len() {
        if (1.0..=1.5).contains(&group.time[j]) {
            group.trials[(0, j)] = 0.0;
        }
    }
    support::session(0, 0.0).with_group(TrialCategory::Hit, group)
}

#[test]
fn session_report_reads_back_with_undefined_ratios() {
    let report = analyze_session(&session_with_zero_us_peak(), &AnalysisConfig::default()).unwrap();
    let ratios = report.contrast(50).unwrap().ratios.as_ref().unwrap();
    assert!(ratios.raw[0].is_nan());

    let json = to_json(&report).unwrap();
    assert!(json.contains("null"));

    let back: SessionReport = serde_json::from_str(&json).unwrap();
    let back_ratios = back.contrast(50).unwrap().ratios.as_ref().unwrap();
    assert!(back_ratios.raw[0].is_nan());
    assert_eq!(back_ratios.used, ratios.used);
    assert_eq!(back.contrasts.len(), report.contrasts.len());
    assert_eq!(back.warnings, report.warnings);

    assert_eq!(to_json(&back).unwrap(), json);
}

#[test]
fn batch_report_reads_back() {
    let sessions = vec![
        session_with_zero_us_peak(),
        support::broken_session(1),
        support::session(2, 1.0),
        support::session(3, 1.5),
    ];
    let batch = analyze_sessions(&sessions, &AnalysisConfig::default()).unwrap();
    let json = to_json_pretty(&batch).unwrap();

    let back: BatchReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back.outcomes.len(), 4);
    assert_eq!(back.analyzed_count(), 3);
    assert!(matches!(
        &back.outcomes[1],
        SessionOutcome::Skipped { index: 1, reason: StatError::TimeGridMismatch { .. } }
    ));
    assert_eq!(
        back.session_trend.as_ref().map(|t| t.contrast),
        batch.session_trend.as_ref().map(|t| t.contrast)
    );
    assert_eq!(back.warnings, batch.warnings);

    assert_eq!(to_json_pretty(&back).unwrap(), json);
}
