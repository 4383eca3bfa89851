//! Threshold resolution and the above/below split.

use fipstat::{
    analyze_session, AnalysisConfig, AnalysisWarning, Session, StatError, ThresholdPolicy,
    TrialCategory,
};

use crate::support;

fn two_contrast_session(threshold: Option<f64>) -> Session {
    let mut session = Session::new(0, "2024-03-01")
        .with_group(TrialCategory::Hit, support::contrast_group(5, 2, 0.0))
        .with_group(TrialCategory::Hit, support::contrast_group(15, 3, 0.0));
    session.threshold = threshold;
    session
}

#[test]
fn split_at_ten_percent() {
    let report = analyze_session(&two_contrast_session(Some(0.1)), &AnalysisConfig::default()).unwrap();
    let split = report.threshold_split.unwrap();

    assert_eq!(split.above.unwrap().n_trials, 3);
    assert_eq!(split.below.unwrap().n_trials, 2);
    assert_eq!(split.above_contrasts, vec![15]);
    assert_eq!(split.below_contrasts, vec![5]);
}

#[test]
fn threshold_equal_to_contrast_goes_below() {
    let report = analyze_session(&two_contrast_session(Some(0.15)), &AnalysisConfig::default()).unwrap();
    let split = report.threshold_split.unwrap();

    assert!(split.above.is_none());
    assert!(split.above_contrasts.is_empty());
    assert_eq!(split.below.unwrap().n_trials, 5);
}

#[test]
fn missing_threshold_defaults_with_warning() {
    let report = analyze_session(&two_contrast_session(None), &AnalysisConfig::default()).unwrap();

    assert!(report.threshold.defaulted);
    assert_eq!(report.threshold.value, 0.1);
    assert!(matches!(
        report.warnings[0],
        AnalysisWarning::ThresholdDefaulted { session: 0, found: None, used } if used == 0.1
    ));
    assert!(report.has_undermining_warnings());
}

#[test]
fn invalid_threshold_defaults_with_warning() {
    let config = AnalysisConfig::default().with_threshold_policy(ThresholdPolicy::Default(0.3));
    let report = analyze_session(&two_contrast_session(Some(1.5)), &config).unwrap();

    assert_eq!(report.threshold.value, 0.3);
    assert!(matches!(
        report.warnings[0],
        AnalysisWarning::ThresholdDefaulted { found: Some(f), .. } if f == 1.5
    ));
}

#[test]
fn required_threshold_fails_session() {
    let config = AnalysisConfig::default().with_threshold_policy(ThresholdPolicy::Require);

    let err = analyze_session(&two_contrast_session(None), &config).unwrap_err();
    assert!(matches!(err, StatError::InvalidThreshold(v) if v.is_nan()));
    assert!(!err.is_recoverable());

    let err = analyze_session(&two_contrast_session(Some(-0.2)), &config).unwrap_err();
    assert_eq!(err, StatError::InvalidThreshold(-0.2));

    assert!(analyze_session(&two_contrast_session(Some(0.1)), &config).is_ok());
}
