//! Full single-session analysis.

use fipstat::{
    analyze_session, AnalysisConfig, AnalysisStage, AnalysisWarning, StatError, TrialCategory,
};

use crate::support::{self, CONTRASTS};

#[test]
fn contrast_summaries_cover_every_group() {
    let report = analyze_session(&support::session(0, 0.0), &AnalysisConfig::default()).unwrap();

    assert_eq!(report.index, 0);
    assert_eq!(report.category, TrialCategory::Hit);
    assert_eq!(report.time.len(), 21);
    let contrasts: Vec<u32> = report.contrasts.iter().map(|c| c.contrast).collect();
    assert_eq!(contrasts, CONTRASTS.to_vec());

    let full = report.contrast(100).unwrap();
    assert_eq!(full.n_trials, 6);
    assert!((full.proportion - 1.0).abs() < 1e-12);

    let trace = full.trace.as_ref().unwrap();
    assert_eq!(trace.mean.len(), 21);
    assert_eq!(trace.smoothed_mean.as_ref().unwrap().len(), 21);

    let cs = full.cs_peak.unwrap();
    assert_eq!(cs.value.n, 6);
    assert!((cs.time.mean - 0.3).abs() < 1e-9);
    // gain 3 plus the mean per-trial offset
    assert!((cs.value.mean - (3.0 + 0.14 / 6.0)).abs() < 1e-9);

    let us = full.us_peak.unwrap();
    assert!((us.time.mean - 1.2).abs() < 1e-9);

    let ratio = full.ratio.unwrap();
    assert_eq!(ratio.excluded, 0);
    assert!(ratio.ratio.mean > 5.0);

    let rt = full.reaction_time.unwrap();
    assert_eq!(rt.n, 6);
}

#[test]
fn threshold_split_pools_whole_contrasts() {
    let report = analyze_session(&support::session(0, 0.0), &AnalysisConfig::default()).unwrap();
    let split = report.threshold_split.as_ref().unwrap();

    assert!(!report.threshold.defaulted);
    assert_eq!(split.threshold, 0.2);
    assert_eq!(split.above_contrasts, vec![25, 50, 100]);
    assert_eq!(split.below_contrasts, vec![5, 12]);
    assert_eq!(split.above.as_ref().unwrap().n_trials, 18);
    assert_eq!(split.below.as_ref().unwrap().n_trials, 8);

    let above = split.above.as_ref().unwrap().cs_peak.unwrap().value.mean;
    let below = split.below.as_ref().unwrap().cs_peak.unwrap().value.mean;
    assert!(above > below);
}

#[test]
fn contrast_regression_recovers_gain() {
    let report = analyze_session(&support::session(0, 0.0), &AnalysisConfig::default()).unwrap();
    let fit = report.contrast_regression.unwrap();

    assert_eq!(fit.n, 26);
    assert!((fit.b1 - 2.0).abs() < 0.1, "slope {}", fit.b1);
    assert!((fit.b0 - 1.0).abs() < 0.1, "intercept {}", fit.b0);
    assert!(fit.significant);
    assert!(fit.p_value < 1e-6);
}

#[test]
fn peak_times_are_fitted_and_binned() {
    let report = analyze_session(&support::session(0, 0.0), &AnalysisConfig::default()).unwrap();

    let fit = report.peak_time_fit.unwrap();
    assert_eq!(fit.n, 26);
    assert!((fit.mean - 0.3).abs() < 1e-9);
    assert!(fit.std_dev < 1e-9);

    let hist = report.peak_time_histogram.as_ref().unwrap();
    assert_eq!(hist.counts.len(), 10);
    assert_eq!(hist.counts.iter().sum::<usize>(), 26);
    assert_eq!(hist.outside, 0);
    assert_eq!(hist.counts[6], 26);
}

#[test]
fn early_late_by_order_and_time() {
    let report = analyze_session(&support::session(0, 0.0), &AnalysisConfig::default()).unwrap();

    // 12% has two trials: neither split is possible
    let contrasts: Vec<u32> = report.early_late.iter().map(|e| e.contrast).collect();
    assert_eq!(contrasts, vec![5, 25, 50, 100]);

    let five = &report.early_late[0];
    let order = five.by_order.as_ref().unwrap();
    assert_eq!(order.early.n_trials, 3);
    assert_eq!(order.late.n_trials, 3);

    let timed = five.by_time.as_ref().unwrap();
    assert!(!timed.fallback_used);
    assert_eq!(timed.median_time, 136.0);
    assert_eq!(timed.groups.early.n_trials, 3);

    let full = report.early_late.iter().find(|e| e.contrast == 100).unwrap();
    let timed = full.by_time.as_ref().unwrap();
    assert_eq!(timed.groups.early.n_trials, 2);
    assert_eq!(timed.groups.late.n_trials, 4);

    assert!(report.warnings.iter().any(|w| matches!(
        w,
        AnalysisWarning::ContrastSkipped {
            contrast: 12,
            stage: AnalysisStage::OrderSplit,
            reason: StatError::InsufficientData { got: 2, min: 4, .. },
            ..
        }
    )));
    assert!(!report.has_undermining_warnings());
}

#[test]
fn session_without_behaviour_skips_time_split_quietly() {
    let mut session = support::session(0, 0.0);
    session.behavior = Default::default();
    let report = analyze_session(&session, &AnalysisConfig::default()).unwrap();

    assert!(report.early_late.iter().all(|e| e.by_time.is_none()));
    assert!(report
        .warnings
        .iter()
        .all(|w| !matches!(w, AnalysisWarning::StageSkipped { stage: AnalysisStage::TimeSplit, .. })));
    assert!(report.contrast(100).unwrap().reaction_time.is_none());
}

#[test]
fn malformed_group_is_skipped_not_fatal() {
    let mut session = support::session(0, 0.0);
    let empty = fipstat::ContrastTrialGroup {
        contrast: 75,
        trials: fipstat::TrialMatrix::zeros(0, 21),
        time: support::time_grid(),
    };
    session.insert_group(TrialCategory::Hit, empty);

    let report = analyze_session(&session, &AnalysisConfig::default()).unwrap();
    assert!(report.contrast(75).is_none());
    assert_eq!(report.contrasts.len(), 5);
    assert!(report.warnings.iter().any(|w| matches!(
        w,
        AnalysisWarning::ContrastSkipped { contrast: 75, stage: AnalysisStage::Aggregate, .. }
    )));
    assert!(report.warnings.iter().any(|w| matches!(
        w,
        AnalysisWarning::ContrastSkipped { contrast: 75, stage: AnalysisStage::ThresholdSplit, .. }
    )));
}

#[test]
fn missing_category_fails_session() {
    let config = AnalysisConfig::default().with_category(TrialCategory::Miss);
    let err = analyze_session(&support::session(0, 0.0), &config).unwrap_err();
    assert!(matches!(err, StatError::MissingField { .. }));
}

#[test]
fn time_grid_mismatch_fails_session() {
    let err = analyze_session(&support::broken_session(3), &AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, StatError::TimeGridMismatch { expected: 21, found: 4 }));
}
