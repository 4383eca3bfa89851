//! Batch orchestration: skip-and-continue and the cross-session trend.

use fipstat::{
    analyze_sessions, AnalysisConfig, AnalysisStage, AnalysisWarning, BatchError, SessionOutcome,
    StatError, ThresholdPolicy,
};
use proptest::prelude::*;

use crate::support;

#[test]
fn empty_batch_is_an_error() {
    let err = analyze_sessions(&[], &AnalysisConfig::default()).unwrap_err();
    assert_eq!(err, BatchError::EmptyCollection);
}

#[test]
fn invalid_config_is_an_error() {
    let mut config = AnalysisConfig::default();
    config.alpha = 0.0;
    let err = analyze_sessions(&[support::session(0, 0.0)], &config).unwrap_err();
    assert!(matches!(err, BatchError::Config(_)));
}

#[test]
fn broken_session_is_skipped_and_batch_continues() {
    let sessions = vec![
        support::session(0, 0.0),
        support::broken_session(1),
        support::session(2, 1.0),
        support::session(3, 1.5),
    ];
    let batch = analyze_sessions(&sessions, &AnalysisConfig::default()).unwrap();

    let indices: Vec<usize> = batch.outcomes.iter().map(SessionOutcome::index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
    assert_eq!(batch.analyzed_count(), 3);
    assert_eq!(batch.skipped_count(), 1);
    assert!(matches!(
        &batch.outcomes[1],
        SessionOutcome::Skipped { index: 1, reason: StatError::TimeGridMismatch { .. } }
    ));
    assert!(batch.warnings.iter().any(|w| matches!(
        w,
        AnalysisWarning::SessionSkipped { session: 1, .. }
    )));

    // session warnings remain attributable
    assert!(batch
        .all_warnings()
        .filter_map(AnalysisWarning::session)
        .all(|s| s <= 3));
}

#[test]
fn session_trend_tracks_highest_common_contrast() {
    let sessions: Vec<_> = (0..4).map(|i| support::session(i, 0.5 * i as f64)).collect();
    let batch = analyze_sessions(&sessions, &AnalysisConfig::default()).unwrap();
    let trend = batch.session_trend.as_ref().unwrap();

    assert_eq!(trend.contrast, 100);
    assert_eq!(trend.sessions, vec![0, 1, 2, 3]);
    assert!((trend.fit.b1 - 0.5).abs() < 1e-9);
    assert!(trend.fit.significant);
    assert!((trend.mean_peaks[1] - trend.mean_peaks[0] - 0.5).abs() < 1e-9);
}

#[test]
fn session_trend_with_explicit_contrast() {
    let sessions: Vec<_> = (0..3).map(|i| support::session(i, 0.2 * i as f64)).collect();
    let config = AnalysisConfig::default().with_trend_contrast(25);
    let batch = analyze_sessions(&sessions, &config).unwrap();

    let trend = batch.session_trend.unwrap();
    assert_eq!(trend.contrast, 25);
    assert!((trend.fit.b1 - 0.2).abs() < 1e-9);
}

#[test]
fn explicit_trend_contrast_warns_for_sessions_without_it() {
    let mut sessions: Vec<_> = (0..4).map(|i| support::session(i, 0.2 * i as f64)).collect();
    sessions[1] = support::CONTRASTS
        .iter()
        .filter(|&&c| c != 25)
        .fold(
            fipstat::Session::new(1, "2024-03-02").with_threshold(0.2),
            |s, &c| {
                s.with_group(
                    fipstat::TrialCategory::Hit,
                    support::contrast_group(c, support::trials_for(c), 0.2),
                )
            },
        );
    let config = AnalysisConfig::default().with_trend_contrast(25);
    let batch = analyze_sessions(&sessions, &config).unwrap();

    let trend = batch.session_trend.as_ref().unwrap();
    assert_eq!(trend.sessions, vec![0, 2, 3]);
    assert!((trend.fit.b1 - 0.2).abs() < 1e-9);

    let dropped: Vec<_> = batch
        .warnings
        .iter()
        .filter(|w| matches!(
            w,
            AnalysisWarning::ContrastSkipped {
                contrast: 25,
                stage: AnalysisStage::SessionTrend,
                reason: StatError::MissingField { .. },
                ..
            }
        ))
        .collect();
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0].session(), Some(1));
}

#[test]
fn too_few_sessions_skip_the_trend() {
    let sessions = vec![support::session(0, 0.0), support::session(1, 0.5)];
    let batch = analyze_sessions(&sessions, &AnalysisConfig::default()).unwrap();

    assert!(batch.session_trend.is_none());
    assert!(batch.warnings.iter().any(|w| matches!(
        w,
        AnalysisWarning::StageSkipped {
            session: None,
            stage: AnalysisStage::SessionTrend,
            reason: StatError::InsufficientData { got: 2, min: 3, .. },
        }
    )));
}

#[test]
fn required_threshold_skips_only_that_session() {
    let mut sessions: Vec<_> = (0..3).map(|i| support::session(i, 0.0)).collect();
    sessions[2].threshold = None;
    let config = AnalysisConfig::default().with_threshold_policy(ThresholdPolicy::Require);

    let batch = analyze_sessions(&sessions, &config).unwrap();
    assert_eq!(batch.analyzed_count(), 2);
    assert!(matches!(
        &batch.outcomes[2],
        SessionOutcome::Skipped { index: 2, reason: StatError::InvalidThreshold(_) }
    ));
    // fatal to its own session only
    assert!(batch.outcomes[2].report().is_none());
    assert!(batch.warnings.iter().any(|w| matches!(
        w,
        AnalysisWarning::SessionSkipped { session: 2, reason } if !reason.is_recoverable()
    )));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Every input session yields exactly one outcome, in input order.
    #[test]
    fn outcomes_follow_input_order(broken in prop::collection::vec(any::<bool>(), 1..6)) {
        let sessions: Vec<_> = broken
            .iter()
            .enumerate()
            .map(|(i, &b)| if b { support::broken_session(i) } else { support::session(i, 0.0) })
            .collect();
        let batch = analyze_sessions(&sessions, &AnalysisConfig::default()).unwrap();

        prop_assert_eq!(batch.outcomes.len(), sessions.len());
        for (i, (outcome, &b)) in batch.outcomes.iter().zip(&broken).enumerate() {
            prop_assert_eq!(outcome.index(), i);
            prop_assert_eq!(outcome.report().is_none(), b);
        }
    }
}
