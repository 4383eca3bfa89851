//! Configuration for session and batch analyses.

use serde::{Deserialize, Serialize};

use fipstat_core::constants::{
    DEFAULT_ALPHA, DEFAULT_CS_END, DEFAULT_CS_START, DEFAULT_SMOOTHING_WINDOW, DEFAULT_THRESHOLD,
    DEFAULT_US_END, DEFAULT_US_START,
};
use fipstat_core::split::validate_threshold;
use fipstat_core::{MismatchPolicy, StatError, TrialCategory, Window};

/// How a session without a usable psychometric threshold is handled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ThresholdPolicy {
    /// Substitute the given proportion and record a warning.
    Default(f64),
    /// Refuse the session with [`StatError::InvalidThreshold`].
    Require,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        ThresholdPolicy::Default(DEFAULT_THRESHOLD)
    }
}

impl std::fmt::Display for ThresholdPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThresholdPolicy::Default(t) => write!(f, "default to {:.2}", t),
            ThresholdPolicy::Require => write!(f, "require"),
        }
    }
}

/// Threshold actually used for a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedThreshold {
    /// Proportion in [0, 1].
    pub value: f64,
    /// Whether the policy default replaced a missing or invalid value.
    pub defaulted: bool,
}

impl ThresholdPolicy {
    /// Resolve a session's threshold under this policy.
    ///
    /// # Errors
    ///
    /// [`StatError::InvalidThreshold`] under [`ThresholdPolicy::Require`] when
    /// the session threshold is absent or outside [0, 1]. An absent value is
    /// reported as NaN.
    pub fn resolve(&self, session_threshold: Option<f64>) -> Result<ResolvedThreshold, StatError> {
        let checked = session_threshold.map(validate_threshold);
        match (checked, self) {
            (Some(Ok(value)), _) => Ok(ResolvedThreshold {
                value,
                defaulted: false,
            }),
            (_, ThresholdPolicy::Default(value)) => Ok(ResolvedThreshold {
                value: *value,
                defaulted: true,
            }),
            (Some(Err(e)), ThresholdPolicy::Require) => Err(e),
            (None, ThresholdPolicy::Require) => Err(StatError::InvalidThreshold(f64::NAN)),
        }
    }
}

/// Main configuration for session analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Conditioned-stimulus window (seconds relative to stimulus onset).
    ///
    /// Default: [0.0, 0.5]
    pub cs_window: Window,

    /// Unconditioned-stimulus (reward) window.
    ///
    /// Default: [1.0, 1.5]
    pub us_window: Window,

    /// Moving-average window applied to mean and SEM traces, in samples.
    ///
    /// Default: Some(5). `None` disables smoothing.
    pub smoothing_window: Option<usize>,

    /// Handling of missing or invalid session thresholds.
    ///
    /// Default: `Default(0.1)`
    pub threshold_policy: ThresholdPolicy,

    /// Handling of trial rows that cannot be aligned with event times.
    ///
    /// Default: `Skip`, overridable with `FIPSTAT_MISMATCH_POLICY`.
    pub mismatch_policy: MismatchPolicy,

    /// Significance level for the slope Wald tests.
    ///
    /// Default: 0.05
    pub alpha: f64,

    /// Trial category analysed.
    ///
    /// Default: Hit
    pub category: TrialCategory,

    /// Number of histogram bins spanning the CS window for peak times.
    ///
    /// Default: 10
    pub peak_time_bins: usize,

    /// Contrast tracked across sessions. `None` picks the highest contrast
    /// present in every analysed session.
    ///
    /// Default: None
    pub trend_contrast: Option<u32>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cs_window: Window {
                start: DEFAULT_CS_START,
                end: DEFAULT_CS_END,
            },
            us_window: Window {
                start: DEFAULT_US_START,
                end: DEFAULT_US_END,
            },
            smoothing_window: Some(DEFAULT_SMOOTHING_WINDOW),
            threshold_policy: ThresholdPolicy::default(),
            mismatch_policy: MismatchPolicy::from_env_or(MismatchPolicy::Skip),
            alpha: DEFAULT_ALPHA,
            category: TrialCategory::Hit,
            peak_time_bins: 10,
            trend_contrast: None,
        }
    }
}

impl AnalysisConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the CS window.
    ///
    /// # Panics
    ///
    /// Panics if the bounds are reversed or not finite.
    pub fn with_cs_window(mut self, start: f64, end: f64) -> Self {
        assert!(
            start.is_finite() && end.is_finite() && start <= end,
            "cs window must be finite with start <= end"
        );
        self.cs_window = Window { start, end };
        self
    }

    /// Set the US window.
    ///
    /// # Panics
    ///
    /// Panics if the bounds are reversed or not finite.
    pub fn with_us_window(mut self, start: f64, end: f64) -> Self {
        assert!(
            start.is_finite() && end.is_finite() && start <= end,
            "us window must be finite with start <= end"
        );
        self.us_window = Window { start, end };
        self
    }

    /// Set the smoothing window in samples.
    ///
    /// # Panics
    ///
    /// Panics if `window` is zero.
    pub fn with_smoothing(mut self, window: usize) -> Self {
        assert!(window > 0, "smoothing window must be at least 1");
        self.smoothing_window = Some(window);
        self
    }

    /// Disable smoothing.
    pub fn without_smoothing(mut self) -> Self {
        self.smoothing_window = None;
        self
    }

    /// Set the threshold policy.
    pub fn with_threshold_policy(mut self, policy: ThresholdPolicy) -> Self {
        self.threshold_policy = policy;
        self
    }

    /// Set the mismatch policy.
    pub fn with_mismatch_policy(mut self, policy: MismatchPolicy) -> Self {
        self.mismatch_policy = policy;
        self
    }

    /// Set the significance level.
    ///
    /// # Panics
    ///
    /// Panics if `alpha` is not in (0, 1).
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha < 1.0, "alpha must be in (0, 1)");
        self.alpha = alpha;
        self
    }

    /// Set the trial category.
    pub fn with_category(mut self, category: TrialCategory) -> Self {
        self.category = category;
        self
    }

    /// Set the number of peak-time histogram bins.
    ///
    /// # Panics
    ///
    /// Panics if `bins` is zero.
    pub fn with_peak_time_bins(mut self, bins: usize) -> Self {
        assert!(bins > 0, "peak time histogram needs at least one bin");
        self.peak_time_bins = bins;
        self
    }

    /// Track one contrast across sessions.
    pub fn with_trend_contrast(mut self, contrast: u32) -> Self {
        self.trend_contrast = Some(contrast);
        self
    }

    /// Validate settings that may have been set directly or deserialized.
    pub fn validate(&self) -> Result<(), String> {
        for (name, w) in [("cs", &self.cs_window), ("us", &self.us_window)] {
            if Window::new(w.start, w.end).is_err() {
                return Err(format!("{} window [{}, {}] is invalid", name, w.start, w.end));
            }
        }
        if self.smoothing_window == Some(0) {
            return Err("smoothing window must be at least 1".to_string());
        }
        if let ThresholdPolicy::Default(t) = self.threshold_policy {
            if validate_threshold(t).is_err() {
                return Err(format!("default threshold {} is not a proportion", t));
            }
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(format!("alpha {} must be in (0, 1)", self.alpha));
        }
        if self.peak_time_bins == 0 {
            return Err("peak time histogram needs at least one bin".to_string());
        }
        Ok(())
    }
}
