//! Ordinary least squares with a Wald test on the slope, plus normal fits.
//!
//! The linear model is `y = b0 + b1 * x + e` with design matrix `[1 | x]`.
//! Coefficients come from the centered normal equations; the coefficient
//! covariance is `sigma^2 (X^T X)^-1` with `sigma^2 = SSR / (n - 2)`.
//!
//! The slope is tested with the Wald statistic `W = (b1 / se(b1))^2` against
//! a chi-squared distribution with one degree of freedom.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::constants::{DEFAULT_ALPHA, MIN_NORMAL_SAMPLES, MIN_REGRESSION_POINTS};
use crate::error::StatError;
use crate::types::{Matrix2, Vector2};

/// Result of [`fit_linear`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    /// Intercept.
    #[serde(with = "crate::nonfinite::scalar")]
    pub b0: f64,
    /// Slope.
    #[serde(with = "crate::nonfinite::scalar")]
    pub b1: f64,
    /// Residual variance, SSR / (n - 2).
    #[serde(with = "crate::nonfinite::scalar")]
    pub residual_variance: f64,
    /// Standard error of the intercept.
    #[serde(with = "crate::nonfinite::scalar")]
    pub intercept_se: f64,
    /// Standard error of the slope.
    #[serde(with = "crate::nonfinite::scalar")]
    pub slope_se: f64,
    /// Wald statistic (b1 / se(b1))^2.
    #[serde(with = "crate::nonfinite::scalar")]
    pub wald: f64,
    /// P-value, 1 - CDF(chi2_1, wald).
    #[serde(with = "crate::nonfinite::scalar")]
    pub p_value: f64,
    /// Whether `p_value < alpha`.
    pub significant: bool,
    /// Number of points fitted.
    pub n: usize,
}

impl RegressionResult {
    /// Predicted response at `x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.b0 + self.b1 * x
    }

    /// Coefficients as a vector `[b0, b1]`.
    pub fn coefficients(&self) -> Vector2 {
        Vector2::new(self.b0, self.b1)
    }
}

/// Result of [`fit_normal`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalFit {
    /// Sample mean.
    #[serde(with = "crate::nonfinite::scalar")]
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator).
    #[serde(with = "crate::nonfinite::scalar")]
    pub std_dev: f64,
    /// Number of samples.
    pub n: usize,
}

/// Bin counts over fixed edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// Bin edges, `counts.len() + 1` of them.
    pub edges: Vec<f64>,
    /// Samples per bin.
    pub counts: Vec<usize>,
    /// Samples outside `[edges[0], edges[last]]` or non-finite.
    pub outside: usize,
}

/// Fit `y = b0 + b1 * x` by ordinary least squares at the default
/// significance level.
pub fn fit_linear(x: &[f64], y: &[f64]) -> Result<RegressionResult, StatError> {
    fit_linear_with_alpha(x, y, DEFAULT_ALPHA)
}

/// Fit `y = b0 + b1 * x` and flag the slope significant when `p < alpha`.
///
/// # Errors
///
/// - [`StatError::InvalidInput`] for unequal lengths or non-finite values
/// - [`StatError::InsufficientData`] for fewer than three points
/// - [`StatError::SingularDesign`] when every `x` is identical
pub fn fit_linear_with_alpha(x: &[f64], y: &[f64], alpha: f64) -> Result<RegressionResult, StatError> {
    if x.len() != y.len() {
        return Err(StatError::InvalidInput(format!(
            "predictor has {} values, response has {}",
            x.len(),
            y.len()
        )));
    }
    let n = x.len();
    if n < MIN_REGRESSION_POINTS {
        return Err(StatError::insufficient("linear regression", n, MIN_REGRESSION_POINTS));
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(StatError::InvalidInput(
            "regression inputs must be finite".to_string(),
        ));
    }

    let nf = n as f64;
    let x_mean = x.iter().sum::<f64>() / nf;
    let y_mean = y.iter().sum::<f64>() / nf;

    let sxx: f64 = x.iter().map(|xi| (xi - x_mean) * (xi - x_mean)).sum();
    let sxy: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (xi - x_mean) * (yi - y_mean))
        .sum();

    if sxx == 0.0 {
        return Err(StatError::SingularDesign);
    }

    // X^T X for the design [1 | x]
    let sum_x = x_mean * nf;
    let sum_xx: f64 = x.iter().map(|xi| xi * xi).sum();
    let xtx = Matrix2::new(nf, sum_x, sum_x, sum_xx);
    let xtx_inv = xtx.try_inverse().ok_or(StatError::SingularDesign)?;

    let b1 = sxy / sxx;
    let b0 = y_mean - b1 * x_mean;

    let ssr: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| {
            let r = yi - (b0 + b1 * xi);
            r * r
        })
        .sum();
    let residual_variance = ssr / (nf - 2.0);

    let cov = xtx_inv * residual_variance;
    let intercept_se = cov[(0, 0)].max(0.0).sqrt();
    let slope_se = cov[(1, 1)].max(0.0).sqrt();

    let (wald, p_value) = wald_test(b1, slope_se)?;

    Ok(RegressionResult {
        b0,
        b1,
        residual_variance,
        intercept_se,
        slope_se,
        wald,
        p_value,
        significant: p_value < alpha,
        n,
    })
}

/// Wald statistic and chi-squared(1) p-value for an estimate and its SE.
///
/// A zero SE yields `W = 0, p = 1` for a zero estimate and `W = inf, p = 0`
/// otherwise.
fn wald_test(estimate: f64, se: f64) -> Result<(f64, f64), StatError> {
    if se == 0.0 {
        return Ok(if estimate == 0.0 {
            (0.0, 1.0)
        } else {
            (f64::INFINITY, 0.0)
        });
    }

    let wald = (estimate / se).powi(2);
    let chi2 = ChiSquared::new(1.0).map_err(|e| StatError::InvalidInput(e.to_string()))?;
    let p_value = if wald.is_infinite() {
        0.0
    } else {
        chi2.sf(wald).clamp(0.0, 1.0)
    };

    Ok((wald, p_value))
}

/// Normal fit by sample mean and sample standard deviation.
///
/// # Errors
///
/// - [`StatError::InsufficientData`] for fewer than two samples
/// - [`StatError::InvalidInput`] for non-finite samples
pub fn fit_normal(samples: &[f64]) -> Result<NormalFit, StatError> {
    let n = samples.len();
    if n < MIN_NORMAL_SAMPLES {
        return Err(StatError::insufficient("normal fit", n, MIN_NORMAL_SAMPLES));
    }
    if samples.iter().any(|v| !v.is_finite()) {
        return Err(StatError::InvalidInput(
            "normal fit samples must be finite".to_string(),
        ));
    }

    let mean = samples.iter().sum::<f64>() / n as f64;
    let variance = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;

    Ok(NormalFit {
        mean,
        std_dev: variance.sqrt(),
        n,
    })
}

/// Count samples into the bins delimited by `edges`.
///
/// Bins are half-open `[e_i, e_{i+1})` except the last, which also includes
/// its right edge.
///
/// # Errors
///
/// [`StatError::InvalidInput`] unless there are at least two finite,
/// strictly increasing edges.
pub fn histogram(samples: &[f64], edges: &[f64]) -> Result<Histogram, StatError> {
    if edges.len() < 2
        || edges.iter().any(|e| !e.is_finite())
        || edges.windows(2).any(|w| w[0] >= w[1])
    {
        return Err(StatError::InvalidInput(
            "histogram needs at least two strictly increasing edges".to_string(),
        ));
    }

    let bins = edges.len() - 1;
    let last = edges[bins];
    let mut counts = vec![0usize; bins];
    let mut outside = 0;

    for &s in samples {
        if !s.is_finite() || s < edges[0] || s > last {
            outside += 1;
            continue;
        }
        // number of edges <= s, minus one, is the bin index
        let bin = edges.partition_point(|e| *e <= s).saturating_sub(1).min(bins - 1);
        counts[bin] += 1;
    }

    Ok(Histogram {
        edges: edges.to_vec(),
        counts,
        outside,
    })
}

/// `bins` equal-width edges spanning `[start, end]`.
pub fn uniform_edges(start: f64, end: f64, bins: usize) -> Vec<f64> {
    let bins = bins.max(1);
    let width = (end - start) / bins as f64;
    (0..=bins).map(|i| start + width * i as f64).collect()
}
