//! Descriptive statistics shared by the detectors

use serde::{Deserialize, Serialize};

/// Number of trailing values used to classify a trend
pub const TREND_CLASSIFY_WINDOW: usize = 5;

/// Minimum number of values before a trend can be classified
pub const MIN_SAMPLES_FOR_TREND: usize = 3;

/// Slope magnitude separating a trend from noise
const TREND_SLOPE_THRESHOLD: f64 = 0.1;

/// Direction of a metric over its recent samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Increasing => write!(f, "increasing"),
            Trend::Decreasing => write!(f, "decreasing"),
            Trend::Stable => write!(f, "stable"),
        }
    }
}

/// Arithmetic mean; `0.0` for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (mean of squared deviations, square-rooted)
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Least-squares slope of `values` against their index
///
/// Returns `0.0` for fewer than two values.
pub fn slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 2 {
        return 0.0;
    }

    let sum_x = n * (n - 1.0) / 2.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;

    for (i, v) in values.iter().enumerate() {
        let x = i as f64;
        sum_y += v;
        sum_xy += x * v;
        sum_xx += x * x;
    }

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator.abs() < f64::EPSILON {
        return 0.0;
    }

    (n * sum_xy - sum_x * sum_y) / denominator
}

/// The trailing `window` values of a series
pub fn tail(values: &[f64], window: usize) -> &[f64] {
    &values[values.len().saturating_sub(window)..]
}

/// Classify the direction of the last few values
pub fn classify_trend(values: &[f64]) -> Trend {
    if values.len() < MIN_SAMPLES_FOR_TREND {
        return Trend::Stable;
    }

    let s = slope(tail(values, TREND_CLASSIFY_WINDOW));
    if s > TREND_SLOPE_THRESHOLD {
        Trend::Increasing
    } else if s < -TREND_SLOPE_THRESHOLD {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}
