//! Trend detection
//!
//! Classifies the direction of the last few samples with a least-squares
//! slope and grades non-stable trends over a wider window.

use super::stats::{self, Trend};
use super::AnomalySeverity;

/// Number of trailing values used to grade a detected trend
const SEVERITY_WINDOW: usize = 10;

/// Detects sustained upward or downward movement
#[derive(Debug, Clone, Default)]
pub struct TrendDetector;

impl TrendDetector {
    pub fn new() -> Self {
        Self
    }

    /// Detect a trend in `values` (oldest first)
    pub fn detect(&self, values: &[f64]) -> Option<TrendAnomaly> {
        let trend = stats::classify_trend(values);
        if trend == Trend::Stable {
            return None;
        }

        Some(TrendAnomaly {
            trend,
            slope: stats::slope(stats::tail(values, SEVERITY_WINDOW)),
        })
    }
}

/// A non-stable trend with its grading slope
#[derive(Debug, Clone)]
pub struct TrendAnomaly {
    pub trend: Trend,
    /// Slope over the last ten values (or fewer)
    pub slope: f64,
}

impl TrendAnomaly {
    pub fn severity(&self) -> AnomalySeverity {
        let magnitude = self.slope.abs();
        if magnitude > 0.5 {
            AnomalySeverity::High
        } else if magnitude > 0.2 {
            AnomalySeverity::Medium
        } else {
            AnomalySeverity::Low
        }
    }

    /// Confidence in percent, capped at 90
    pub fn confidence(&self) -> f64 {
        (self.slope.abs() * 100.0).min(90.0)
    }

    pub fn is_significant(&self) -> bool {
        self.slope.abs() > 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increasing_trend() {
        let detector = TrendDetector::new();
        let values: Vec<f64> = (0..10).map(|i| i as f64 * 2.0).collect();
        let anomaly = detector.detect(&values).unwrap();

        assert_eq!(anomaly.trend, Trend::Increasing);
        assert!((anomaly.slope - 2.0).abs() < 1e-9);
        assert_eq!(anomaly.severity(), AnomalySeverity::High);
        assert_eq!(anomaly.confidence(), 90.0);
    }

    #[test]
    fn test_decreasing_trend_low_severity() {
        let detector = TrendDetector::new();
        let values = [1.0, 0.85, 0.7];
        let anomaly = detector.detect(&values).unwrap();

        assert_eq!(anomaly.trend, Trend::Decreasing);
        assert_eq!(anomaly.severity(), AnomalySeverity::Low);
        assert!((anomaly.confidence() - 15.0).abs() < 1e-6);
    }

    #[test]
    fn test_stable_series_not_reported() {
        let detector = TrendDetector::new();
        assert!(detector.detect(&[50.0; 10]).is_none());
        assert!(detector.detect(&[1.0, 9.0]).is_none());
    }
}
