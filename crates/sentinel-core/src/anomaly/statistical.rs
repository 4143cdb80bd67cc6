//! Z-score spike and drop detection
//!
//! Flags the current value when it lies more than a configurable number of
//! population standard deviations away from the mean of the recent history.

use super::stats;
use super::AnomalySeverity;

/// Minimum values (including the current one) required for detection
const MIN_SAMPLES_FOR_DETECTION: usize = 5;

/// Detects values deviating from the historical mean
#[derive(Debug, Clone)]
pub struct StatisticalDetector {
    /// Number of standard deviations to consider anomalous
    pub z_threshold: f64,
    /// Minimum history length before detection starts
    pub min_samples: usize,
}

impl StatisticalDetector {
    pub fn new(z_threshold: f64) -> Self {
        Self {
            z_threshold,
            min_samples: MIN_SAMPLES_FOR_DETECTION,
        }
    }

    /// Score `current` against `history`
    ///
    /// # Returns
    /// * `Some(ZScoreAnomaly)` if the z-score exceeds the threshold
    /// * `None` if the history is too short, has zero spread, or the value is normal
    pub fn detect(&self, current: f64, history: &[f64]) -> Option<ZScoreAnomaly> {
        if history.len() < self.min_samples {
            return None;
        }

        let mean = stats::mean(history);
        let std_dev = stats::std_dev(history);

        // Zero spread would make every deviation infinite
        if std_dev < f64::EPSILON {
            return None;
        }

        let z_score = (current - mean).abs() / std_dev;
        if !z_score.is_finite() || z_score <= self.z_threshold {
            return None;
        }

        Some(ZScoreAnomaly {
            current,
            mean,
            std_dev,
            z_score,
        })
    }
}

impl Default for StatisticalDetector {
    fn default() -> Self {
        Self::new(2.5)
    }
}

/// Outcome of a z-score test that crossed the threshold
#[derive(Debug, Clone)]
pub struct ZScoreAnomaly {
    pub current: f64,
    pub mean: f64,
    pub std_dev: f64,
    /// Absolute z-score
    pub z_score: f64,
}

impl ZScoreAnomaly {
    /// True when the value is above the mean
    pub fn is_spike(&self) -> bool {
        self.current > self.mean
    }

    pub fn severity(&self) -> AnomalySeverity {
        if self.z_score > 3.5 {
            AnomalySeverity::Critical
        } else if self.z_score > 3.0 {
            AnomalySeverity::High
        } else {
            AnomalySeverity::Medium
        }
    }

    /// Confidence in percent, capped at 95
    pub fn confidence(&self) -> f64 {
        (self.z_score * 20.0).min(95.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spike_from_stable_history() {
        let detector = StatisticalDetector::default();
        let anomaly = detector
            .detect(130.0, &[100.0, 102.0, 98.0, 101.0, 99.0])
            .unwrap();

        assert!(anomaly.z_score > 2.5);
        assert!(anomaly.is_spike());
        assert_eq!(anomaly.severity(), AnomalySeverity::Critical);
        assert_eq!(anomaly.confidence(), 95.0);
    }

    #[test]
    fn test_drop_is_not_spike() {
        let detector = StatisticalDetector::default();
        let anomaly = detector
            .detect(70.0, &[100.0, 102.0, 98.0, 101.0, 99.0])
            .unwrap();
        assert!(!anomaly.is_spike());
    }

    #[test]
    fn test_insufficient_samples() {
        let detector = StatisticalDetector::default();
        assert!(detector.detect(500.0, &[1.0, 2.0, 3.0, 4.0]).is_none());
    }

    #[test]
    fn test_zero_variance_suppressed() {
        let detector = StatisticalDetector::default();
        assert!(detector.detect(5.0, &[5.0; 5]).is_none());
        assert!(detector.detect(50.0, &[5.0; 5]).is_none());
    }

    #[test]
    fn test_severity_tiers() {
        let base = ZScoreAnomaly {
            current: 10.0,
            mean: 0.0,
            std_dev: 1.0,
            z_score: 2.6,
        };
        assert_eq!(base.severity(), AnomalySeverity::Medium);
        assert!((base.confidence() - 52.0).abs() < 1e-9);

        let high = ZScoreAnomaly {
            z_score: 3.2,
            ..base.clone()
        };
        assert_eq!(high.severity(), AnomalySeverity::High);

        let critical = ZScoreAnomaly {
            z_score: 3.6,
            ..base
        };
        assert_eq!(critical.severity(), AnomalySeverity::Critical);
    }
}
