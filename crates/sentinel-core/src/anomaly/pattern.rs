//! Behavioural pattern deviation
//!
//! Compares the spread and step-to-step volatility of the last ten samples
//! against the ten before them.

use super::stats;

/// Minimum values required for pattern analysis
const MIN_SAMPLES_FOR_DETECTION: usize = 10;

/// Size of the recent and historical partitions
const PARTITION_LEN: usize = 10;

/// Detects shifts in variance or volatility between two windows
#[derive(Debug, Clone)]
pub struct PatternDetector {
    /// Relative change in standard deviation considered a deviation
    pub variance_change_threshold: f64,
    /// Relative change in mean absolute step considered a deviation
    pub volatility_change_threshold: f64,
}

impl PatternDetector {
    pub fn detect(&self, values: &[f64]) -> Option<PatternDeviation> {
        if values.len() < MIN_SAMPLES_FOR_DETECTION {
            return None;
        }

        let split = values.len() - PARTITION_LEN;
        let recent = PatternProfile::of(&values[split..])?;
        let historical = PatternProfile::of(&values[split.saturating_sub(PARTITION_LEN)..split])?;

        let variance_change = relative_change(recent.variance, historical.variance);
        let volatility_change = match (recent.volatility, historical.volatility) {
            (Some(r), Some(h)) => relative_change(r, h),
            _ => None,
        };

        let variance_deviates = variance_change
            .map(|c| c > self.variance_change_threshold)
            .unwrap_or(false);
        let volatility_deviates = volatility_change
            .map(|c| c > self.volatility_change_threshold)
            .unwrap_or(false);

        if !(variance_deviates || volatility_deviates) {
            return None;
        }

        Some(PatternDeviation {
            recent,
            historical,
            variance_change,
            volatility_change,
        })
    }
}

impl Default for PatternDetector {
    fn default() -> Self {
        Self {
            variance_change_threshold: 0.3,
            volatility_change_threshold: 0.4,
        }
    }
}

/// `|current - baseline| / baseline`, or `None` for a zero baseline
fn relative_change(current: f64, baseline: f64) -> Option<f64> {
    if baseline.abs() < f64::EPSILON {
        return None;
    }
    Some((current - baseline).abs() / baseline)
}

/// Spread summary of one partition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternProfile {
    /// Population standard deviation
    pub variance: f64,
    /// Mean absolute difference between consecutive values
    pub volatility: Option<f64>,
}

impl PatternProfile {
    /// Profile a partition; `None` when it is empty
    pub fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let steps: Vec<f64> = values.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
        let volatility = if steps.is_empty() {
            None
        } else {
            Some(stats::mean(&steps))
        };

        Some(Self {
            variance: stats::std_dev(values),
            volatility,
        })
    }
}

/// Evidence for a pattern anomaly
#[derive(Debug, Clone)]
pub struct PatternDeviation {
    pub recent: PatternProfile,
    pub historical: PatternProfile,
    pub variance_change: Option<f64>,
    pub volatility_change: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alternating(len: usize, amplitude: f64) -> Vec<f64> {
        (0..len)
            .map(|i| if i % 2 == 0 { 100.0 } else { 100.0 + amplitude })
            .collect()
    }

    #[test]
    fn test_volatility_shift_detected() {
        let mut values = alternating(10, 1.0);
        values.extend(alternating(10, 5.0));

        let deviation = PatternDetector::default().detect(&values).unwrap();
        assert!(deviation.variance_change.unwrap() > 0.3);
        assert!(deviation.volatility_change.unwrap() > 0.4);
    }

    #[test]
    fn test_same_behaviour_not_flagged() {
        let values = alternating(20, 2.0);
        assert!(PatternDetector::default().detect(&values).is_none());
    }

    #[test]
    fn test_flat_baseline_is_no_deviation() {
        let mut values = vec![100.0; 10];
        values.extend(alternating(10, 5.0));
        assert!(PatternDetector::default().detect(&values).is_none());
    }

    #[test]
    fn test_short_history_partition() {
        // Exactly ten values leaves nothing to compare against.
        assert!(PatternDetector::default().detect(&alternating(10, 3.0)).is_none());

        // One historical value has no volatility and zero spread.
        assert!(PatternDetector::default().detect(&alternating(11, 3.0)).is_none());
    }

    #[test]
    fn test_requires_ten_values() {
        assert!(PatternDetector::default().detect(&[1.0, 50.0, 2.0]).is_none());
    }
}
