//! Composite anomaly detector
//!
//! Runs the statistical, trend and pattern detectors over one metric's
//! history and turns their findings into [`AnomalyDetection`] records.

use serde::{Deserialize, Serialize};

use super::advice;
use super::pattern::PatternDetector;
use super::statistical::StatisticalDetector;
use super::trend::TrendDetector;
use crate::models::{now_ms, TimestampMs};

/// Default width of the time bucket folded into anomaly ids (1 minute)
pub const DEFAULT_ID_BUCKET_MS: i64 = 60 * 1000;

/// Confidence attached to every pattern deviation
const PATTERN_CONFIDENCE: f64 = 75.0;

/// Anomaly classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyKind {
    Spike,
    Drop,
    Trend,
    Pattern,
    Prediction,
}

impl AnomalyKind {
    /// Capitalized name used in alert titles
    pub fn title(&self) -> &'static str {
        match self {
            AnomalyKind::Spike => "Spike",
            AnomalyKind::Drop => "Drop",
            AnomalyKind::Trend => "Trend",
            AnomalyKind::Pattern => "Pattern",
            AnomalyKind::Prediction => "Prediction",
        }
    }
}

impl std::fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalyKind::Spike => write!(f, "spike"),
            AnomalyKind::Drop => write!(f, "drop"),
            AnomalyKind::Trend => write!(f, "trend"),
            AnomalyKind::Pattern => write!(f, "pattern"),
            AnomalyKind::Prediction => write!(f, "prediction"),
        }
    }
}

/// Anomaly severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for AnomalySeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalySeverity::Low => write!(f, "low"),
            AnomalySeverity::Medium => write!(f, "medium"),
            AnomalySeverity::High => write!(f, "high"),
            AnomalySeverity::Critical => write!(f, "critical"),
        }
    }
}

/// A detected anomaly on one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyDetection {
    /// `{metric}-{kind}-{bucket}`; stable for the same finding within one bucket
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    pub severity: AnomalySeverity,
    pub metric: String,
    pub description: String,
    /// Confidence in percent, within `[0, 100]`
    pub confidence: f64,
    pub timestamp: TimestampMs,
    pub recommendation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_impact: Option<String>,
}

/// Runs every detection algorithm over a metric's history
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    pub statistical: StatisticalDetector,
    pub trend: TrendDetector,
    pub pattern: PatternDetector,
    /// Width of the time bucket used for anomaly identity
    pub id_bucket_ms: i64,
}

impl AnomalyDetector {
    pub fn new(id_bucket_ms: i64) -> Self {
        Self {
            statistical: StatisticalDetector::default(),
            trend: TrendDetector::new(),
            pattern: PatternDetector::default(),
            id_bucket_ms: id_bucket_ms.max(1),
        }
    }

    /// Detect anomalies at the current wall-clock time
    pub fn detect(&self, metric: &str, current: f64, history: &[f64]) -> Vec<AnomalyDetection> {
        self.detect_at(metric, current, history, now_ms())
    }

    /// Detect anomalies in `history` (oldest first, including `current`)
    ///
    /// The three algorithms are independent; their findings are concatenated
    /// in statistical, trend, pattern order.
    pub fn detect_at(
        &self,
        metric: &str,
        current: f64,
        history: &[f64],
        now: TimestampMs,
    ) -> Vec<AnomalyDetection> {
        let mut detections = Vec::new();

        if let Some(z) = self.statistical.detect(current, history) {
            let kind = if z.is_spike() {
                AnomalyKind::Spike
            } else {
                AnomalyKind::Drop
            };
            detections.push(AnomalyDetection {
                id: self.anomaly_id(metric, kind, now),
                kind,
                severity: z.severity(),
                metric: metric.to_string(),
                description: format!(
                    "{metric} {kind} detected: {current:.2} ({:.1}σ from normal)",
                    z.z_score
                ),
                confidence: z.confidence(),
                timestamp: now,
                recommendation: advice::recommendation(metric, kind).to_string(),
                predicted_impact: Some(advice::predicted_impact(metric, kind).to_string()),
            });
        }

        if let Some(t) = self.trend.detect(history) {
            let kind = AnomalyKind::Trend;
            detections.push(AnomalyDetection {
                id: self.anomaly_id(metric, kind, now),
                kind,
                severity: t.severity(),
                metric: metric.to_string(),
                description: format!(
                    "{metric} showing {} trend (slope: {:.3})",
                    t.trend, t.slope
                ),
                confidence: t.confidence(),
                timestamp: now,
                recommendation: advice::recommendation(metric, kind).to_string(),
                predicted_impact: Some(advice::trend_impact(t.trend, t.slope)),
            });
        }

        if self.pattern.detect(history).is_some() {
            let kind = AnomalyKind::Pattern;
            detections.push(AnomalyDetection {
                id: self.anomaly_id(metric, kind, now),
                kind,
                severity: AnomalySeverity::Medium,
                metric: metric.to_string(),
                description: format!(
                    "{metric} pattern deviation detected - behavior differs from historical norm"
                ),
                confidence: PATTERN_CONFIDENCE,
                timestamp: now,
                recommendation: advice::recommendation(metric, kind).to_string(),
                predicted_impact: None,
            });
        }

        detections
    }

    fn anomaly_id(&self, metric: &str, kind: AnomalyKind, now: TimestampMs) -> String {
        format!("{metric}-{kind}-{}", now.div_euclid(self.id_bucket_ms))
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(DEFAULT_ID_BUCKET_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::metric_names::{ERROR_RATE, RESPONSE_TIME};

    #[test]
    fn test_spike_detection_record() {
        let detector = AnomalyDetector::default();
        let detections = detector.detect_at(
            RESPONSE_TIME,
            130.0,
            &[100.0, 102.0, 98.0, 101.0, 99.0],
            120_000,
        );

        let spike = detections
            .iter()
            .find(|d| d.kind == AnomalyKind::Spike)
            .unwrap();
        assert_eq!(spike.id, "responseTime-spike-2");
        assert_eq!(spike.severity, AnomalySeverity::Critical);
        assert!(spike.description.starts_with("responseTime spike detected: 130.00"));
        assert!(spike.recommendation.starts_with("Check database performance"));
        assert_eq!(
            spike.predicted_impact.as_deref(),
            Some("Poor user experience, increased bounce rate, SEO impact")
        );
    }

    #[test]
    fn test_identical_values_yield_nothing() {
        let detector = AnomalyDetector::default();
        let detections = detector.detect_at(ERROR_RATE, 0.1, &[0.1; 5], 0);
        assert!(detections.is_empty());
        assert!(detections.iter().all(|d| d.confidence.is_finite()));
    }

    #[test]
    fn test_short_history_has_no_statistical_detection() {
        let detector = AnomalyDetector::default();
        let detections = detector.detect_at(RESPONSE_TIME, 900.0, &[100.0, 101.0, 900.0], 0);
        assert!(detections.iter().all(|d| d.kind == AnomalyKind::Trend));
    }

    #[test]
    fn test_trend_detection_record() {
        let detector = AnomalyDetector::default();
        let history: Vec<f64> = (0..8).map(|i| 100.0 + i as f64).collect();
        let detections = detector.detect_at(RESPONSE_TIME, 107.0, &history, 0);

        let trend = detections
            .iter()
            .find(|d| d.kind == AnomalyKind::Trend)
            .unwrap();
        assert_eq!(trend.severity, AnomalySeverity::High);
        assert_eq!(trend.description, "responseTime showing increasing trend (slope: 1.000)");
        assert_eq!(
            trend.predicted_impact.as_deref(),
            Some("significant increasing trend may lead to capacity concerns if continued")
        );
    }

    #[test]
    fn test_pattern_detection_record() {
        let detector = AnomalyDetector::default();
        let mut history: Vec<f64> = (0..10).map(|i| if i % 2 == 0 { 50.0 } else { 51.0 }).collect();
        history.extend((0..10).map(|i| if i % 2 == 0 { 50.0 } else { 56.0 }));
        let current = *history.last().unwrap();

        let detections = detector.detect_at("queueDepth", current, &history, 0);
        let pattern = detections
            .iter()
            .find(|d| d.kind == AnomalyKind::Pattern)
            .unwrap();
        assert_eq!(pattern.severity, AnomalySeverity::Medium);
        assert_eq!(pattern.confidence, 75.0);
        assert!(pattern.predicted_impact.is_none());
        assert_eq!(
            pattern.recommendation,
            "Monitor closely and investigate if pattern continues."
        );
    }

    #[test]
    fn test_ids_stable_within_bucket() {
        let detector = AnomalyDetector::new(60_000);
        let history = [100.0, 102.0, 98.0, 101.0, 99.0];
        let a = detector.detect_at(RESPONSE_TIME, 130.0, &history, 60_000);
        let b = detector.detect_at(RESPONSE_TIME, 131.0, &history, 119_999);
        let c = detector.detect_at(RESPONSE_TIME, 131.0, &history, 120_000);

        assert_eq!(a[0].id, b[0].id);
        assert_ne!(a[0].id, c[0].id);
    }
}
