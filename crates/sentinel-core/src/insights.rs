//! Heuristic insights over the current snapshot

use serde::{Deserialize, Serialize};

use crate::anomaly::stats::{classify_trend, Trend};
use crate::models::metric_names::{ACTIVE_USERS, RESPONSE_TIME};
use crate::models::MetricSnapshot;

/// Response time (ms) under which performance is reported as excellent
const EXCELLENT_RESPONSE_TIME_MS: f64 = 100.0;

/// Active user count above which traffic is reported as high
const HIGH_TRAFFIC_USERS: f64 = 3500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightCategory {
    Performance,
    Traffic,
    Security,
    Prediction,
}

impl std::fmt::Display for InsightCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InsightCategory::Performance => write!(f, "performance"),
            InsightCategory::Traffic => write!(f, "traffic"),
            InsightCategory::Security => write!(f, "security"),
            InsightCategory::Prediction => write!(f, "prediction"),
        }
    }
}

/// A human-readable observation about the system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiInsight {
    pub id: String,
    pub category: InsightCategory,
    pub title: String,
    pub description: String,
    pub confidence: f64,
    pub actionable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

/// Produces the insights whose condition holds right now
#[derive(Debug, Clone, Default)]
pub struct InsightGenerator;

impl InsightGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate insights from the current snapshot and the error-rate history
    ///
    /// Stateless: the result replaces whatever a previous call returned.
    pub fn generate(
        &self,
        snapshot: &MetricSnapshot,
        error_rate_history: &[f64],
    ) -> Vec<AiInsight> {
        let mut insights = Vec::new();

        if snapshot
            .get(RESPONSE_TIME)
            .is_some_and(|rt| *rt < EXCELLENT_RESPONSE_TIME_MS)
        {
            insights.push(AiInsight {
                id: "perf-excellent".to_string(),
                category: InsightCategory::Performance,
                title: "Excellent Response Time".to_string(),
                description:
                    "Your application is performing exceptionally well with sub-100ms response times."
                        .to_string(),
                confidence: 95.0,
                actionable: false,
                recommendation: None,
            });
        }

        if snapshot
            .get(ACTIVE_USERS)
            .is_some_and(|users| *users > HIGH_TRAFFIC_USERS)
        {
            insights.push(AiInsight {
                id: "traffic-high".to_string(),
                category: InsightCategory::Traffic,
                title: "High Traffic Volume".to_string(),
                description:
                    "Experiencing above-normal traffic. Monitor server capacity and user experience."
                        .to_string(),
                confidence: 90.0,
                actionable: true,
                recommendation: Some(
                    "Consider enabling auto-scaling and monitoring user experience metrics."
                        .to_string(),
                ),
            });
        }

        if classify_trend(error_rate_history) == Trend::Increasing {
            insights.push(AiInsight {
                id: "error-prediction".to_string(),
                category: InsightCategory::Prediction,
                title: "Error Rate Trend Alert".to_string(),
                description: "AI predicts potential error rate increase based on current patterns."
                    .to_string(),
                confidence: 78.0,
                actionable: true,
                recommendation: Some(
                    "Review recent deployments and implement additional error monitoring."
                        .to_string(),
                ),
            });
        }

        insights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::snapshot;

    #[test]
    fn test_excellent_response_time_without_traffic_insight() {
        let snap = snapshot([
            ("responseTime", 80.0),
            ("activeUsers", 1000.0),
            ("errorRate", 0.01),
            ("serverLoad", 20.0),
        ]);
        let insights = InsightGenerator::new().generate(&snap, &[0.01]);

        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].id, "perf-excellent");
        assert_eq!(insights[0].title, "Excellent Response Time");
        assert!(!insights[0].actionable);
    }

    #[test]
    fn test_high_traffic_insight() {
        let snap = snapshot([("responseTime", 150.0), ("activeUsers", 3600.0)]);
        let insights = InsightGenerator::new().generate(&snap, &[]);

        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].category, InsightCategory::Traffic);
        assert!(insights[0].actionable);
    }

    #[test]
    fn test_error_trend_prediction() {
        let snap = snapshot([("responseTime", 150.0)]);
        let insights = InsightGenerator::new().generate(&snap, &[0.1, 0.3, 0.5, 0.7, 0.9]);

        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].id, "error-prediction");
        assert_eq!(insights[0].category, InsightCategory::Prediction);
    }

    #[test]
    fn test_missing_metrics_produce_nothing() {
        let insights = InsightGenerator::new().generate(&MetricSnapshot::new(), &[]);
        assert!(insights.is_empty());
    }
}
