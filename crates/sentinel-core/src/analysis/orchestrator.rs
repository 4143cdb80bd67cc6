//! Per-tick analysis: history update, detection, insights

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::window::AnomalyWindow;
use crate::anomaly::{AnomalyDetection, AnomalyDetector};
use crate::history::MetricHistoryStore;
use crate::insights::{AiInsight, InsightGenerator};
use crate::models::metric_names::ERROR_RATE;
use crate::models::{MetricSample, MetricSnapshot, TimestampMs};

/// Result of analysing one snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Detections produced by this snapshot
    pub new_anomalies: Vec<AnomalyDetection>,
    /// Rolling window after this snapshot
    pub anomalies: Vec<AnomalyDetection>,
    /// Insights for this snapshot only
    pub insights: Vec<AiInsight>,
}

/// Feeds snapshots through history, detection and insight generation
#[derive(Debug, Clone)]
pub struct AnalysisOrchestrator {
    history: MetricHistoryStore,
    detector: AnomalyDetector,
    insights: InsightGenerator,
    window: AnomalyWindow,
    latest_insights: Vec<AiInsight>,
}

impl AnalysisOrchestrator {
    pub fn new(history_capacity: usize, anomaly_window: Duration, id_bucket_ms: i64) -> Self {
        Self {
            history: MetricHistoryStore::new(history_capacity),
            detector: AnomalyDetector::new(id_bucket_ms),
            insights: InsightGenerator::new(),
            window: AnomalyWindow::new(anomaly_window),
            latest_insights: Vec::new(),
        }
    }

    /// Record every metric of `snapshot` and run detection on each series
    pub fn analyze(&mut self, snapshot: &MetricSnapshot, now: TimestampMs) -> AnalysisReport {
        let mut new_anomalies = Vec::new();

        for (metric, &value) in snapshot {
            self.history.record(metric, MetricSample::new(now, value));
            let values = self.history.values(metric);
            new_anomalies.extend(self.detector.detect_at(metric, value, &values, now));
        }

        self.window.purge(now);
        self.window.extend(new_anomalies.iter().cloned());

        self.latest_insights = self
            .insights
            .generate(snapshot, &self.history.values(ERROR_RATE));

        AnalysisReport {
            new_anomalies,
            anomalies: self.window.entries().to_vec(),
            insights: self.latest_insights.clone(),
        }
    }

    pub fn anomalies(&self) -> &[AnomalyDetection] {
        self.window.entries()
    }

    pub fn window(&self) -> &AnomalyWindow {
        &self.window
    }

    pub fn insights(&self) -> &[AiInsight] {
        &self.latest_insights
    }

    pub fn history(&self) -> &MetricHistoryStore {
        &self.history
    }
}

impl Default for AnalysisOrchestrator {
    fn default() -> Self {
        Self::new(
            crate::history::DEFAULT_HISTORY_CAPACITY,
            super::window::DEFAULT_ANOMALY_WINDOW,
            crate::anomaly::DEFAULT_ID_BUCKET_MS,
        )
    }
}
