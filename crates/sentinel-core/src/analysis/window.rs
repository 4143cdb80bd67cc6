//! Rolling window of recent anomalies

use std::time::Duration;

use crate::anomaly::{AnomalyDetection, AnomalySeverity};
use crate::models::TimestampMs;

/// Default retention for detected anomalies (5 minutes)
pub const DEFAULT_ANOMALY_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Time-bounded list of anomalies, one entry per anomaly id
#[derive(Debug, Clone)]
pub struct AnomalyWindow {
    entries: Vec<AnomalyDetection>,
    retention_ms: i64,
}

impl AnomalyWindow {
    pub fn new(retention: Duration) -> Self {
        Self {
            entries: Vec::new(),
            retention_ms: retention.as_millis() as i64,
        }
    }

    /// Drop entries older than the retention relative to `now`
    pub fn purge(&mut self, now: TimestampMs) {
        let retention = self.retention_ms;
        self.entries.retain(|a| now - a.timestamp < retention);
    }

    /// Add fresh detections; a detection whose id is already held replaces
    /// the earlier entry
    pub fn extend(&mut self, detections: impl IntoIterator<Item = AnomalyDetection>) {
        for detection in detections {
            self.entries.retain(|a| a.id != detection.id);
            self.entries.push(detection);
        }
    }

    pub fn entries(&self) -> &[AnomalyDetection] {
        &self.entries
    }

    pub fn by_severity(&self, severity: AnomalySeverity) -> Vec<AnomalyDetection> {
        self.entries
            .iter()
            .filter(|a| a.severity == severity)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AnomalyWindow {
    fn default() -> Self {
        Self::new(DEFAULT_ANOMALY_WINDOW)
    }
}
