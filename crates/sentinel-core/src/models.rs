//! Core data models shared by the analysis pipeline

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Milliseconds since the Unix epoch
pub type TimestampMs = i64;

/// One tick's worth of metric values, keyed by metric name
pub type MetricSnapshot = BTreeMap<String, f64>;

/// Well-known metric names produced by the application telemetry feed
pub mod metric_names {
    pub const ACTIVE_USERS: &str = "activeUsers";
    pub const RESPONSE_TIME: &str = "responseTime";
    pub const ERROR_RATE: &str = "errorRate";
    pub const SERVER_LOAD: &str = "serverLoad";
}

/// A single observation of a metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub timestamp: TimestampMs,
    pub value: f64,
}

impl MetricSample {
    pub fn new(timestamp: TimestampMs, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Current wall-clock time in epoch milliseconds
pub fn now_ms() -> TimestampMs {
    chrono::Utc::now().timestamp_millis()
}

/// Build a snapshot from `(name, value)` pairs
pub fn snapshot<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> MetricSnapshot {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}
