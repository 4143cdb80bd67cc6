//! Observability for the monitoring pipeline
//!
//! Provides:
//! - Prometheus metrics (analysis latency, anomaly/alert/notification counters, active alerts)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_gauge, Histogram, IntCounter, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::alerts::{Alert, AlertSeverity, NotifyError};
use crate::anomaly::{AnomalyDetection, AnomalySeverity};

/// Histogram buckets for per-tick analysis latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<MonitorMetricsInner> = OnceLock::new();

struct MonitorMetricsInner {
    analysis_latency_seconds: Histogram,
    ticks: IntCounter,
    anomalies_detected: IntCounter,
    alerts_created: IntCounter,
    rules_fired: IntCounter,
    notifications_dispatched: IntCounter,
    notification_failures: IntCounter,
    active_alerts: IntGauge,
    metrics_tracked: IntGauge,
}

impl MonitorMetricsInner {
    fn new() -> Self {
        Self {
            analysis_latency_seconds: register_histogram!(
                "sentinel_analysis_latency_seconds",
                "Time spent processing one metric snapshot",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register analysis_latency_seconds"),

            ticks: register_int_counter!(
                "sentinel_ticks_total",
                "Total number of metric snapshots processed"
            )
            .expect("Failed to register ticks"),

            anomalies_detected: register_int_counter!(
                "sentinel_anomalies_detected_total",
                "Total number of anomalies detected"
            )
            .expect("Failed to register anomalies_detected"),

            alerts_created: register_int_counter!(
                "sentinel_alerts_created_total",
                "Total number of alerts created"
            )
            .expect("Failed to register alerts_created"),

            rules_fired: register_int_counter!(
                "sentinel_rules_fired_total",
                "Total number of threshold rule firings"
            )
            .expect("Failed to register rules_fired"),

            notifications_dispatched: register_int_counter!(
                "sentinel_notifications_dispatched_total",
                "Total number of alerts handed to the notification sink"
            )
            .expect("Failed to register notifications_dispatched"),

            notification_failures: register_int_counter!(
                "sentinel_notification_failures_total",
                "Total number of notification sink failures"
            )
            .expect("Failed to register notification_failures"),

            active_alerts: register_int_gauge!(
                "sentinel_active_alerts",
                "Number of alerts not yet resolved"
            )
            .expect("Failed to register active_alerts"),

            metrics_tracked: register_int_gauge!(
                "sentinel_metrics_tracked",
                "Number of distinct metrics with recorded history"
            )
            .expect("Failed to register metrics_tracked"),
        }
    }
}

/// Monitor metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones (and multiple monitors) share the same underlying metrics.
#[derive(Clone)]
pub struct MonitorMetrics {
    _private: (),
}

impl Default for MonitorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(MonitorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &MonitorMetricsInner {
        GLOBAL_METRICS.get_or_init(MonitorMetricsInner::new)
    }

    pub fn observe_analysis_latency(&self, duration_secs: f64) {
        self.inner().analysis_latency_seconds.observe(duration_secs);
        self.inner().ticks.inc();
    }

    pub fn add_anomalies_detected(&self, count: usize) {
        self.inner().anomalies_detected.inc_by(count as u64);
    }

    pub fn inc_alerts_created(&self) {
        self.inner().alerts_created.inc();
    }

    pub fn add_rules_fired(&self, count: usize) {
        self.inner().rules_fired.inc_by(count as u64);
    }

    pub fn inc_notifications_dispatched(&self) {
        self.inner().notifications_dispatched.inc();
    }

    pub fn inc_notification_failures(&self) {
        self.inner().notification_failures.inc();
    }

    pub fn set_active_alerts(&self, count: usize) {
        self.inner().active_alerts.set(count as i64);
    }

    pub fn set_metrics_tracked(&self, count: usize) {
        self.inner().metrics_tracked.set(count as i64);
    }

    pub fn ticks(&self) -> u64 {
        self.inner().ticks.get()
    }
}

/// Structured logger for monitor events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    /// Log an anomaly detection event
    pub fn log_anomaly(&self, anomaly: &AnomalyDetection) {
        match anomaly.severity {
            AnomalySeverity::Critical => {
                warn!(
                    event = "anomaly_detected",
                    instance = %self.instance,
                    anomaly_id = %anomaly.id,
                    anomaly_type = %anomaly.kind,
                    metric = %anomaly.metric,
                    severity = %anomaly.severity,
                    confidence = anomaly.confidence,
                    "Critical anomaly detected"
                );
            }
            _ => {
                info!(
                    event = "anomaly_detected",
                    instance = %self.instance,
                    anomaly_id = %anomaly.id,
                    anomaly_type = %anomaly.kind,
                    metric = %anomaly.metric,
                    severity = %anomaly.severity,
                    confidence = anomaly.confidence,
                    "Anomaly detected"
                );
            }
        }
    }

    /// Log an alert creation
    pub fn log_alert_created(&self, alert: &Alert) {
        let rule = alert.metadata_str(crate::alerts::metadata_keys::RULE);
        if let Some(rule) = rule {
            info!(
                event = "rule_fired",
                instance = %self.instance,
                alert_id = %alert.id,
                rule = %rule,
                severity = %alert.severity,
                message = %alert.message,
                "Threshold rule fired"
            );
            return;
        }

        info!(
            event = "alert_created",
            instance = %self.instance,
            alert_id = %alert.id,
            source = %alert.source,
            category = %alert.category,
            severity = %alert.severity,
            title = %alert.title,
            "Alert created"
        );
    }

    /// Log a notification sink failure
    pub fn log_notification_failure(&self, alert: &Alert, error: &NotifyError) {
        warn!(
            event = "notification_failed",
            instance = %self.instance,
            alert_id = %alert.id,
            severity = %alert.severity,
            error = %error,
            "Notification delivery failed, alert kept"
        );
    }

    pub fn log_scan_started(&self, scan_id: u64) {
        info!(
            event = "scan_started",
            instance = %self.instance,
            scan_id = scan_id,
            "Scan started"
        );
    }

    pub fn log_scan_completed(&self, scan_id: u64, findings: usize, success: bool) {
        if success {
            info!(
                event = "scan_completed",
                instance = %self.instance,
                scan_id = scan_id,
                findings = findings,
                "Scan completed"
            );
        } else {
            warn!(
                event = "scan_failed",
                instance = %self.instance,
                scan_id = scan_id,
                "Scan failed"
            );
        }
    }

    /// Log monitor startup
    pub fn log_startup(&self, version: &str, threshold: AlertSeverity) {
        info!(
            event = "monitor_started",
            instance = %self.instance,
            version = %version,
            notify_threshold = %threshold,
            "Sentinel monitor started"
        );
    }

    /// Log monitor shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "monitor_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Sentinel monitor shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_metrics_creation() {
        let metrics = MonitorMetrics::new();
        let before = metrics.ticks();

        metrics.observe_analysis_latency(0.0001);
        metrics.add_anomalies_detected(2);
        metrics.inc_alerts_created();
        metrics.add_rules_fired(1);
        metrics.set_active_alerts(3);
        metrics.set_metrics_tracked(4);

        assert!(metrics.ticks() > before);
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-instance");
        assert_eq!(logger.instance, "test-instance");
    }
}
