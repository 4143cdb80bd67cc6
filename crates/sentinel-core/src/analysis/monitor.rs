//! Monitoring instance handle
//!
//! A [`Monitor`] owns one logical monitoring timeline: metric history,
//! the rolling anomaly window, the alert store with its rules, and the
//! notification settings. All of that state sits behind a single lock.
//! Store events are queued while the lock is held and delivered after it
//! is released, so sinks and listeners may call back into the monitor.
//!
//! One thread at a time delivers queued events, in mutation order. A
//! thread that finds delivery already in progress leaves its events to
//! that thread. An alert list is skipped when a list from a later mutation
//! is already queued, so listeners never see an older list after a newer
//! one.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::orchestrator::{AnalysisOrchestrator, AnalysisReport};
use super::window::DEFAULT_ANOMALY_WINDOW;
use crate::alerts::{
    Alert, AlertCategory, AlertRule, AlertRuleEngine, AlertSeverity, AlertStore, LogSink,
    NewAlert, NotificationSettings, NotificationSink, NotifyError, RuleUpdate, SettingsUpdate,
    StoreEvent, SubscriberRegistry, Subscription, DEFAULT_ALERT_CAPACITY,
};
use crate::alerts::panic_message;
use crate::anomaly::{AnomalyDetection, AnomalySeverity, DEFAULT_ID_BUCKET_MS};
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::insights::{AiInsight, InsightCategory};
use crate::models::{now_ms, MetricSnapshot, TimestampMs};
use crate::observability::{MonitorMetrics, StructuredLogger};

/// Settings for one monitoring instance
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Instance name attached to log events
    pub instance_name: String,
    /// Samples kept per metric
    pub history_capacity: usize,
    /// Retention of the rolling anomaly window
    pub anomaly_window: Duration,
    /// Width of the time bucket used in anomaly ids
    pub anomaly_bucket: Duration,
    /// Alerts kept by the store
    pub alert_capacity: usize,
    /// Initial notification settings
    pub notifications: NotificationSettings,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            instance_name: "sentinel".to_string(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            anomaly_window: DEFAULT_ANOMALY_WINDOW,
            anomaly_bucket: Duration::from_millis(DEFAULT_ID_BUCKET_MS as u64),
            alert_capacity: DEFAULT_ALERT_CAPACITY,
            notifications: NotificationSettings::default(),
        }
    }
}

struct MonitorState {
    orchestrator: AnalysisOrchestrator,
    store: AlertStore,
    settings: NotificationSettings,
}

struct MonitorInner {
    state: Mutex<MonitorState>,
    sink: Arc<dyn NotificationSink>,
    subscribers: SubscriberRegistry,
    metrics: MonitorMetrics,
    logger: StructuredLogger,
    notify_failures: AtomicU64,
    outbox: Mutex<Outbox>,
    delivering: AtomicBool,
}

/// Store events awaiting delivery, in mutation order
#[derive(Default)]
struct Outbox {
    queue: VecDeque<Outgoing>,
    next_batch: u64,
    /// Batch of the newest queued alert list
    latest_list: u64,
}

enum Outgoing {
    /// A new alert with the settings in force when it was created
    Created(Alert, NotificationSettings),
    Changed { batch: u64, alerts: Vec<Alert> },
}

/// Exclusive right to deliver; released on drop, panics included
struct DeliveryGuard<'a>(&'a AtomicBool);

impl<'a> DeliveryGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for DeliveryGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Cloneable handle to one monitoring instance
///
/// Independent monitors share nothing but the process-wide Prometheus
/// collectors.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

impl Monitor {
    /// Create a monitor that delivers notifications through [`LogSink`]
    pub fn new(config: MonitorConfig) -> Self {
        Self::with_sink(config, Arc::new(LogSink))
    }

    pub fn with_sink(config: MonitorConfig, sink: Arc<dyn NotificationSink>) -> Self {
        let bucket_ms = (config.anomaly_bucket.as_millis() as i64).max(1);
        let state = MonitorState {
            orchestrator: AnalysisOrchestrator::new(
                config.history_capacity,
                config.anomaly_window,
                bucket_ms,
            ),
            store: AlertStore::new(config.alert_capacity, AlertRuleEngine::default()),
            settings: config.notifications,
        };

        Self {
            inner: Arc::new(MonitorInner {
                state: Mutex::new(state),
                sink,
                subscribers: SubscriberRegistry::new(),
                metrics: MonitorMetrics::new(),
                logger: StructuredLogger::new(config.instance_name),
                notify_failures: AtomicU64::new(0),
                outbox: Mutex::new(Outbox::default()),
                delivering: AtomicBool::new(false),
            }),
        }
    }

    /// Process one metric snapshot at the current wall-clock time
    pub fn ingest(&self, snapshot: &MetricSnapshot) -> AnalysisReport {
        self.ingest_at(snapshot, now_ms())
    }

    /// Process one metric snapshot as of `now`
    ///
    /// History update, detection, insights, threshold rules and anomaly
    /// alerting complete under the lock before any notification goes out.
    pub fn ingest_at(&self, snapshot: &MetricSnapshot, now: TimestampMs) -> AnalysisReport {
        let start = Instant::now();

        let (report, metrics_tracked) = {
            let mut state = self.inner.state.lock();
            let report = state.orchestrator.analyze(snapshot, now);
            let fired = state.store.check_thresholds(snapshot, now);
            state.store.process_anomalies(&report.new_anomalies, now);

            self.inner.metrics.add_rules_fired(fired.len());
            let tracked = state.orchestrator.history().metric_count();
            self.enqueue(&mut state);
            (report, tracked)
        };

        self.inner
            .metrics
            .observe_analysis_latency(start.elapsed().as_secs_f64());
        self.inner.metrics.set_metrics_tracked(metrics_tracked);
        self.inner
            .metrics
            .add_anomalies_detected(report.new_anomalies.len());
        for anomaly in &report.new_anomalies {
            self.inner.logger.log_anomaly(anomaly);
        }

        self.deliver();
        report
    }

    /// Register a listener for alert-list changes
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&[Alert]) + Send + Sync + 'static,
    {
        self.inner.subscribers.subscribe(listener)
    }

    pub fn acknowledge(&self, id: &str) -> bool {
        self.mutate(|store| store.acknowledge(id))
    }

    pub fn resolve(&self, id: &str) -> bool {
        self.mutate(|store| store.resolve(id))
    }

    pub fn dismiss(&self, id: &str) -> bool {
        self.mutate(|store| store.dismiss(id))
    }

    /// Create an operator-raised alert
    pub fn create_manual(&self, new: NewAlert) -> Alert {
        self.mutate(|store| store.create(new, now_ms()))
    }

    /// Every alert, newest first
    pub fn alerts(&self) -> Vec<Alert> {
        self.inner.state.lock().store.alerts().to_vec()
    }

    pub fn alert(&self, id: &str) -> Option<Alert> {
        self.inner.state.lock().store.get(id).cloned()
    }

    pub fn unacknowledged_alerts(&self) -> Vec<Alert> {
        self.inner.state.lock().store.unacknowledged()
    }

    pub fn active_alerts(&self) -> Vec<Alert> {
        self.inner.state.lock().store.active()
    }

    pub fn alerts_by_category(&self, category: AlertCategory) -> Vec<Alert> {
        self.inner.state.lock().store.by_category(category)
    }

    pub fn alerts_by_severity(&self, severity: AlertSeverity) -> Vec<Alert> {
        self.inner.state.lock().store.by_severity(severity)
    }

    pub fn unacknowledged_count(&self) -> usize {
        self.inner.state.lock().store.unacknowledged_count()
    }

    pub fn critical_count(&self) -> usize {
        self.inner.state.lock().store.critical_count()
    }

    pub fn list_rules(&self) -> Vec<AlertRule> {
        self.inner.state.lock().store.rules().to_vec()
    }

    /// Merge `update` into the rule with `id`; false when no such rule exists
    pub fn update_rule(&self, id: &str, update: RuleUpdate) -> bool {
        self.inner.state.lock().store.update_rule(id, update)
    }

    pub fn add_rule(&self, rule: AlertRule) {
        self.inner.state.lock().store.add_rule(rule);
    }

    pub fn settings(&self) -> NotificationSettings {
        self.inner.state.lock().settings.clone()
    }

    pub fn update_settings(&self, update: SettingsUpdate) -> NotificationSettings {
        let mut state = self.inner.state.lock();
        state.settings.apply(update);
        state.settings.clone()
    }

    /// Anomalies currently inside the rolling window
    pub fn anomalies(&self) -> Vec<AnomalyDetection> {
        self.inner.state.lock().orchestrator.anomalies().to_vec()
    }

    pub fn anomalies_by_severity(&self, severity: AnomalySeverity) -> Vec<AnomalyDetection> {
        self.inner
            .state
            .lock()
            .orchestrator
            .window()
            .by_severity(severity)
    }

    pub fn critical_anomalies(&self) -> Vec<AnomalyDetection> {
        self.anomalies_by_severity(AnomalySeverity::Critical)
    }

    pub fn high_anomalies(&self) -> Vec<AnomalyDetection> {
        self.anomalies_by_severity(AnomalySeverity::High)
    }

    /// Insights from the most recent snapshot
    pub fn insights(&self) -> Vec<AiInsight> {
        self.inner.state.lock().orchestrator.insights().to_vec()
    }

    pub fn insights_by_category(&self, category: InsightCategory) -> Vec<AiInsight> {
        self.inner
            .state
            .lock()
            .orchestrator
            .insights()
            .iter()
            .filter(|i| i.category == category)
            .cloned()
            .collect()
    }

    /// Sink deliveries that have failed since this monitor was created
    pub fn notification_failures(&self) -> u64 {
        self.inner.notify_failures.load(Ordering::Relaxed)
    }

    pub fn metrics(&self) -> &MonitorMetrics {
        &self.inner.metrics
    }

    pub fn logger(&self) -> &StructuredLogger {
        &self.inner.logger
    }

    fn mutate<T>(&self, op: impl FnOnce(&mut AlertStore) -> T) -> T {
        let result = {
            let mut state = self.inner.state.lock();
            let result = op(&mut state.store);
            self.enqueue(&mut state);
            result
        };
        self.deliver();
        result
    }

    /// Move store events into the outbox; called with the state lock held
    fn enqueue(&self, state: &mut MonitorState) {
        let events = state.store.take_events();
        if events.is_empty() {
            return;
        }
        self.inner.metrics.set_active_alerts(state.store.active().len());

        let mut outbox = self.inner.outbox.lock();
        outbox.next_batch += 1;
        let batch = outbox.next_batch;
        for event in events {
            match event {
                StoreEvent::Created(alert) => {
                    let settings = state.settings.clone();
                    outbox.queue.push_back(Outgoing::Created(alert, settings));
                }
                StoreEvent::Changed(alerts) => {
                    outbox.latest_list = batch;
                    outbox.queue.push_back(Outgoing::Changed { batch, alerts });
                }
            }
        }
    }

    /// Deliver queued events unless another thread is already doing so
    fn deliver(&self) {
        loop {
            let Some(guard) = DeliveryGuard::acquire(&self.inner.delivering) else {
                return;
            };
            while let Some(next) = self.next_outgoing() {
                match next {
                    Outgoing::Created(alert, settings) => {
                        self.inner.metrics.inc_alerts_created();
                        self.inner.logger.log_alert_created(&alert);
                        self.notify(&alert, &settings);
                    }
                    Outgoing::Changed { alerts, .. } => self.inner.subscribers.publish(&alerts),
                }
            }
            drop(guard);

            // events queued between the last pop and the release
            if self.inner.outbox.lock().queue.is_empty() {
                return;
            }
        }
    }

    fn next_outgoing(&self) -> Option<Outgoing> {
        let mut outbox = self.inner.outbox.lock();
        while let Some(next) = outbox.queue.pop_front() {
            match next {
                Outgoing::Changed { batch, .. } if batch < outbox.latest_list => continue,
                next => return Some(next),
            }
        }
        None
    }

    fn notify(&self, alert: &Alert, settings: &NotificationSettings) {
        if !settings.should_dispatch(alert.severity) {
            return;
        }

        let sink = &self.inner.sink;
        let outcome = catch_unwind(AssertUnwindSafe(|| sink.dispatch(alert, settings)))
            .unwrap_or_else(|payload| {
                Err(NotifyError::Delivery(format!(
                    "sink panicked: {}",
                    panic_message(payload.as_ref())
                )))
            });

        match outcome {
            Ok(()) => self.inner.metrics.inc_notifications_dispatched(),
            Err(e) => {
                self.inner.notify_failures.fetch_add(1, Ordering::Relaxed);
                self.inner.metrics.inc_notification_failures();
                self.inner.logger.log_notification_failure(alert, &e);
            }
        }
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new(MonitorConfig::default())
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("subscribers", &self.inner.subscribers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertSource;
    use crate::models::snapshot;
    use std::sync::mpsc;
    use std::thread;

    #[derive(Default)]
    struct RecordingSink {
        dispatched: Mutex<Vec<Alert>>,
        fail: bool,
    }

    impl NotificationSink for RecordingSink {
        fn dispatch(
            &self,
            alert: &Alert,
            _settings: &NotificationSettings,
        ) -> Result<(), NotifyError> {
            self.dispatched.lock().push(alert.clone());
            if self.fail {
                return Err(NotifyError::Delivery("sink offline".to_string()));
            }
            Ok(())
        }
    }

    /// Blocks in `dispatch` until the test releases it
    struct GateSink {
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl NotificationSink for GateSink {
        fn dispatch(&self, _: &Alert, _: &NotificationSettings) -> Result<(), NotifyError> {
            let _ = self.entered.lock().send(());
            let _ = self.release.lock().recv();
            Ok(())
        }
    }

    struct PanickingSink;

    impl NotificationSink for PanickingSink {
        fn dispatch(&self, _: &Alert, _: &NotificationSettings) -> Result<(), NotifyError> {
            panic!("webhook client bug")
        }
    }

    fn record_ids(monitor: &Monitor) -> (Arc<Mutex<Vec<Vec<String>>>>, Subscription) {
        let seen: Arc<Mutex<Vec<Vec<String>>>> = Arc::default();
        let recorded = seen.clone();
        let subscription = monitor.subscribe(move |alerts| {
            recorded
                .lock()
                .push(alerts.iter().map(|a| a.id.clone()).collect());
        });
        (seen, subscription)
    }

    fn manual(severity: AlertSeverity) -> NewAlert {
        NewAlert::new(
            "Disk nearly full",
            "raised by operator",
            severity,
            AlertCategory::System,
            AlertSource::Manual,
        )
    }

    #[test]
    fn test_cooldown_through_ingest() {
        let monitor = Monitor::default();
        let reading = snapshot([("responseTime", 250.0)]);

        monitor.ingest_at(&reading, 0);
        monitor.ingest_at(&reading, 60_000);

        let fired: Vec<_> = monitor
            .alerts()
            .into_iter()
            .filter(|a| a.metadata_str("rule") == Some("high-response-time"))
            .collect();
        assert_eq!(fired.len(), 1);
    }

    #[test]
    fn test_sink_respects_threshold() {
        let sink = Arc::new(RecordingSink::default());
        let monitor = Monitor::with_sink(MonitorConfig::default(), sink.clone());

        monitor.create_manual(manual(AlertSeverity::Info));
        monitor.create_manual(manual(AlertSeverity::Error));

        let dispatched = sink.dispatched.lock();
        assert_eq!(dispatched.len(), 1);
        assert_eq!(dispatched[0].severity, AlertSeverity::Error);
    }

    #[test]
    fn test_sink_failure_keeps_alert() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..Default::default()
        });
        let monitor = Monitor::with_sink(MonitorConfig::default(), sink.clone());

        let alert = monitor.create_manual(manual(AlertSeverity::Critical));
        assert_eq!(sink.dispatched.lock().len(), 1);
        assert_eq!(monitor.alert(&alert.id), Some(alert));
        assert_eq!(monitor.critical_count(), 1);
    }

    #[test]
    fn test_disabled_notifications() {
        let sink = Arc::new(RecordingSink::default());
        let monitor = Monitor::with_sink(MonitorConfig::default(), sink.clone());
        monitor.update_settings(SettingsUpdate {
            enabled: Some(false),
            ..Default::default()
        });

        monitor.create_manual(manual(AlertSeverity::Critical));
        assert!(sink.dispatched.lock().is_empty());
        assert_eq!(monitor.alerts().len(), 1);
    }

    #[test]
    fn test_listener_sees_full_list_and_dismissal() {
        let monitor = Monitor::default();
        let seen: Arc<Mutex<Vec<Vec<String>>>> = Arc::default();
        let sink = seen.clone();
        let subscription = monitor.subscribe(move |alerts| {
            sink.lock().push(alerts.iter().map(|a| a.id.clone()).collect());
        });

        let first = monitor.create_manual(manual(AlertSeverity::Info));
        let second = monitor.create_manual(manual(AlertSeverity::Info));
        assert!(monitor.dismiss(&first.id));
        assert!(!monitor.dismiss(&first.id));
        monitor.acknowledge(&second.id);

        let seen_lists = seen.lock().clone();
        assert_eq!(seen_lists.len(), 4);
        assert_eq!(seen_lists[1], vec![second.id.clone(), first.id.clone()]);
        assert!(seen_lists[2..].iter().all(|list| !list.contains(&first.id)));

        subscription.unsubscribe();
        subscription.unsubscribe();
        monitor.create_manual(manual(AlertSeverity::Info));
        assert_eq!(seen.lock().len(), 4);
    }

    #[test]
    fn test_dismiss_during_slow_dispatch_is_final() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let sink = Arc::new(GateSink {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        });
        let monitor = Monitor::with_sink(MonitorConfig::default(), sink);
        let (seen, _subscription) = record_ids(&monitor);

        let creator = monitor.clone();
        let worker = thread::spawn(move || creator.create_manual(manual(AlertSeverity::Critical)));

        // the creating thread is now parked inside the sink
        entered_rx.recv().unwrap();
        let id = monitor.alerts()[0].id.clone();
        assert!(monitor.dismiss(&id));
        release_tx.send(()).unwrap();
        assert_eq!(worker.join().unwrap().id, id);

        assert!(monitor.alerts().is_empty());
        let lists = seen.lock().clone();
        assert_eq!(lists.last(), Some(&Vec::new()));
        assert!(lists.iter().all(|list| !list.contains(&id)));
    }

    #[test]
    fn test_panicking_sink_counts_as_failure() {
        let monitor = Monitor::with_sink(MonitorConfig::default(), Arc::new(PanickingSink));
        let (seen, _subscription) = record_ids(&monitor);

        let alert = monitor.create_manual(manual(AlertSeverity::Critical));
        assert_eq!(monitor.notification_failures(), 1);
        assert_eq!(monitor.alert(&alert.id), Some(alert));

        // delivery keeps working after the panic
        monitor.create_manual(manual(AlertSeverity::Info));
        assert_eq!(seen.lock().len(), 2);
        assert_eq!(seen.lock()[1].len(), 2);
    }

    #[test]
    fn test_listener_mutation_is_delivered_in_order() {
        let monitor = Monitor::default();
        let handle = monitor.clone();
        let acked: Arc<Mutex<Vec<bool>>> = Arc::default();
        let recorded = acked.clone();
        let _subscription = monitor.subscribe(move |alerts| {
            recorded.lock().push(alerts[0].acknowledged);
            if !alerts[0].acknowledged {
                handle.acknowledge(&alerts[0].id);
            }
        });

        monitor.create_manual(manual(AlertSeverity::Warning));

        assert_eq!(*acked.lock(), vec![false, true]);
        assert_eq!(monitor.unacknowledged_count(), 0);
    }

    #[test]
    fn test_listener_may_call_back_into_monitor() {
        let monitor = Monitor::default();
        let handle = monitor.clone();
        let counts: Arc<Mutex<Vec<usize>>> = Arc::default();
        let recorded = counts.clone();
        let _subscription = monitor.subscribe(move |_| {
            recorded.lock().push(handle.unacknowledged_count());
        });

        let alert = monitor.create_manual(manual(AlertSeverity::Warning));
        monitor.acknowledge(&alert.id);

        assert_eq!(*counts.lock(), vec![1, 0]);
    }

    #[test]
    fn test_spike_raises_single_ai_alert_within_bucket() {
        let monitor = Monitor::default();
        let baseline = [100.0, 102.0, 98.0, 101.0, 99.0, 100.0, 101.0, 99.0, 100.0, 102.0];
        for (i, v) in baseline.iter().enumerate() {
            monitor.ingest_at(&snapshot([("serverLoad", *v)]), i as i64 * 1_000);
        }

        monitor.ingest_at(&snapshot([("serverLoad", 400.0)]), 10_000);
        monitor.ingest_at(&snapshot([("serverLoad", 420.0)]), 11_000);

        let spike_alerts: Vec<_> = monitor
            .alerts()
            .into_iter()
            .filter(|a| a.source == AlertSource::Ai && a.title == "AI Alert: Spike Detected")
            .collect();
        assert_eq!(spike_alerts.len(), 1);
        assert!(monitor
            .anomalies()
            .iter()
            .any(|a| a.id == "serverLoad-spike-0"));
    }

    #[test]
    fn test_independent_instances() {
        let a = Monitor::default();
        let b = Monitor::default();

        a.create_manual(manual(AlertSeverity::Info));
        assert_eq!(a.alerts().len(), 1);
        assert!(b.alerts().is_empty());
    }

    #[test]
    fn test_unknown_rule_update() {
        let monitor = Monitor::default();
        assert!(!monitor.update_rule("missing", RuleUpdate::default()));
        assert!(monitor.update_rule(
            "traffic-spike",
            RuleUpdate {
                enabled: Some(false),
                ..Default::default()
            }
        ));
        let rule = monitor
            .list_rules()
            .into_iter()
            .find(|r| r.id == "traffic-spike")
            .unwrap();
        assert!(!rule.enabled);
    }
}
