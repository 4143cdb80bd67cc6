//! Alert collection and lifecycle
//!
//! Handles:
//! - Creation with fresh identity, newest-first ordering and bounded capacity
//! - Acknowledge / resolve / dismiss transitions
//! - Deduplication of AI alerts by anomaly id
//! - Threshold evaluation through the rule engine
//!
//! Mutations are recorded as [`StoreEvent`]s. The owner drains them with
//! [`AlertStore::take_events`] to dispatch notifications and fan out to
//! subscribers once it has released its lock.

use uuid::Uuid;

use super::model::{
    metadata_keys, Alert, AlertAction, AlertCategory, AlertSeverity, AlertSource, NewAlert,
};
use super::rules::{AlertRule, AlertRuleEngine, RuleUpdate};
use crate::anomaly::AnomalyDetection;
use crate::models::{MetricSnapshot, TimestampMs};

/// Default number of alerts retained
pub const DEFAULT_ALERT_CAPACITY: usize = 100;

/// A change the owner must propagate
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// A new alert that may need to reach the notification sink
    Created(Alert),
    /// The alert list after a mutation
    Changed(Vec<Alert>),
}

/// Bounded, newest-first alert collection
#[derive(Debug, Clone)]
pub struct AlertStore {
    alerts: Vec<Alert>,
    capacity: usize,
    rules: AlertRuleEngine,
    events: Vec<StoreEvent>,
}

impl AlertStore {
    pub fn new(capacity: usize, rules: AlertRuleEngine) -> Self {
        Self {
            alerts: Vec::new(),
            capacity: capacity.max(1),
            rules,
            events: Vec::new(),
        }
    }

    /// Create an alert with a fresh id and `timestamp = now`
    pub fn create(&mut self, new: NewAlert, now: TimestampMs) -> Alert {
        let alert = Alert {
            id: format!("alert-{}", Uuid::new_v4().simple()),
            title: new.title,
            message: new.message,
            severity: new.severity,
            category: new.category,
            timestamp: now,
            acknowledged: false,
            resolved: false,
            source: new.source,
            metadata: new.metadata,
            actions: new.actions,
        };

        self.alerts.insert(0, alert.clone());
        self.alerts.truncate(self.capacity);

        self.events.push(StoreEvent::Created(alert.clone()));
        self.record_change();
        alert
    }

    /// Mark an alert acknowledged; returns whether anything changed
    pub fn acknowledge(&mut self, id: &str) -> bool {
        let changed = match self.find_mut(id) {
            Some(alert) if !alert.acknowledged => {
                alert.acknowledged = true;
                true
            }
            _ => false,
        };
        if changed {
            self.record_change();
        }
        changed
    }

    /// Mark an alert resolved (and therefore acknowledged)
    pub fn resolve(&mut self, id: &str) -> bool {
        let changed = match self.find_mut(id) {
            Some(alert) if !(alert.resolved && alert.acknowledged) => {
                alert.resolved = true;
                alert.acknowledged = true;
                true
            }
            _ => false,
        };
        if changed {
            self.record_change();
        }
        changed
    }

    /// Remove an alert; returns whether it was present
    pub fn dismiss(&mut self, id: &str) -> bool {
        let before = self.alerts.len();
        self.alerts.retain(|a| a.id != id);
        let changed = self.alerts.len() != before;
        if changed {
            self.record_change();
        }
        changed
    }

    /// Raise one AI alert per anomaly id not already alerted on
    pub fn process_anomalies(
        &mut self,
        anomalies: &[AnomalyDetection],
        now: TimestampMs,
    ) -> Vec<Alert> {
        let mut created = Vec::new();

        for anomaly in anomalies {
            if self.alerts.iter().any(|a| a.is_for_anomaly(&anomaly.id)) {
                continue;
            }

            let new = NewAlert::new(
                format!("AI Alert: {} Detected", anomaly.kind.title()),
                anomaly.description.clone(),
                AlertSeverity::from(anomaly.severity),
                AlertCategory::Ai,
                AlertSource::Ai,
            )
            .with_metadata(metadata_keys::ANOMALY_ID, anomaly.id.clone())
            .with_metadata(metadata_keys::CONFIDENCE, anomaly.confidence)
            .with_metadata(metadata_keys::RECOMMENDATION, anomaly.recommendation.clone())
            .with_action(AlertAction::investigate());

            created.push(self.create(new, now));
        }

        created
    }

    /// Evaluate the threshold rules and raise an alert for each that fires
    pub fn check_thresholds(&mut self, snapshot: &MetricSnapshot, now: TimestampMs) -> Vec<Alert> {
        self.rules
            .evaluate(snapshot, now)
            .into_iter()
            .map(|new| self.create(new, now))
            .collect()
    }

    /// Drain the mutations recorded since the last call
    pub fn take_events(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn get(&self, id: &str) -> Option<&Alert> {
        self.alerts.iter().find(|a| a.id == id)
    }

    pub fn unacknowledged(&self) -> Vec<Alert> {
        self.filtered(|a| !a.acknowledged)
    }

    pub fn active(&self) -> Vec<Alert> {
        self.filtered(|a| !a.resolved)
    }

    pub fn by_category(&self, category: AlertCategory) -> Vec<Alert> {
        self.filtered(|a| a.category == category)
    }

    pub fn by_severity(&self, severity: AlertSeverity) -> Vec<Alert> {
        self.filtered(|a| a.severity == severity)
    }

    pub fn unacknowledged_count(&self) -> usize {
        self.alerts.iter().filter(|a| !a.acknowledged).count()
    }

    /// Critical alerts not yet resolved
    pub fn critical_count(&self) -> usize {
        self.alerts
            .iter()
            .filter(|a| a.severity == AlertSeverity::Critical && !a.resolved)
            .count()
    }

    pub fn rules(&self) -> &[AlertRule] {
        self.rules.rules()
    }

    pub fn update_rule(&mut self, id: &str, update: RuleUpdate) -> bool {
        self.rules.update_rule(id, update)
    }

    pub fn add_rule(&mut self, rule: AlertRule) {
        self.rules.add_rule(rule);
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Alert> {
        self.alerts.iter_mut().find(|a| a.id == id)
    }

    fn filtered(&self, pred: impl Fn(&Alert) -> bool) -> Vec<Alert> {
        self.alerts.iter().filter(|a| pred(a)).cloned().collect()
    }

    fn record_change(&mut self) {
        self.events.push(StoreEvent::Changed(self.alerts.clone()));
    }
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_CAPACITY, AlertRuleEngine::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::{AnomalyKind, AnomalySeverity};
    use crate::models::snapshot;

    fn manual(title: &str) -> NewAlert {
        NewAlert::new(
            title,
            "manual alert",
            AlertSeverity::Info,
            AlertCategory::System,
            AlertSource::Manual,
        )
    }

    fn anomaly(id: &str, severity: AnomalySeverity) -> AnomalyDetection {
        AnomalyDetection {
            id: id.to_string(),
            kind: AnomalyKind::Spike,
            severity,
            metric: "responseTime".to_string(),
            description: "responseTime spike detected".to_string(),
            confidence: 80.0,
            timestamp: 0,
            recommendation: "Check database performance".to_string(),
            predicted_impact: None,
        }
    }

    #[test]
    fn test_create_fills_identity_and_state() {
        let mut store = AlertStore::default();
        let alert = store.create(manual("first"), 1_234);

        assert!(alert.id.starts_with("alert-"));
        assert_eq!(alert.timestamp, 1_234);
        assert!(!alert.acknowledged);
        assert!(!alert.resolved);
        assert_eq!(store.get(&alert.id), Some(&alert));
    }

    #[test]
    fn test_newest_first_and_capacity() {
        let mut store = AlertStore::default();
        let oldest = store.create(manual("alert-0"), 0);
        for i in 1..=100 {
            store.create(manual(&format!("alert-{i}")), i);
        }

        assert_eq!(store.len(), 100);
        assert_eq!(store.alerts()[0].title, "alert-100");
        assert_eq!(store.alerts()[99].title, "alert-1");
        assert!(store.get(&oldest.id).is_none());
    }

    #[test]
    fn test_resolve_implies_acknowledged() {
        let mut store = AlertStore::default();
        let alert = store.create(manual("a"), 0);

        assert!(store.resolve(&alert.id));
        let stored = store.get(&alert.id).unwrap();
        assert!(stored.resolved);
        assert!(stored.acknowledged);

        assert!(!store.resolve(&alert.id));
        assert!(!store.acknowledge(&alert.id));
    }

    #[test]
    fn test_unknown_ids_are_noops() {
        let mut store = AlertStore::default();
        store.create(manual("a"), 0);
        store.take_events();

        assert!(!store.acknowledge("missing"));
        assert!(!store.resolve("missing"));
        assert!(!store.dismiss("missing"));
        assert!(store.take_events().is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_dismiss_removes_from_later_snapshots() {
        let mut store = AlertStore::default();
        let keep = store.create(manual("keep"), 0);
        let gone = store.create(manual("gone"), 1);
        store.take_events();

        assert!(store.dismiss(&gone.id));
        assert!(!store.dismiss(&gone.id));
        store.acknowledge(&keep.id);

        let events = store.take_events();
        assert_eq!(events.len(), 2);
        for event in events {
            match event {
                StoreEvent::Changed(list) => assert!(list.iter().all(|a| a.id != gone.id)),
                StoreEvent::Created(_) => panic!("unexpected creation"),
            }
        }
    }

    #[test]
    fn test_anomaly_dedup_across_calls() {
        let mut store = AlertStore::default();
        let batch = vec![anomaly("responseTime-spike-7", AnomalySeverity::High)];

        let first = store.process_anomalies(&batch, 0);
        let second = store.process_anomalies(&batch, 5_000);

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());

        let ai: Vec<_> = store
            .alerts()
            .iter()
            .filter(|a| a.source == AlertSource::Ai)
            .collect();
        assert_eq!(ai.len(), 1);
        assert_eq!(ai[0].severity, AlertSeverity::Error);
        assert_eq!(ai[0].category, AlertCategory::Ai);
        assert_eq!(ai[0].title, "AI Alert: Spike Detected");
        assert_eq!(ai[0].metadata_str("anomalyId"), Some("responseTime-spike-7"));
        assert_eq!(ai[0].actions, vec![AlertAction::investigate()]);
    }

    #[test]
    fn test_duplicate_ids_within_one_batch() {
        let mut store = AlertStore::default();
        let batch = vec![
            anomaly("errorRate-trend-1", AnomalySeverity::Low),
            anomaly("errorRate-trend-1", AnomalySeverity::Low),
            anomaly("errorRate-trend-2", AnomalySeverity::Low),
        ];

        assert_eq!(store.process_anomalies(&batch, 0).len(), 2);
    }

    #[test]
    fn test_manual_alert_with_anomaly_id_does_not_dedup() {
        let mut store = AlertStore::default();
        store.create(
            manual("look-alike").with_metadata("anomalyId", "serverLoad-spike-1"),
            0,
        );

        let created =
            store.process_anomalies(&[anomaly("serverLoad-spike-1", AnomalySeverity::Medium)], 0);
        assert_eq!(created.len(), 1);
    }

    #[test]
    fn test_check_thresholds_creates_rule_alerts() {
        let mut store = AlertStore::default();
        let created = store.check_thresholds(
            &snapshot([
                ("responseTime", 600.0),
                ("errorRate", 0.05),
                ("serverLoad", 40.0),
                ("activeUsers", 1000.0),
            ]),
            0,
        );

        let critical: Vec<_> = created
            .iter()
            .filter(|a| a.severity == AlertSeverity::Critical)
            .collect();
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].category, AlertCategory::Performance);
        assert!(critical[0].message.contains("600"));
        assert!(critical[0].message.contains("500"));
        assert_eq!(store.critical_count(), 1);
    }

    #[test]
    fn test_queries() {
        let mut store = AlertStore::default();
        let a = store.create(manual("a"), 0);
        store.create(
            NewAlert::new(
                "b",
                "traffic",
                AlertSeverity::Warning,
                AlertCategory::Traffic,
                AlertSource::System,
            ),
            1,
        );
        store.acknowledge(&a.id);

        assert_eq!(store.unacknowledged().len(), 1);
        assert_eq!(store.unacknowledged_count(), 1);
        assert_eq!(store.active().len(), 2);
        assert_eq!(store.by_category(AlertCategory::Traffic).len(), 1);
        assert_eq!(store.by_severity(AlertSeverity::Info).len(), 1);
    }
}
