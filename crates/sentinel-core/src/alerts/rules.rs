//! Threshold rules with per-rule cooldown

use serde::{Deserialize, Deserializer, Serialize};

use super::model::{metadata_keys, AlertCategory, AlertSeverity, AlertSource, NewAlert};
use crate::models::metric_names::{ACTIVE_USERS, ERROR_RATE, RESPONSE_TIME, SERVER_LOAD};
use crate::models::{MetricSnapshot, TimestampMs};

const MS_PER_MINUTE: i64 = 60 * 1000;

/// Comparison applied between a metric value and a rule threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCondition {
    GreaterThan,
    LessThan,
    Equals,
    NotEquals,
}

impl RuleCondition {
    pub fn matches(&self, value: f64, threshold: f64) -> bool {
        match self {
            RuleCondition::GreaterThan => value > threshold,
            RuleCondition::LessThan => value < threshold,
            RuleCondition::Equals => value == threshold,
            RuleCondition::NotEquals => value != threshold,
        }
    }
}

/// A threshold rule evaluated against every snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRule {
    pub id: String,
    pub name: String,
    pub metric: String,
    pub condition: RuleCondition,
    pub threshold: f64,
    pub severity: AlertSeverity,
    pub enabled: bool,
    pub cooldown_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_triggered: Option<TimestampMs>,
}

impl AlertRule {
    pub fn new(
        id: &str,
        name: &str,
        metric: &str,
        condition: RuleCondition,
        threshold: f64,
        severity: AlertSeverity,
        cooldown_minutes: u32,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            metric: metric.to_string(),
            condition,
            threshold,
            severity,
            enabled: true,
            cooldown_minutes,
            last_triggered: None,
        }
    }

    /// True while the rule is still cooling down from its last firing
    pub fn in_cooldown(&self, now: TimestampMs) -> bool {
        match self.last_triggered {
            Some(last) => now - last < i64::from(self.cooldown_minutes) * MS_PER_MINUTE,
            None => false,
        }
    }

    fn apply(&mut self, update: RuleUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(metric) = update.metric {
            self.metric = metric;
        }
        if let Some(condition) = update.condition {
            self.condition = condition;
        }
        if let Some(threshold) = update.threshold {
            self.threshold = threshold;
        }
        if let Some(severity) = update.severity {
            self.severity = severity;
        }
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        if let Some(cooldown) = update.cooldown_minutes {
            self.cooldown_minutes = cooldown;
        }
        if let Some(last_triggered) = update.last_triggered {
            self.last_triggered = last_triggered;
        }
    }
}

/// Partial rule fields merged by [`AlertRuleEngine::update_rule`]
///
/// `last_triggered` distinguishes an absent field (keep) from an explicit
/// `null` (clear).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<RuleCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<AlertSeverity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_minutes: Option<u32>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_triggered: Option<Option<TimestampMs>>,
}

fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Category an alert for `metric` is filed under
pub fn category_for_metric(metric: &str) -> AlertCategory {
    match metric {
        RESPONSE_TIME | SERVER_LOAD => AlertCategory::Performance,
        ACTIVE_USERS => AlertCategory::Traffic,
        _ => AlertCategory::System,
    }
}

/// The built-in rule set
pub fn default_rules() -> Vec<AlertRule> {
    vec![
        AlertRule::new(
            "high-response-time",
            "High Response Time",
            RESPONSE_TIME,
            RuleCondition::GreaterThan,
            200.0,
            AlertSeverity::Warning,
            5,
        ),
        AlertRule::new(
            "critical-response-time",
            "Critical Response Time",
            RESPONSE_TIME,
            RuleCondition::GreaterThan,
            500.0,
            AlertSeverity::Critical,
            2,
        ),
        AlertRule::new(
            "high-error-rate",
            "High Error Rate",
            ERROR_RATE,
            RuleCondition::GreaterThan,
            0.2,
            AlertSeverity::Error,
            3,
        ),
        AlertRule::new(
            "server-overload",
            "Server Overload",
            SERVER_LOAD,
            RuleCondition::GreaterThan,
            85.0,
            AlertSeverity::Warning,
            5,
        ),
        AlertRule::new(
            "traffic-spike",
            "Traffic Spike",
            ACTIVE_USERS,
            RuleCondition::GreaterThan,
            4000.0,
            AlertSeverity::Info,
            10,
        ),
    ]
}

/// Evaluates threshold rules against metric snapshots
#[derive(Debug, Clone)]
pub struct AlertRuleEngine {
    rules: Vec<AlertRule>,
}

impl AlertRuleEngine {
    pub fn new(rules: Vec<AlertRule>) -> Self {
        Self { rules }
    }

    /// Evaluate every enabled rule, returning one alert per rule that fired
    ///
    /// Rules still in cooldown are skipped, as are rules whose metric is
    /// missing from the snapshot. A firing rule records `now` as its
    /// `last_triggered` time.
    pub fn evaluate(&mut self, snapshot: &MetricSnapshot, now: TimestampMs) -> Vec<NewAlert> {
        let mut fired = Vec::new();

        for rule in self.rules.iter_mut() {
            if !rule.enabled || rule.in_cooldown(now) {
                continue;
            }

            let Some(&value) = snapshot.get(&rule.metric) else {
                continue;
            };

            if !rule.condition.matches(value, rule.threshold) {
                continue;
            }

            rule.last_triggered = Some(now);

            fired.push(
                NewAlert::new(
                    rule.name.clone(),
                    format!(
                        "{} is {} (threshold: {})",
                        rule.metric, value, rule.threshold
                    ),
                    rule.severity,
                    category_for_metric(&rule.metric),
                    AlertSource::Threshold,
                )
                .with_metadata(metadata_keys::RULE, rule.id.clone())
                .with_metadata(metadata_keys::METRIC, rule.metric.clone())
                .with_metadata(metadata_keys::VALUE, value)
                .with_metadata(metadata_keys::THRESHOLD, rule.threshold),
            );
        }

        fired
    }

    pub fn rules(&self) -> &[AlertRule] {
        &self.rules
    }

    pub fn rule(&self, id: &str) -> Option<&AlertRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Merge `update` into the rule with `id`; returns false for an unknown id
    pub fn update_rule(&mut self, id: &str, update: RuleUpdate) -> bool {
        match self.rules.iter_mut().find(|r| r.id == id) {
            Some(rule) => {
                rule.apply(update);
                true
            }
            None => false,
        }
    }

    /// Add a rule, replacing any existing rule with the same id
    pub fn add_rule(&mut self, rule: AlertRule) {
        match self.rules.iter_mut().find(|r| r.id == rule.id) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }
}

impl Default for AlertRuleEngine {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::snapshot;

    const MINUTE: i64 = 60_000;

    #[test]
    fn test_cooldown_suppresses_refire() {
        let mut engine = AlertRuleEngine::default();
        let snap = snapshot([("responseTime", 250.0)]);

        let first = engine.evaluate(&snap, 0);
        let second = engine.evaluate(&snap, MINUTE);

        assert_eq!(first.len(), 1);
        assert_eq!(first[0].title, "High Response Time");
        assert!(second.is_empty());

        // Fires again once the five-minute cooldown has elapsed.
        assert_eq!(engine.evaluate(&snap, 5 * MINUTE).len(), 1);
    }

    #[test]
    fn test_critical_response_time_alert() {
        let mut engine = AlertRuleEngine::default();
        let snap = snapshot([
            ("responseTime", 600.0),
            ("errorRate", 0.05),
            ("serverLoad", 40.0),
            ("activeUsers", 1000.0),
        ]);

        let fired = engine.evaluate(&snap, 0);
        let critical = fired
            .iter()
            .find(|a| a.severity == AlertSeverity::Critical)
            .unwrap();

        assert_eq!(critical.category, AlertCategory::Performance);
        assert_eq!(critical.source, AlertSource::Threshold);
        assert!(critical.message.contains("600"));
        assert!(critical.message.contains("500"));
        assert_eq!(critical.metadata["rule"], "critical-response-time");
        assert_eq!(critical.metadata["value"], 600.0);
    }

    #[test]
    fn test_disabled_rule_and_missing_metric() {
        let mut engine = AlertRuleEngine::default();
        assert!(engine.update_rule(
            "high-error-rate",
            RuleUpdate {
                enabled: Some(false),
                ..Default::default()
            }
        ));

        assert!(engine.evaluate(&snapshot([("errorRate", 0.9)]), 0).is_empty());
        assert!(engine.evaluate(&snapshot([("diskUsage", 99.0)]), 0).is_empty());
    }

    #[test]
    fn test_update_keeps_last_triggered_unless_given() {
        let mut engine = AlertRuleEngine::default();
        engine.evaluate(&snapshot([("serverLoad", 90.0)]), 1_000);

        engine.update_rule(
            "server-overload",
            RuleUpdate {
                threshold: Some(95.0),
                ..Default::default()
            },
        );
        let rule = engine.rule("server-overload").unwrap();
        assert_eq!(rule.threshold, 95.0);
        assert_eq!(rule.last_triggered, Some(1_000));

        engine.update_rule(
            "server-overload",
            RuleUpdate {
                last_triggered: Some(None),
                ..Default::default()
            },
        );
        assert_eq!(engine.rule("server-overload").unwrap().last_triggered, None);
    }

    #[test]
    fn test_update_unknown_rule_is_noop() {
        let mut engine = AlertRuleEngine::default();
        assert!(!engine.update_rule("nope", RuleUpdate::default()));
        assert_eq!(engine.rules().len(), 5);
    }

    #[test]
    fn test_rule_update_json_null_clears() {
        let absent: RuleUpdate = serde_json::from_str(r#"{"threshold": 1.5}"#).unwrap();
        assert_eq!(absent.last_triggered, None);

        let cleared: RuleUpdate = serde_json::from_str(r#"{"lastTriggered": null}"#).unwrap();
        assert_eq!(cleared.last_triggered, Some(None));
    }

    #[test]
    fn test_conditions_and_categories() {
        assert!(RuleCondition::LessThan.matches(1.0, 2.0));
        assert!(RuleCondition::Equals.matches(2.0, 2.0));
        assert!(RuleCondition::NotEquals.matches(1.0, 2.0));
        assert_eq!(category_for_metric("activeUsers"), AlertCategory::Traffic);
        assert_eq!(category_for_metric("errorRate"), AlertCategory::System);
    }

    #[test]
    fn test_add_rule_replaces_same_id() {
        let mut engine = AlertRuleEngine::default();
        engine.add_rule(AlertRule::new(
            "low-traffic",
            "Low Traffic",
            "activeUsers",
            RuleCondition::LessThan,
            100.0,
            AlertSeverity::Warning,
            1,
        ));
        engine.add_rule(AlertRule::new(
            "low-traffic",
            "Very Low Traffic",
            "activeUsers",
            RuleCondition::LessThan,
            10.0,
            AlertSeverity::Error,
            1,
        ));

        assert_eq!(engine.rules().len(), 6);
        assert_eq!(engine.rule("low-traffic").unwrap().name, "Very Low Traffic");
    }
}
