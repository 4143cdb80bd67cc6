//! Alert data models

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::anomaly::AnomalySeverity;
use crate::models::TimestampMs;

/// Free-form alert metadata
pub type AlertMetadata = BTreeMap<String, Value>;

/// Metadata keys written by the rule engine and anomaly processing
pub mod metadata_keys {
    pub const RULE: &str = "rule";
    pub const METRIC: &str = "metric";
    pub const VALUE: &str = "value";
    pub const THRESHOLD: &str = "threshold";
    pub const ANOMALY_ID: &str = "anomalyId";
    pub const CONFIDENCE: &str = "confidence";
    pub const RECOMMENDATION: &str = "recommendation";
}

/// Alert severity, ordered `info < warning < error < critical`
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl AlertSeverity {
    /// Position in the notification ordering
    pub fn rank(&self) -> u8 {
        match self {
            AlertSeverity::Info => 0,
            AlertSeverity::Warning => 1,
            AlertSeverity::Error => 2,
            AlertSeverity::Critical => 3,
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertSeverity::Info => write!(f, "info"),
            AlertSeverity::Warning => write!(f, "warning"),
            AlertSeverity::Error => write!(f, "error"),
            AlertSeverity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for AlertSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(AlertSeverity::Info),
            "warning" => Ok(AlertSeverity::Warning),
            "error" => Ok(AlertSeverity::Error),
            "critical" => Ok(AlertSeverity::Critical),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

impl From<AnomalySeverity> for AlertSeverity {
    fn from(severity: AnomalySeverity) -> Self {
        match severity {
            AnomalySeverity::Critical => AlertSeverity::Critical,
            AnomalySeverity::High => AlertSeverity::Error,
            AnomalySeverity::Medium => AlertSeverity::Warning,
            AnomalySeverity::Low => AlertSeverity::Info,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    Performance,
    Traffic,
    Security,
    System,
    Ai,
}

impl std::fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertCategory::Performance => write!(f, "performance"),
            AlertCategory::Traffic => write!(f, "traffic"),
            AlertCategory::Security => write!(f, "security"),
            AlertCategory::System => write!(f, "system"),
            AlertCategory::Ai => write!(f, "ai"),
        }
    }
}

impl std::str::FromStr for AlertCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "performance" => Ok(AlertCategory::Performance),
            "traffic" => Ok(AlertCategory::Traffic),
            "security" => Ok(AlertCategory::Security),
            "system" => Ok(AlertCategory::System),
            "ai" => Ok(AlertCategory::Ai),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// Where an alert came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSource {
    Manual,
    Threshold,
    Ai,
    System,
}

impl std::fmt::Display for AlertSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertSource::Manual => write!(f, "manual"),
            AlertSource::Threshold => write!(f, "threshold"),
            AlertSource::Ai => write!(f, "ai"),
            AlertSource::System => write!(f, "system"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Acknowledge,
    Resolve,
    Investigate,
    Escalate,
}

/// An operator action offered alongside an alert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertAction {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: ActionKind,
}

impl AlertAction {
    pub fn investigate() -> Self {
        Self {
            id: "investigate".to_string(),
            label: "Investigate".to_string(),
            kind: ActionKind::Investigate,
        }
    }
}

/// An alert held by the alert store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub title: String,
    pub message: String,
    pub severity: AlertSeverity,
    pub category: AlertCategory,
    pub timestamp: TimestampMs,
    pub acknowledged: bool,
    pub resolved: bool,
    pub source: AlertSource,
    #[serde(default)]
    pub metadata: AlertMetadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<AlertAction>,
}

impl Alert {
    /// Metadata value as a string, if present and a string
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// True for AI alerts raised for the given anomaly id
    pub fn is_for_anomaly(&self, anomaly_id: &str) -> bool {
        self.source == AlertSource::Ai
            && self.metadata_str(metadata_keys::ANOMALY_ID) == Some(anomaly_id)
    }
}

/// Alert fields supplied by the caller; the store fills in identity and state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    pub title: String,
    pub message: String,
    pub severity: AlertSeverity,
    pub category: AlertCategory,
    #[serde(default = "default_source")]
    pub source: AlertSource,
    #[serde(default)]
    pub metadata: AlertMetadata,
    #[serde(default)]
    pub actions: Vec<AlertAction>,
}

fn default_source() -> AlertSource {
    AlertSource::Manual
}

impl NewAlert {
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        severity: AlertSeverity,
        category: AlertCategory,
        source: AlertSource,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity,
            category,
            source,
            metadata: AlertMetadata::new(),
            actions: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn with_action(mut self, action: AlertAction) -> Self {
        self.actions.push(action);
        self
    }
}
