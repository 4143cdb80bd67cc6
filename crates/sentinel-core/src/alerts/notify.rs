//! Notification sink contract and severity filtering
//!
//! The alert store hands newly created alerts to a [`NotificationSink`]
//! when they pass the configured severity threshold. How the sink delivers
//! them (desktop, audio, chat, email) is up to the implementation.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use super::model::{Alert, AlertSeverity};

/// Failure reported by a notification sink
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification channel {channel} unavailable: {reason}")]
    ChannelUnavailable { channel: String, reason: String },
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// Delivery capability for alerts
pub trait NotificationSink: Send + Sync {
    /// Deliver one alert. Errors are logged by the caller and never
    /// affect the alert store. A panic is caught and counted as a
    /// delivery failure.
    fn dispatch(&self, alert: &Alert, settings: &NotificationSettings) -> Result<(), NotifyError>;
}

/// Text of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Notification preferences
///
/// Only `enabled` and `threshold` drive dispatch filtering; the channel
/// flags are passed through to the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub sound: bool,
    pub desktop: bool,
    pub email: bool,
    pub slack: bool,
    pub threshold: AlertSeverity,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sound: true,
            desktop: true,
            email: false,
            slack: false,
            threshold: AlertSeverity::Warning,
        }
    }
}

impl NotificationSettings {
    /// Whether an alert of `severity` should reach the sink
    pub fn should_dispatch(&self, severity: AlertSeverity) -> bool {
        self.enabled && severity.rank() >= self.threshold.rank()
    }

    /// Names of the channels switched on
    pub fn channels(&self) -> Vec<&'static str> {
        [
            (self.sound, "sound"),
            (self.desktop, "desktop"),
            (self.email, "email"),
            (self.slack, "slack"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect()
    }

    pub fn apply(&mut self, update: SettingsUpdate) {
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        if let Some(sound) = update.sound {
            self.sound = sound;
        }
        if let Some(desktop) = update.desktop {
            self.desktop = desktop;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(slack) = update.slack {
            self.slack = slack;
        }
        if let Some(threshold) = update.threshold {
            self.threshold = threshold;
        }
    }
}

/// Partial notification settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desktop: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<AlertSeverity>,
}

/// Sink that records each dispatched alert as a structured log line
#[derive(Debug, Clone, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn dispatch(&self, alert: &Alert, settings: &NotificationSettings) -> Result<(), NotifyError> {
        info!(
            event = "alert_notification",
            alert_id = %alert.id,
            severity = %alert.severity,
            category = %alert.category,
            channels = ?settings.channels(),
            title = %alert.title,
            "{}",
            alert.message
        );
        Ok(())
    }
}
