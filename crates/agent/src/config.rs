//! Agent configuration

use anyhow::{Context, Result};
use sentinel_core::alerts::{AlertSeverity, NotificationSettings};
use sentinel_core::{LoopConfig, MonitorConfig};
use serde::Deserialize;
use std::time::Duration;

/// Environment variable naming an optional configuration file
pub const CONFIG_FILE_ENV: &str = "SENTINEL_CONFIG_FILE";

/// Agent configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Instance name attached to log events
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// API server port for ingestion, administration and health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Seconds between analysis ticks
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,

    /// Retention of detected anomalies in seconds
    #[serde(default = "default_anomaly_window")]
    pub anomaly_window_secs: u64,

    /// Width of the anomaly id time bucket in seconds
    #[serde(default = "default_anomaly_bucket")]
    pub anomaly_bucket_secs: u64,

    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    #[serde(default = "default_alert_capacity")]
    pub alert_capacity: usize,

    #[serde(default = "default_true")]
    pub notify_enabled: bool,

    /// Lowest severity handed to the notification sink
    #[serde(default = "default_notify_threshold")]
    pub notify_threshold: AlertSeverity,

    #[serde(default = "default_true")]
    pub notify_sound: bool,

    #[serde(default = "default_true")]
    pub notify_desktop: bool,

    #[serde(default)]
    pub notify_email: bool,

    #[serde(default)]
    pub notify_slack: bool,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "sentinel".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_tick_interval() -> u64 {
    5
}

fn default_anomaly_window() -> u64 {
    300
}

fn default_anomaly_bucket() -> u64 {
    60
}

fn default_history_capacity() -> usize {
    50
}

fn default_alert_capacity() -> usize {
    100
}

fn default_true() -> bool {
    true
}

fn default_notify_threshold() -> AlertSeverity {
    AlertSeverity::Warning
}

impl AgentConfig {
    /// Load configuration from an optional file and `SENTINEL_*` environment variables
    pub fn load() -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            builder = builder.add_source(config::File::with_name(&path).required(true));
        }

        let config = builder
            .add_source(config::Environment::with_prefix("SENTINEL").try_parsing(true))
            .build()
            .context("failed to read agent configuration")?;

        Self::from_config(config)
    }

    pub fn from_config(config: config::Config) -> Result<Self> {
        config
            .try_deserialize()
            .context("invalid agent configuration")
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            instance_name: self.instance_name.clone(),
            history_capacity: self.history_capacity,
            anomaly_window: Duration::from_secs(self.anomaly_window_secs),
            anomaly_bucket: Duration::from_secs(self.anomaly_bucket_secs.max(1)),
            alert_capacity: self.alert_capacity,
            notifications: self.notification_settings(),
        }
    }

    pub fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            tick_interval: Duration::from_secs(self.tick_interval_secs.max(1)),
        }
    }

    pub fn notification_settings(&self) -> NotificationSettings {
        NotificationSettings {
            enabled: self.notify_enabled,
            sound: self.notify_sound,
            desktop: self.notify_desktop,
            email: self.notify_email,
            slack: self.notify_slack,
            threshold: self.notify_threshold,
        }
    }
}
