//! Alert management
//!
//! This module provides:
//! - The alert and rule data model
//! - Threshold rules with per-rule cooldown
//! - A bounded alert store with lifecycle transitions and AI alert deduplication
//! - The notification sink contract and subscriber registry

mod model;
mod notify;
mod rules;
mod store;
mod subscribers;

pub use model::{
    metadata_keys, ActionKind, Alert, AlertAction, AlertCategory, AlertMetadata, AlertSeverity,
    AlertSource, NewAlert,
};
pub(crate) use notify::panic_message;
pub use notify::{LogSink, NotificationSettings, NotificationSink, NotifyError, SettingsUpdate};
pub use rules::{
    category_for_metric, default_rules, AlertRule, AlertRuleEngine, RuleCondition, RuleUpdate,
};
pub use store::{AlertStore, StoreEvent, DEFAULT_ALERT_CAPACITY};
pub use subscribers::{AlertListener, SubscriberRegistry, Subscription};
