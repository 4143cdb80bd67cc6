//! Core library for application metric monitoring
//!
//! This crate provides the core functionality for:
//! - Bounded per-metric history
//! - Statistical, trend and pattern anomaly detection
//! - Heuristic insights
//! - Threshold rules and the alert lifecycle
//! - The analysis loop, scan supervisor, health checks and observability

pub mod alerts;
pub mod analysis;
pub mod anomaly;
pub mod health;
pub mod history;
pub mod insights;
pub mod models;
pub mod observability;
pub mod scan;

pub use analysis::{
    AnalysisLoop, AnalysisReport, ChannelSource, LoopConfig, MetricSource, Monitor, MonitorConfig,
    SnapshotSender, SourceError,
};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{MonitorMetrics, StructuredLogger};
pub use scan::{ScanError, ScanReport, ScanSupervisor, Scanner};
