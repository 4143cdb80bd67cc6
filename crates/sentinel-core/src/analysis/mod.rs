//! Analysis pipeline
//!
//! Ties history, detection, insights and alerting together:
//! - [`AnalysisOrchestrator`] runs one snapshot through the detectors
//! - [`Monitor`] is the thread-safe instance handle with alert fan-out
//! - [`AnalysisLoop`] polls a [`MetricSource`] and feeds the monitor

mod monitor;
mod orchestrator;
mod r#loop;
mod source;
mod window;

pub use monitor::{Monitor, MonitorConfig};
pub use orchestrator::{AnalysisOrchestrator, AnalysisReport};
pub use r#loop::{AnalysisLoop, LoopConfig};
pub use source::{ChannelSource, MetricSource, SnapshotSender, SourceError};
pub use window::{AnomalyWindow, DEFAULT_ANOMALY_WINDOW};
