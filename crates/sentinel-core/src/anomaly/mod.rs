//! Anomaly detection for application metrics
//!
//! This module provides detection for:
//! - Spikes and drops (z-score against recent history)
//! - Sustained trends (least-squares slope)
//! - Pattern deviations (variance and volatility shifts)
//! - Static recommendation and impact advice per metric

pub mod advice;
mod detector;
mod pattern;
mod statistical;
pub mod stats;
mod trend;

pub use detector::{
    AnomalyDetection, AnomalyDetector, AnomalyKind, AnomalySeverity, DEFAULT_ID_BUCKET_MS,
};
pub use pattern::{PatternDetector, PatternDeviation, PatternProfile};
pub use statistical::{StatisticalDetector, ZScoreAnomaly};
pub use stats::Trend;
pub use trend::{TrendAnomaly, TrendDetector};
