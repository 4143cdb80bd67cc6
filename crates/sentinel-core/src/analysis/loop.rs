//! Analysis loop
//!
//! Drives a [`Monitor`] from a [`MetricSource`] on a fixed interval until
//! shutdown is signalled.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::monitor::Monitor;
use super::source::{MetricSource, SourceError};
use crate::health::{components, HealthRegistry};

/// Configuration for the analysis loop
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Time between source polls (default: 5 seconds)
    pub tick_interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(5),
        }
    }
}

/// Periodically drains a metric source into a monitor
pub struct AnalysisLoop {
    monitor: Monitor,
    source: Arc<dyn MetricSource>,
    health: HealthRegistry,
    config: LoopConfig,
    seen_failures: AtomicU64,
}

impl AnalysisLoop {
    pub fn new(
        monitor: Monitor,
        source: Arc<dyn MetricSource>,
        health: HealthRegistry,
        config: LoopConfig,
    ) -> Self {
        let seen_failures = AtomicU64::new(monitor.notification_failures());
        Self {
            monitor,
            source,
            health,
            config,
            seen_failures,
        }
    }

    /// Run until `shutdown` fires or the source closes
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_ms = self.config.tick_interval.as_millis() as u64,
            "Starting analysis loop"
        );
        self.health.register(components::ANALYSIS_LOOP).await;
        self.health.register(components::METRIC_SOURCE).await;
        self.health.register(components::NOTIFIER).await;

        let mut ticker = interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.tick().await {
                        Ok(_) => {}
                        Err(SourceError::Closed) => {
                            warn!("Metric source closed, stopping analysis loop");
                            self.health
                                .set_unhealthy(components::METRIC_SOURCE, "source closed")
                                .await;
                            break;
                        }
                        Err(e) => {
                            warn!(error = %e, "Metric source poll failed");
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!("Shutting down analysis loop");
                    break;
                }
            }
        }

        self.health
            .set_degraded(components::ANALYSIS_LOOP, "analysis loop stopped")
            .await;
    }

    /// Poll the source once and ingest every snapshot it returns
    ///
    /// Returns the number of snapshots processed.
    pub async fn tick(&self) -> Result<usize, SourceError> {
        let start = Instant::now();

        let snapshots = match self.source.poll().await {
            Ok(snapshots) => {
                self.health.set_healthy(components::METRIC_SOURCE).await;
                snapshots
            }
            Err(SourceError::Closed) => return Err(SourceError::Closed),
            Err(e) => {
                self.health
                    .set_degraded(components::METRIC_SOURCE, e.to_string())
                    .await;
                return Err(e);
            }
        };

        let mut anomalies = 0usize;
        for snapshot in &snapshots {
            anomalies += self.monitor.ingest(snapshot).new_anomalies.len();
        }
        self.health.set_healthy(components::ANALYSIS_LOOP).await;
        if !snapshots.is_empty() {
            self.check_notifier().await;
        }

        if !snapshots.is_empty() {
            debug!(
                snapshots = snapshots.len(),
                anomalies = anomalies,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Analysis cycle complete"
            );
        }

        Ok(snapshots.len())
    }

    async fn check_notifier(&self) {
        let failures = self.monitor.notification_failures();
        let seen = self.seen_failures.swap(failures, Ordering::Relaxed);
        if failures > seen {
            self.health
                .set_degraded(
                    components::NOTIFIER,
                    format!("{} notification deliveries failed", failures - seen),
                )
                .await;
        } else {
            self.health.set_healthy(components::NOTIFIER).await;
        }
    }
}
