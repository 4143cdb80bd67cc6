//! Single-slot supervisor for long-running scans
//!
//! A scan runs as a detached tokio task that completes after a fixed delay.
//! Only one scan may be in flight; starting another while the slot is held
//! fails with [`ScanError::AlreadyRunning`]. Scans are never cancelled.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::models::{now_ms, TimestampMs};
use crate::observability::StructuredLogger;

/// Default completion delay for a scan
pub const DEFAULT_SCAN_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("a scan is already running")]
    AlreadyRunning,
    #[error("scan failed: {0}")]
    Failed(String),
}

/// Findings of one completed scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub vulnerabilities: usize,
    pub threats: Vec<String>,
}

/// Last finished scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    pub scan_id: u64,
    pub finished_at: TimestampMs,
    pub result: Result<ScanReport, ScanError>,
}

/// Work performed by a scan
#[async_trait]
pub trait Scanner: Send + Sync {
    async fn scan(&self) -> anyhow::Result<ScanReport>;
}

/// Releases the scan slot when dropped, including on panic
struct SlotGuard(Arc<AtomicBool>);

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ScanSupervisor {
    scanner: Arc<dyn Scanner>,
    delay: Duration,
    running: Arc<AtomicBool>,
    next_id: AtomicU64,
    last: Arc<Mutex<Option<ScanOutcome>>>,
    logger: StructuredLogger,
}

impl ScanSupervisor {
    pub fn new(scanner: Arc<dyn Scanner>, delay: Duration, logger: StructuredLogger) -> Self {
        Self {
            scanner,
            delay,
            running: Arc::new(AtomicBool::new(false)),
            next_id: AtomicU64::new(1),
            last: Arc::new(Mutex::new(None)),
            logger,
        }
    }

    /// Start a scan in the background
    ///
    /// Returns the scan id and the task handle; dropping the handle leaves
    /// the scan running.
    pub fn start(&self) -> Result<(u64, JoinHandle<Result<ScanReport, ScanError>>), ScanError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ScanError::AlreadyRunning);
        }
        let guard = SlotGuard(self.running.clone());

        let scan_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let scanner = self.scanner.clone();
        let delay = self.delay;
        let last = self.last.clone();
        let logger = self.logger.clone();

        logger.log_scan_started(scan_id);
        let handle = tokio::spawn(async move {
            let _guard = guard;
            tokio::time::sleep(delay).await;

            let result = scanner
                .scan()
                .await
                .map_err(|e| ScanError::Failed(format!("{e:#}")));

            match &result {
                Ok(report) => logger.log_scan_completed(scan_id, report.vulnerabilities, true),
                Err(_) => logger.log_scan_completed(scan_id, 0, false),
            }

            *last.lock() = Some(ScanOutcome {
                scan_id,
                finished_at: now_ms(),
                result: result.clone(),
            });
            result
        });

        Ok((scan_id, handle))
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn last_outcome(&self) -> Option<ScanOutcome> {
        self.last.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticScanner(Option<ScanReport>);

    #[async_trait]
    impl Scanner for StaticScanner {
        async fn scan(&self) -> anyhow::Result<ScanReport> {
            self.0
                .clone()
                .ok_or_else(|| anyhow::anyhow!("scanner backend unavailable"))
        }
    }

    fn supervisor(report: Option<ScanReport>) -> ScanSupervisor {
        ScanSupervisor::new(
            Arc::new(StaticScanner(report)),
            Duration::from_millis(20),
            StructuredLogger::new("test"),
        )
    }

    #[tokio::test]
    async fn test_overlapping_start_is_rejected() {
        let supervisor = supervisor(Some(ScanReport::default()));

        let (first_id, handle) = supervisor.start().unwrap();
        assert!(supervisor.is_running());
        assert_eq!(supervisor.start().unwrap_err(), ScanError::AlreadyRunning);

        handle.await.unwrap().unwrap();
        assert!(!supervisor.is_running());

        let (second_id, handle) = supervisor.start().unwrap();
        assert!(second_id > first_id);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_outcome_recorded() {
        let report = ScanReport {
            vulnerabilities: 1,
            threats: vec!["Weak password policy".to_string()],
        };
        let supervisor = supervisor(Some(report.clone()));

        assert!(supervisor.last_outcome().is_none());
        let (scan_id, handle) = supervisor.start().unwrap();
        handle.await.unwrap().unwrap();

        let outcome = supervisor.last_outcome().unwrap();
        assert_eq!(outcome.scan_id, scan_id);
        assert_eq!(outcome.result, Ok(report));
    }

    #[tokio::test]
    async fn test_failure_releases_slot() {
        let supervisor = supervisor(None);

        let (_, handle) = supervisor.start().unwrap();
        let result = handle.await.unwrap();
        assert!(matches!(result, Err(ScanError::Failed(_))));
        assert!(!supervisor.is_running());
        assert!(supervisor.start().is_ok());
    }
}
