//! Metric sources feeding the analysis loop

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::models::MetricSnapshot;

/// Default queue depth for pushed snapshots
const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("metric source closed")]
    Closed,
    #[error("metric source queue full")]
    Full,
    #[error("metric source failed: {0}")]
    Failed(#[from] anyhow::Error),
}

/// Supplies metric snapshots to the analysis loop
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Snapshots available since the last poll, oldest first
    async fn poll(&self) -> Result<Vec<MetricSnapshot>, SourceError>;
}

/// Push-based source backed by a bounded channel
pub struct ChannelSource {
    rx: Mutex<mpsc::Receiver<MetricSnapshot>>,
}

/// Producer side of a [`ChannelSource`]
#[derive(Clone)]
pub struct SnapshotSender {
    tx: mpsc::Sender<MetricSnapshot>,
}

impl ChannelSource {
    pub fn new() -> (SnapshotSender, Self) {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> (SnapshotSender, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (SnapshotSender { tx }, Self { rx: Mutex::new(rx) })
    }
}

#[async_trait]
impl MetricSource for ChannelSource {
    async fn poll(&self) -> Result<Vec<MetricSnapshot>, SourceError> {
        let mut rx = self.rx.lock();
        let mut snapshots = Vec::new();

        loop {
            match rx.try_recv() {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    if snapshots.is_empty() {
                        return Err(SourceError::Closed);
                    }
                    break;
                }
            }
        }

        Ok(snapshots)
    }
}

impl SnapshotSender {
    /// Queue a snapshot without waiting
    pub fn push(&self, snapshot: MetricSnapshot) -> Result<(), SourceError> {
        self.tx.try_send(snapshot).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SourceError::Full,
            mpsc::error::TrySendError::Closed(_) => SourceError::Closed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::snapshot;

    #[tokio::test]
    async fn test_poll_drains_in_order() {
        let (tx, source) = ChannelSource::new();
        tx.push(snapshot([("responseTime", 1.0)])).unwrap();
        tx.push(snapshot([("responseTime", 2.0)])).unwrap();

        let polled = source.poll().await.unwrap();
        assert_eq!(polled.len(), 2);
        assert_eq!(polled[0]["responseTime"], 1.0);
        assert!(source.poll().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_closed_source() {
        let (tx, source) = ChannelSource::new();
        drop(tx);
        assert!(matches!(source.poll().await, Err(SourceError::Closed)));
    }

    #[tokio::test]
    async fn test_full_queue_rejects_push() {
        let (tx, _source) = ChannelSource::with_capacity(1);
        tx.push(snapshot([("a", 1.0)])).unwrap();
        assert!(matches!(tx.push(snapshot([("a", 2.0)])), Err(SourceError::Full)));
    }
}
