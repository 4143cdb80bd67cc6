//! Bounded per-metric history
//!
//! Keeps the most recent samples of every metric in arrival order with
//! FIFO eviction once a series reaches capacity.

use crate::models::MetricSample;
use std::collections::{HashMap, VecDeque};

/// Default number of samples retained per metric
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Per-metric ring of samples
#[derive(Debug, Clone)]
pub struct MetricHistoryStore {
    series: HashMap<String, VecDeque<MetricSample>>,
    capacity: usize,
}

impl MetricHistoryStore {
    /// Create a store retaining `capacity` samples per metric
    pub fn new(capacity: usize) -> Self {
        Self {
            series: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append a sample, evicting the oldest once the series is full
    pub fn record(&mut self, metric: &str, sample: MetricSample) {
        let capacity = self.capacity;
        let series = self
            .series
            .entry(metric.to_string())
            .or_insert_with(|| VecDeque::with_capacity(capacity));

        series.push_back(sample);
        while series.len() > capacity {
            series.pop_front();
        }
    }

    /// Values of a metric, oldest first. Unknown metrics yield an empty vector.
    pub fn values(&self, metric: &str) -> Vec<f64> {
        self.series
            .get(metric)
            .map(|s| s.iter().map(|sample| sample.value).collect())
            .unwrap_or_default()
    }

    /// Samples of a metric, oldest first
    pub fn samples(&self, metric: &str) -> Vec<MetricSample> {
        self.series
            .get(metric)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of samples currently held for a metric
    pub fn len(&self, metric: &str) -> usize {
        self.series.get(metric).map(VecDeque::len).unwrap_or(0)
    }

    /// Number of distinct metrics seen so far
    pub fn metric_count(&self) -> usize {
        self.series.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for MetricHistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_metric_is_empty() {
        let store = MetricHistoryStore::default();
        assert!(store.values("responseTime").is_empty());
        assert_eq!(store.len("responseTime"), 0);
    }

    #[test]
    fn test_values_in_arrival_order() {
        let mut store = MetricHistoryStore::default();
        for (i, v) in [3.0, 1.0, 2.0].iter().enumerate() {
            store.record("serverLoad", MetricSample::new(i as i64, *v));
        }

        assert_eq!(store.values("serverLoad"), vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_fifty_first_sample_evicts_oldest() {
        let mut store = MetricHistoryStore::default();
        for i in 0..51 {
            store.record("activeUsers", MetricSample::new(i, i as f64));
        }

        let values = store.values("activeUsers");
        assert_eq!(values.len(), 50);
        assert_eq!(values.first().copied(), Some(1.0));
        assert_eq!(values.last().copied(), Some(50.0));
    }

    #[test]
    fn test_series_are_independent() {
        let mut store = MetricHistoryStore::new(3);
        for i in 0..5 {
            store.record("a", MetricSample::new(i, i as f64));
        }
        store.record("b", MetricSample::new(0, 42.0));

        assert_eq!(store.values("a"), vec![2.0, 3.0, 4.0]);
        assert_eq!(store.values("b"), vec![42.0]);
        assert_eq!(store.metric_count(), 2);
    }
}
