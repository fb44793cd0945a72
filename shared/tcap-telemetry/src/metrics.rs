//! Metrics primitives

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Simple counter metric
#[derive(Clone, Default, Debug)]
pub struct Counter {
    value: Arc<AtomicU64>,
    name: String,
}

impl Counter {
    pub fn new(name: &str) -> Self {
        Self {
            value: Arc::new(AtomicU64::new(0)),
            name: name.to_string(),
        }
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.value.store(0, Ordering::Relaxed);
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Bounded sample histogram. Once `max_samples` is reached the oldest sample
/// is dropped, but `count`, `min` and `max` keep covering every sample seen.
#[derive(Clone, Debug)]
pub struct Histogram {
    inner: Arc<parking_lot::Mutex<HistogramState>>,
    name: String,
    max_samples: usize,
}

#[derive(Debug, Default)]
struct HistogramState {
    samples: VecDeque<f64>,
    count: u64,
    min: Option<f64>,
    max: Option<f64>,
}

/// Point-in-time view of a histogram
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistogramSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

impl Histogram {
    pub fn new(name: &str) -> Self {
        Self::with_capacity(name, 10000)
    }

    pub fn with_capacity(name: &str, max_samples: usize) -> Self {
        Self {
            inner: Arc::new(parking_lot::Mutex::new(HistogramState::default())),
            name: name.to_string(),
            max_samples: max_samples.max(1),
        }
    }

    pub fn record(&self, value: f64) {
        let mut state = self.inner.lock();
        if state.samples.len() >= self.max_samples {
            state.samples.pop_front();
        }
        state.samples.push_back(value);
        state.count += 1;
        state.min = Some(state.min.map_or(value, |m| m.min(value)));
        state.max = Some(state.max.map_or(value, |m| m.max(value)));
    }

    pub fn count(&self) -> u64 {
        self.inner.lock().count
    }

    pub fn percentile(&self, p: f64) -> f64 {
        let state = self.inner.lock();
        percentile_of(&sorted(&state.samples), p)
    }

    pub fn mean(&self) -> f64 {
        let state = self.inner.lock();
        mean_of(state.samples.iter())
    }

    pub fn summary(&self) -> HistogramSummary {
        let state = self.inner.lock();
        let sorted = sorted(&state.samples);
        HistogramSummary {
            count: state.count,
            min: state.min.unwrap_or(0.0),
            max: state.max.unwrap_or(0.0),
            mean: mean_of(sorted.iter()),
            p50: percentile_of(&sorted, 50.0),
            p95: percentile_of(&sorted, 95.0),
            p99: percentile_of(&sorted, 99.0),
        }
    }

    pub fn reset(&self) {
        *self.inner.lock() = HistogramState::default();
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

fn sorted(samples: &VecDeque<f64>) -> Vec<f64> {
    let mut sorted: Vec<f64> = samples.iter().copied().collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

fn percentile_of(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn mean_of<'a>(samples: impl ExactSizeIterator<Item = &'a f64>) -> f64 {
    let n = samples.len();
    if n == 0 {
        return 0.0;
    }
    samples.sum::<f64>() / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter() {
        let counter = Counter::new("test_counter");
        assert_eq!(counter.get(), 0);
        counter.inc();
        assert_eq!(counter.get(), 1);
        counter.add(5);
        assert_eq!(counter.get(), 6);
        counter.reset();
        assert_eq!(counter.get(), 0);
    }

    #[test]
    fn test_histogram() {
        let hist = Histogram::new("test_histogram");
        for v in [3.0, 1.0, 5.0, 2.0, 4.0] {
            hist.record(v);
        }

        assert!((hist.mean() - 3.0).abs() < 0.001);
        assert!((hist.percentile(50.0) - 3.0).abs() < 0.001);

        let summary = hist.summary();
        assert_eq!(summary.count, 5);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 5.0);
    }

    #[test]
    fn test_histogram_bounded_keeps_extremes() {
        let hist = Histogram::with_capacity("bounded", 2);
        hist.record(10.0);
        hist.record(1.0);
        hist.record(2.0);

        let summary = hist.summary();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.max, 10.0);
        assert!((summary.mean - 1.5).abs() < 0.001);
    }

    #[test]
    fn test_histogram_window_slides_over_long_runs() {
        let hist = Histogram::with_capacity("window", 100);
        for v in 0..10_000 {
            hist.record(v as f64);
        }

        let summary = hist.summary();
        assert_eq!(summary.count, 10_000);
        assert_eq!(summary.min, 0.0);
        // Only the last 100 samples remain: 9900..=9999
        assert!((summary.mean - 9949.5).abs() < 0.001);
        assert!((hist.percentile(0.0) - 9900.0).abs() < 0.001);
    }

    #[test]
    fn test_empty_summary() {
        let summary = Histogram::new("empty").summary();
        assert_eq!(summary, HistogramSummary::default());
    }
}
