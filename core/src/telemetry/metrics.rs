use serde::Serialize;
use std::sync::Mutex;

/// Counters accumulated over every load a session performs.
pub struct LoadMetrics {
    inner: Mutex<MetricsSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub loads: usize,
    pub failed_loads: usize,
    pub spectra_loaded: usize,
    pub doserates_computed: usize,
}

impl LoadMetrics {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_load(&self, spectra: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.loads += 1;
            metrics.spectra_loaded += spectra;
        }
    }

    pub fn record_failure(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.failed_loads += 1;
        }
    }

    pub fn record_doserates(&self, count: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.doserates_computed += count;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for LoadMetrics {
    fn default() -> Self {
        Self::new()
    }
}
