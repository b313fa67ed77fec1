use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Engine-wide counters, shared across runs.
///
/// Cloning is cheap; clones observe the same counters.
#[derive(Clone)]
pub struct EngineMetrics {
    runs: Arc<AtomicU64>,
    fetches_started: Arc<AtomicU64>,
    fetches_completed: Arc<AtomicU64>,
    fetches_failed: Arc<AtomicU64>,
    cache_hits: Arc<AtomicU64>,
    cycles_detected: Arc<AtomicU64>,
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self {
            runs: Arc::new(AtomicU64::new(0)),
            fetches_started: Arc::new(AtomicU64::new(0)),
            fetches_completed: Arc::new(AtomicU64::new(0)),
            fetches_failed: Arc::new(AtomicU64::new(0)),
            cache_hits: Arc::new(AtomicU64::new(0)),
            cycles_detected: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl EngineMetrics {
    pub fn inc_runs(&self) {
        self.runs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_fetches_started(&self) {
        self.fetches_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_fetches_completed(&self) {
        self.fetches_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_fetches_failed(&self) {
        self.fetches_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cycles_detected(&self) {
        self.cycles_detected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }
    pub fn fetches_started(&self) -> u64 {
        self.fetches_started.load(Ordering::Relaxed)
    }
    pub fn fetches_completed(&self) -> u64 {
        self.fetches_completed.load(Ordering::Relaxed)
    }
    pub fn fetches_failed(&self) -> u64 {
        self.fetches_failed.load(Ordering::Relaxed)
    }
    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }
    pub fn cycles_detected(&self) -> u64 {
        self.cycles_detected.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            runs: self.runs(),
            fetches_started: self.fetches_started(),
            fetches_completed: self.fetches_completed(),
            fetches_failed: self.fetches_failed(),
            cache_hits: self.cache_hits(),
            cycles_detected: self.cycles_detected(),
        }
    }
}

/// Point-in-time copy of the engine counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub runs: u64,
    pub fetches_started: u64,
    pub fetches_completed: u64,
    pub fetches_failed: u64,
    pub cache_hits: u64,
    pub cycles_detected: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_counters() {
        let metrics = EngineMetrics::default();
        let clone = metrics.clone();

        metrics.inc_fetches_started();
        clone.inc_fetches_started();

        assert_eq!(metrics.fetches_started(), 2);
        assert_eq!(clone.snapshot().fetches_started, 2);
    }
}
