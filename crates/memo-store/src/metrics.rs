//! Cache and sweep metrics recording.

use metrics::{counter, gauge, histogram};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use memo_core::ExpiryRule;

/// Describes the store metrics. Call once at startup, after the recorder
/// is installed.
pub fn register_store_metrics() {
    metrics::describe_counter!("memo_cache_hits_total", "Total number of cache hits");
    metrics::describe_counter!("memo_cache_misses_total", "Total number of cache misses");
    metrics::describe_counter!(
        "memo_cache_evictions_total",
        "Total number of cache evictions"
    );
    metrics::describe_gauge!("memo_cache_entries", "Current number of entries in cache");
    metrics::describe_histogram!(
        "memo_cache_operation_seconds",
        "Time spent on cache operations"
    );
    metrics::describe_counter!(
        "memo_sweep_deleted_total",
        "Memos deleted by the expiry sweep, by rule"
    );
    metrics::describe_histogram!(
        "memo_sweep_duration_seconds",
        "Time spent on a full expiry sweep"
    );
}

/// Cache metrics recorder.
/// Keeps atomic hit/miss counters alongside the exported metrics.
#[derive(Debug, Clone)]
pub struct CacheMetrics {
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self {
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        counter!("memo_cache_hits_total").increment(1);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        counter!("memo_cache_misses_total").increment(1);
    }

    pub fn record_eviction(&self, reason: &str) {
        counter!("memo_cache_evictions_total", "reason" => reason.to_string()).increment(1);
    }

    pub fn update_entry_count(&self, count: u64) {
        gauge!("memo_cache_entries").set(count as f64);
    }

    pub fn record_operation_duration(&self, operation: &str, duration: Duration) {
        histogram!(
            "memo_cache_operation_seconds",
            "operation" => operation.to_string()
        )
        .record(duration.as_secs_f64());
    }

    /// Hit rate over the lifetime of this recorder (for logging/debugging)
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed) as f64;
        let misses = self.misses.load(Ordering::Relaxed) as f64;
        let total = hits + misses;
        if total == 0.0 { 0.0 } else { hits / total }
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

impl Default for CacheMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Records rows removed by one sweep rule.
pub fn record_sweep_deleted(rule: ExpiryRule, count: usize) {
    if count > 0 {
        counter!("memo_sweep_deleted_total", "rule" => rule.as_str()).increment(count as u64);
    }
}

pub fn record_sweep_duration(duration: Duration) {
    histogram!("memo_sweep_duration_seconds").record(duration.as_secs_f64());
}
