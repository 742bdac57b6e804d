//! Per-trace exported-size accounting (§3, §4.1).
//!
//! Every exported span's serialized size is added to a running total for
//! its trace. Once the total crosses the ceiling, the trace is handed to
//! the [`crate::blocking::TraceBlockingManager`] and no further spans for
//! it are exported.

use dashmap::DashMap;

use tracekit_types::TraceId;

/// Default per-trace export ceiling in bytes (§3).
pub const DEFAULT_MAX_TRACE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug)]
pub struct TraceSizeTracker {
    totals: DashMap<TraceId, u64>,
    ceiling: u64,
}

impl TraceSizeTracker {
    pub fn new(ceiling_bytes: u64) -> Self {
        Self {
            totals: DashMap::new(),
            ceiling: ceiling_bytes,
        }
    }

    /// Add `bytes` to the trace's running total. Returns `true` if this call
    /// pushed the trace over the ceiling (the caller should block it).
    pub fn record(&self, trace_id: TraceId, bytes: u64) -> bool {
        let mut total = self.totals.entry(trace_id).or_insert(0);
        let was_under = *total <= self.ceiling;
        *total += bytes;
        was_under && *total > self.ceiling
    }

    pub fn total_for(&self, trace_id: TraceId) -> u64 {
        self.totals.get(&trace_id).map(|v| *v).unwrap_or(0)
    }

    pub fn forget(&self, trace_id: TraceId) {
        self.totals.remove(&trace_id);
    }
}

impl Default for TraceSizeTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TRACE_SIZE_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_the_ceiling_returns_true_exactly_once() {
        let tracker = TraceSizeTracker::new(100);
        let id = TraceId::new();
        assert!(!tracker.record(id, 60));
        assert!(tracker.record(id, 50)); // 110 > 100, crossed
        assert!(!tracker.record(id, 10)); // already over, no repeat trigger
    }

    #[test]
    fn totals_are_independent_per_trace() {
        let tracker = TraceSizeTracker::new(100);
        let a = TraceId::new();
        let b = TraceId::new();
        tracker.record(a, 90);
        assert_eq!(tracker.total_for(a), 90);
        assert_eq!(tracker.total_for(b), 0);
    }

    #[test]
    fn forget_clears_the_running_total() {
        let tracker = TraceSizeTracker::new(100);
        let id = TraceId::new();
        tracker.record(id, 10);
        tracker.forget(id);
        assert_eq!(tracker.total_for(id), 0);
    }
}
