//! Blocked-trace registry (§3, §4.1).
//!
//! Once a trace's accumulated exported span size crosses the per-trace
//! ceiling, further spans for that trace are dropped without export. This
//! is the registry that records which traces are in that state.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::debug;

use tracekit_types::TraceId;

use crate::clock::Clock;

/// Default TTL for a blocked-trace entry (§3).
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);
/// Default interval between sweeps (§3).
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(2 * 60);

/// Registry of blocked trace ids, each with the monotonic millis at which it
/// was inserted. Membership checks are O(1); a background sweeper evicts
/// entries older than the TTL.
#[derive(Debug, Default)]
pub struct TraceBlockingManager {
    blocked: DashMap<TraceId, u64>,
}

impl TraceBlockingManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_blocked(&self, trace_id: TraceId) -> bool {
        self.blocked.contains_key(&trace_id)
    }

    pub fn block(&self, trace_id: TraceId, now_millis: u64) {
        self.blocked.insert(trace_id, now_millis);
    }

    pub fn unblock(&self, trace_id: TraceId) -> bool {
        self.blocked.remove(&trace_id).is_some()
    }

    pub fn count(&self) -> usize {
        self.blocked.len()
    }

    /// Reset for testing.
    pub fn clear_all(&self) {
        self.blocked.clear();
    }

    /// Evict every entry older than `ttl_millis` as of `now_millis`. Exposed
    /// as a pure step so tests can drive it without a real sweeper task.
    pub fn sweep_once(&self, now_millis: u64, ttl_millis: u64) {
        self.blocked.retain(|trace_id, inserted_at| {
            let age = now_millis.saturating_sub(*inserted_at);
            let keep = age < ttl_millis;
            if !keep {
                debug!(%trace_id, age_ms = age, "blocked-trace entry expired");
            }
            keep
        });
    }
}

/// Handle to the background sweeper task, so shutdown can stop it without
/// keeping the process alive past normal shutdown.
pub struct SweeperHandle {
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn spawn(
        manager: Arc<TraceBlockingManager>,
        clock: Arc<dyn Clock>,
        interval: Duration,
        ttl: Duration,
    ) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick fires immediately; skip it so the first real sweep
            // happens one interval after startup.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                manager.sweep_once(clock.monotonic_millis(), ttl.as_millis() as u64);
            }
        });
        Self { task }
    }

    /// Stop the sweeper. Safe to call from any shutdown path; idempotent.
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
