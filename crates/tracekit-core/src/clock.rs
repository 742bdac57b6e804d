//! Captured-at-init clock handle (§5).
//!
//! "Original references to runtime primitives are captured at init time so
//! that subsequent instrumentation of those same primitives does not
//! observe its own output." The core never reads `SystemTime::now()` (or
//! any other ambient clock) directly outside of [`SystemClock`] — every
//! other module takes a `&dyn Clock`, so tests can swap in [`FakeClock`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tracekit_types::Timestamp;

/// A source of time the core can depend on without reading globals ad hoc.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Milliseconds since some fixed, unspecified reference point. Only
    /// meaningful as a difference between two calls — used for TTL and
    /// batch-window timing.
    fn monotonic_millis(&self) -> u64;

    /// Wall-clock time as `(seconds, nanos)` since the Unix epoch, for
    /// stamping [`Timestamp`] on spans.
    fn unix_timestamp(&self) -> Timestamp;
}

/// The real clock, captured once at `Runtime::initialize`.
#[derive(Debug, Clone)]
pub struct SystemClock {
    started_at: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn monotonic_millis(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }

    fn unix_timestamp(&self) -> Timestamp {
        let d = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp::from_unix(d.as_secs() as i64, d.subsec_nanos())
    }
}

/// A settable clock for deterministic tests (TTL expiry, batch windows).
#[derive(Debug, Clone)]
pub struct FakeClock {
    millis: Arc<AtomicU64>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn advance(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn monotonic_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }

    fn unix_timestamp(&self) -> Timestamp {
        let millis = self.millis.load(Ordering::SeqCst);
        Timestamp::from_unix((millis / 1000) as i64, ((millis % 1000) * 1_000_000) as u32)
    }
}
