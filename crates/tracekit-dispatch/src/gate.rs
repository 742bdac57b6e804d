//! The decision gate (§4.2): mode, app-readiness, origin, and sampling
//! combine into one outbound decision. Inbound calls additionally consult
//! the transform engine's drop predicate before any of this runs.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::mode::Mode;
use crate::origin::RequestOrigin;

/// What the instrumentation should do with a call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Decision {
    PassThrough,
    Record { is_pre_app_start: bool },
    Replay,
}

/// Process-wide dispatcher state (§4.2). `mode` is immutable after
/// construction; `app_ready` and `sampling_rate` can change at runtime
/// (`mark_app_as_ready`, used once; sampling rate is fixed at init but
/// exposed for config reloads some deployments want).
pub struct Dispatcher {
    mode: Mode,
    app_ready: AtomicBool,
    sampling_rate: f64,
}

impl Dispatcher {
    pub fn new(mode: Mode, sampling_rate: f64) -> Self {
        Self {
            mode,
            app_ready: AtomicBool::new(false),
            sampling_rate: sampling_rate.clamp(0.0, 1.0),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn mark_app_as_ready(&self) {
        self.app_ready.store(true, Ordering::SeqCst);
    }

    pub fn is_app_ready(&self) -> bool {
        self.app_ready.load(Ordering::SeqCst)
    }

    /// Decide the action for an outbound call. `is_root` gates sampling: a
    /// single coin-flip only ever happens for a trace's root span (§1's
    /// non-goal: "sampling decisions beyond a single coin-flip per root").
    /// Every non-root call under an already-started trace is recorded
    /// unconditionally.
    pub fn decide_outbound(&self, origin: RequestOrigin, is_root: bool) -> Decision {
        match self.mode {
            Mode::Disabled => Decision::PassThrough,
            Mode::Record => self.decide_record(origin, is_root),
            Mode::Replay => self.decide_replay(origin),
        }
    }

    fn decide_record(&self, origin: RequestOrigin, is_root: bool) -> Decision {
        if !self.is_app_ready() {
            return Decision::Record { is_pre_app_start: true };
        }
        match origin {
            RequestOrigin::Ignored => Decision::PassThrough,
            RequestOrigin::Internal => Decision::Record { is_pre_app_start: false },
            RequestOrigin::UserRequest => {
                if !is_root || self.sample() {
                    Decision::Record { is_pre_app_start: false }
                } else {
                    debug!(sampling_rate = self.sampling_rate, "root call dropped by sampling");
                    Decision::PassThrough
                }
            }
        }
    }

    fn decide_replay(&self, origin: RequestOrigin) -> Decision {
        match origin {
            RequestOrigin::Ignored => Decision::PassThrough,
            RequestOrigin::UserRequest | RequestOrigin::Internal => Decision::Replay,
        }
    }

    fn sample(&self) -> bool {
        rand::random::<f64>() < self.sampling_rate
    }
}
