//! Record/replay dispatcher (§4.2): a per-call state machine deciding
//! whether a call is live-passed, recorded, replayed, or silently no-ops.

pub mod gate;
pub mod mode;
pub mod origin;

use tracekit_transform::TransformEngine;

pub use gate::{Decision, Dispatcher};
pub use mode::{Mode, MODE_ENV_VAR};
pub use origin::{
    classify, extract_inbound_replay_binding, HeaderView, InboundReplayBinding, RequestOrigin,
    REPLAY_ENV_VARS_HEADER, REPLAY_TRACE_ID_HEADER, SKIP_INSTRUMENTATION_HEADER,
};

/// For inbound calls, the dispatcher additionally consults the transform
/// engine's `should-drop-inbound` predicate (§4.2): a match suppresses the
/// inbound span entirely, before any decision logic runs.
pub fn should_drop_inbound(
    engine: &TransformEngine,
    method: &str,
    url: &str,
    headers: &serde_json::Map<String, serde_json::Value>,
    body: &serde_json::Value,
) -> bool {
    engine.should_drop_inbound(method, url, headers, body)
}
