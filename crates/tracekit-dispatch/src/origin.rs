//! Request-origin classification (§4.2) and inbound replay header
//! extraction (§6).

use tracing::debug;

/// Classification of the ambient call context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestOrigin {
    UserRequest,
    Internal,
    Ignored,
}

/// Instrumentation-agnostic header lookup, so the dispatcher and its tests
/// never depend on a concrete HTTP crate (§9's instrumentation-agnostic
/// design note).
pub trait HeaderView {
    fn get(&self, name: &str) -> Option<&str>;
}

/// Side-channel header the core's own traffic (match client, remote
/// export) is marked with so it is treated as `ignored` (§4.2).
pub const SKIP_INSTRUMENTATION_HEADER: &str = "x-td-skip-instrumentation";

/// Resolve the origin for a call. The skip-instrumentation header always
/// wins; otherwise falls back to whatever the instrumentation classified
/// the call as (defaulting to `user-request` if it didn't say).
pub fn classify(headers: &dyn HeaderView, hint: Option<RequestOrigin>) -> RequestOrigin {
    if let Some(value) = headers.get(SKIP_INSTRUMENTATION_HEADER) {
        if value.eq_ignore_ascii_case("true") {
            return RequestOrigin::Ignored;
        }
    }
    hint.unwrap_or(RequestOrigin::UserRequest)
}

/// Replay trace identifier an inbound call carries (§6's inbound trace
/// propagation).
pub const REPLAY_TRACE_ID_HEADER: &str = "x-td-trace-id";

/// JSON-encoded environment-variable map an inbound call carries for that
/// replay (§6).
pub const REPLAY_ENV_VARS_HEADER: &str = "x-td-env-vars";

/// What an inbound call's replay headers resolved to, if any were present.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InboundReplayBinding {
    pub trace_id: Option<String>,
    pub env_vars: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Read `x-td-trace-id`/`x-td-env-vars` off an inbound call (§6). A present
/// but unparseable `x-td-env-vars` is logged and treated as absent rather
/// than failing the call — consistent with transform application's
/// never-fatal error handling elsewhere in this system.
pub fn extract_inbound_replay_binding(headers: &dyn HeaderView) -> InboundReplayBinding {
    let trace_id = headers.get(REPLAY_TRACE_ID_HEADER).map(str::to_string);
    let env_vars = headers.get(REPLAY_ENV_VARS_HEADER).and_then(|raw| match serde_json::from_str(raw) {
        Ok(serde_json::Value::Object(map)) => Some(map),
        Ok(_) => {
            debug!("x-td-env-vars did not decode to a JSON object, ignoring");
            None
        }
        Err(err) => {
            debug!(error = %err, "x-td-env-vars is not valid JSON, ignoring");
            None
        }
    });
    InboundReplayBinding { trace_id, env_vars }
}
