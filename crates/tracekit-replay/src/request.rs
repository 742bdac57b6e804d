//! The fingerprint sent to the out-of-process matcher (§4.4).

use serde::{Deserialize, Serialize};

use tracekit_types::{SpanId, SpanKind, TraceId};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchRequest {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub name: String,
    pub input_value: serde_json::Value,
    pub package_name: String,
    pub instrumentation_name: String,
    pub submodule_name: Option<String>,
    pub kind: SpanKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<Vec<String>>,
}
