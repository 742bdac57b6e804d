//! The active span on the current logical task (§3).

use serde::{Deserialize, Serialize};

use crate::ids::{SpanId, TraceId};

/// Snapshot of the span active on the current logical task.
///
/// This is the value that must propagate across suspension points of the
/// host runtime (§5); `tracekit-core` carries it in a `tokio::task_local!`
/// and clones it into every spawned continuation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    /// Ancestor span ids, root first, immediate parent last.
    pub parent_chain: Vec<SpanId>,
    /// Logical replay-trace binding correlating record-side and
    /// replay-side work across mode boundaries (§4.1's
    /// `set-current-replay-trace-id`).
    pub replay_trace_id: Option<String>,
    /// Environment variables an inbound `x-td-env-vars` header bound for
    /// this replay (§6's inbound trace propagation).
    pub replay_env_vars: Option<serde_json::Map<String, serde_json::Value>>,
}

impl TraceContext {
    pub fn root(trace_id: TraceId, span_id: SpanId) -> Self {
        Self {
            trace_id,
            span_id,
            parent_chain: Vec::new(),
            replay_trace_id: None,
            replay_env_vars: None,
        }
    }

    /// Derive the context a child span sees: its parent is the current span.
    pub fn child(&self, span_id: SpanId) -> Self {
        let mut parent_chain = self.parent_chain.clone();
        parent_chain.push(self.span_id);
        Self {
            trace_id: self.trace_id,
            span_id,
            parent_chain,
            replay_trace_id: self.replay_trace_id.clone(),
            replay_env_vars: self.replay_env_vars.clone(),
        }
    }

    pub fn parent_span_id(&self) -> Option<SpanId> {
        self.parent_chain.last().copied()
    }

    pub fn with_replay_trace_id(mut self, id: impl Into<String>) -> Self {
        self.replay_trace_id = Some(id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_context_records_parent_chain() {
        let root = TraceContext::root(TraceId::new(), SpanId::new());
        let mid = root.child(SpanId::new());
        assert_eq!(mid.parent_chain, vec![root.span_id]);
        assert_eq!(mid.parent_span_id(), Some(root.span_id));

        let leaf = mid.child(SpanId::new());
        assert_eq!(leaf.parent_chain, vec![root.span_id, mid.span_id]);
    }

    #[test]
    fn child_inherits_trace_id_and_replay_binding() {
        let root = TraceContext::root(TraceId::new(), SpanId::new()).with_replay_trace_id("r1");
        let child = root.child(SpanId::new());
        assert_eq!(child.trace_id, root.trace_id);
        assert_eq!(child.replay_trace_id.as_deref(), Some("r1"));
    }
}
