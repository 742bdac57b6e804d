//! The tracing core's public operations (§4.1): span construction, the
//! mutation API, and the export hand-off.
//!
//! Every operation here is best-effort per §4.1's failure semantics: a
//! problem anywhere in the core is logged and the call proceeds as if
//! tracing were disabled for that span only. Nothing here panics or
//! propagates an error to the instrumentation calling it.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, warn};

use tracekit_canon::Canonical;
use tracekit_types::{Span, SpanId, SpanKind, SpanOptions, SpanStatus, TraceContext, TraceId, TransformMetadata};

use crate::blocking::TraceBlockingManager;
use crate::clock::Clock;
use crate::context;
use crate::exporter::SpanExporter;

/// Span-finalization hook that redacts/masks/replaces/drops fields before a
/// span reaches the exporter (§4.1: "performs transform application
/// (§4.3)"). Implemented by `tracekit_transform::TransformEngine` in the
/// `tracekit-transform` crate and kept as a trait here — like
/// `tracekit-dispatch`'s `HeaderView` — so the core doesn't depend on the
/// transform crate directly, matching the dependency order in
/// SPEC_FULL.md §2 (transform engine sits above tracing core).
pub trait SpanTransform: Send + Sync {
    /// Apply every compiled rule for `package_name` that matches this span's
    /// direction (derived from `kind`: SERVER is inbound, everything else is
    /// outbound) and host/path, mutating `input_value`/`output_value` in
    /// place. Returns the metadata to attach to the span.
    fn apply_to_span(
        &self,
        package_name: &str,
        kind: SpanKind,
        input_value: &mut serde_json::Value,
        output_value: &mut serde_json::Value,
    ) -> TransformMetadata;
}

/// Opaque handle to a span. Every crate outside the tracing core only ever
/// sees this, never a [`Span`] (§3's "ownership of a span is exclusive to
/// the tracing core").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpanHandle {
    pub trace_id: TraceId,
    pub span_id: SpanId,
}

struct ActiveSpan {
    span: Span,
    exportable: bool,
    ended: bool,
    started_at_millis: u64,
}

/// Owns span lifecycle, the mutation API, and the hand-off to the exporter.
pub struct Tracer {
    exporter: Arc<SpanExporter>,
    blocking: Arc<TraceBlockingManager>,
    clock: Arc<dyn Clock>,
    transform: Option<Arc<dyn SpanTransform>>,
    active: DashMap<SpanId, Mutex<ActiveSpan>>,
    replay_bindings: DashMap<TraceId, String>,
    replay_env_var_bindings: DashMap<TraceId, serde_json::Map<String, serde_json::Value>>,
}

impl Tracer {
    pub fn new(
        exporter: Arc<SpanExporter>,
        blocking: Arc<TraceBlockingManager>,
        clock: Arc<dyn Clock>,
        transform: Option<Arc<dyn SpanTransform>>,
    ) -> Self {
        Self {
            exporter,
            blocking,
            clock,
            transform,
            active: DashMap::new(),
            replay_bindings: DashMap::new(),
            replay_env_var_bindings: DashMap::new(),
        }
    }

    /// `create-and-execute` (§4.1). Creates a span as a child of the current
    /// context, activates the new context for the duration of `f`, and
    /// returns its result.
    ///
    /// `exportable` reflects the dispatcher's decision for this call plus
    /// the blocked-trace override: even when `exportable` is `true`, a span
    /// whose trace is already blocked is still executed but never exported,
    /// so the caller's bookkeeping stays symmetric (§4.1).
    pub async fn create_and_execute<F, Fut, T>(&self, exportable: bool, opts: SpanOptions, f: F) -> T
    where
        F: FnOnce(SpanHandle) -> Fut,
        Fut: Future<Output = T>,
    {
        let parent_ctx = context::current();
        let trace_id = parent_ctx.as_ref().map(|c| c.trace_id).unwrap_or_else(TraceId::new);
        let span_id = SpanId::new();
        let parent_span_id = parent_ctx.as_ref().map(|c| c.span_id);

        let exportable = exportable && !self.blocking.is_blocked(trace_id);

        let input_canon = Canonical::of_json(&opts.input_value);
        let mut span_opts = opts;
        span_opts.input_value = input_canon.value;

        let now = self.clock.unix_timestamp();
        let mut span = Span::new(trace_id, span_id, parent_span_id, span_opts, now);
        span.input_schema = input_canon.schema;
        span.input_schema_hash = input_canon.schema_hash;
        span.input_value_hash = input_canon.value_hash;

        let started_at_millis = self.clock.monotonic_millis();
        self.active.insert(
            span_id,
            Mutex::new(ActiveSpan {
                span,
                exportable,
                ended: false,
                started_at_millis,
            }),
        );

        let new_ctx = self.child_context(parent_ctx, trace_id, span_id);
        let handle = SpanHandle { trace_id, span_id };

        let result = context::scope(new_ctx, f(handle)).await;
        self.end_span(handle, None);
        result
    }

    fn child_context(&self, parent: Option<TraceContext>, trace_id: TraceId, span_id: SpanId) -> TraceContext {
        let mut ctx = match parent {
            Some(p) => p.child(span_id),
            None => TraceContext::root(trace_id, span_id),
        };
        if let Some(binding) = self.replay_bindings.get(&trace_id) {
            ctx.replay_trace_id = Some(binding.clone());
        }
        if let Some(binding) = self.replay_env_var_bindings.get(&trace_id) {
            ctx.replay_env_vars = Some(binding.clone());
        }
        ctx
    }

    /// `get-current-span-info` (§4.1): the trace/span id of the active
    /// context, if any.
    pub fn get_current_span_info(&self) -> Option<SpanHandle> {
        context::current().map(|ctx| SpanHandle {
            trace_id: ctx.trace_id,
            span_id: ctx.span_id,
        })
    }

    /// `add-attributes` (§4.1). Merges `output_value`/`metadata`; hashes and
    /// schemas are recomputed at `end_span` time, not here.
    pub fn add_attributes(&self, handle: SpanHandle, output_value: Option<serde_json::Value>, metadata: Option<serde_json::Value>) {
        let Some(entry) = self.active.get(&handle.span_id) else {
            debug!(span_id = %handle.span_id, "add_attributes on unknown span, ignoring");
            return;
        };
        let mut active = entry.lock();
        if active.ended {
            debug!(span_id = %handle.span_id, "add_attributes on ended span, ignoring");
            return;
        }
        if let Some(v) = output_value {
            active.span.output_value = v;
        }
        if let Some(m) = metadata {
            active.span.metadata = merge_json(active.span.metadata.clone(), m);
        }
    }

    /// `set-status` (§4.1).
    pub fn set_status(&self, handle: SpanHandle, status: SpanStatus) {
        let Some(entry) = self.active.get(&handle.span_id) else {
            debug!(span_id = %handle.span_id, "set_status on unknown span, ignoring");
            return;
        };
        let mut active = entry.lock();
        if active.ended {
            debug!(span_id = %handle.span_id, "set_status on ended span, ignoring");
            return;
        }
        active.span.status = status;
    }

    /// `end-span` (§4.1). Idempotent: a second call is a no-op with a debug
    /// log. Finalizes duration, recomputes output schema/hash, and hands the
    /// span to the exporter if it was deemed exportable.
    pub fn end_span(&self, handle: SpanHandle, status: Option<SpanStatus>) {
        let Some((_, cell)) = self.active.remove(&handle.span_id) else {
            debug!(span_id = %handle.span_id, "end_span on unknown or already-ended span, ignoring");
            return;
        };
        let mut active = cell.into_inner();
        if active.ended {
            debug!(span_id = %handle.span_id, "end_span called twice, ignoring");
            return;
        }
        active.ended = true;

        if let Some(status) = status {
            active.span.status = status;
        }

        let elapsed_millis = self.clock.monotonic_millis().saturating_sub(active.started_at_millis);
        active.span.duration = tracekit_types::SpanDuration::from_std(std::time::Duration::from_millis(elapsed_millis));

        let output_canon = Canonical::of_json(&active.span.output_value);
        active.span.output_value = output_canon.value;
        active.span.output_schema = output_canon.schema;
        active.span.output_schema_hash = output_canon.schema_hash;
        active.span.output_value_hash = output_canon.value_hash;

        // Transforms mutate the exported copy of input/output only — the
        // hashes above (and the input hash computed at creation) are taken
        // over the untransformed values, so replay matching still sees the
        // real payload even though the exported span is redacted.
        if let Some(transform) = &self.transform {
            let package_name = active.span.package_name.clone();
            let kind = active.span.kind;
            let metadata = transform.apply_to_span(
                &package_name,
                kind,
                &mut active.span.input_value,
                &mut active.span.output_value,
            );
            if !metadata.is_empty() {
                active.span.transform_metadata = Some(metadata);
            }
        }

        if active.exportable {
            self.exporter.collect(active.span);
        }
    }

    /// `get-trace-info` (§4.1): human-readable, for logs only.
    pub fn get_trace_info(&self) -> String {
        match context::current() {
            Some(ctx) => format!("trace={} span={}", ctx.trace_id, ctx.span_id),
            None => "trace=<none>".to_string(),
        }
    }

    /// `set-current-replay-trace-id` (§4.1). Binds a logical replay-trace to
    /// the active trace so that child recorded/replayed calls, including
    /// ones spawned after this call returns, can be correlated across mode
    /// boundaries.
    pub fn set_current_replay_trace_id(&self, id: impl Into<String>) {
        let Some(ctx) = context::current() else {
            warn!("set_current_replay_trace_id called with no active context, ignoring");
            return;
        };
        self.replay_bindings.insert(ctx.trace_id, id.into());
    }

    /// Binds a replay's environment-variable map (`x-td-env-vars`, §6) to the
    /// active trace, alongside whatever replay-trace id was bound. Same
    /// propagation rule as `set_current_replay_trace_id`: every child span
    /// under this trace inherits it via `child_context`.
    pub fn set_current_replay_env_vars(&self, vars: serde_json::Map<String, serde_json::Value>) {
        let Some(ctx) = context::current() else {
            warn!("set_current_replay_env_vars called with no active context, ignoring");
            return;
        };
        self.replay_env_var_bindings.insert(ctx.trace_id, vars);
    }

    /// Number of spans still open, for diagnostics and tests.
    pub fn active_span_count(&self) -> usize {
        self.active.len()
    }
}

fn merge_json(base: serde_json::Value, incoming: serde_json::Value) -> serde_json::Value {
    match (base, incoming) {
        (serde_json::Value::Object(mut a), serde_json::Value::Object(b)) => {
            for (k, v) in b {
                a.insert(k, v);
            }
            serde_json::Value::Object(a)
        }
        (_, incoming) => incoming,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::size::TraceSizeTracker;
    use tracekit_types::SpanKind;

    fn new_tracer() -> (Tracer, Arc<SpanExporter>, Arc<TraceBlockingManager>, Arc<FakeClock>) {
        let blocking = Arc::new(TraceBlockingManager::new());
        let clock = Arc::new(FakeClock::new());
        let clock_dyn: Arc<dyn Clock> = clock.clone();
        let exporter = Arc::new(SpanExporter::new(
            blocking.clone(),
            Arc::new(TraceSizeTracker::new(10 * 1024 * 1024)),
            clock_dyn.clone(),
        ));
        let tracer = Tracer::new(exporter.clone(), blocking.clone(), clock_dyn, None);
        (tracer, exporter, blocking, clock)
    }

    fn opts() -> SpanOptions {
        SpanOptions::new("op", SpanKind::Client)
    }

    #[tokio::test]
    async fn create_and_execute_runs_closure_and_returns_its_value() {
        let (tracer, _exporter, _blocking, _clock) = new_tracer();
        let out = tracer.create_and_execute(true, opts(), |_handle| async { 42 }).await;
        assert_eq!(out, 42);
    }

    #[tokio::test]
    async fn nested_create_and_execute_forms_a_parent_chain() {
        let (tracer, _exporter, _blocking, _clock) = new_tracer();
        let (outer, inner) = tracer
            .create_and_execute(true, opts(), |outer_handle| async {
                let inner_handle = tracer
                    .create_and_execute(true, opts(), |inner_handle| async move { inner_handle })
                    .await;
                (outer_handle, inner_handle)
            })
            .await;
        assert_eq!(outer.trace_id, inner.trace_id);
        assert_ne!(outer.span_id, inner.span_id);
    }

    #[tokio::test]
    async fn end_span_is_idempotent() {
        let (tracer, _exporter, _blocking, _clock) = new_tracer();
        tracer
            .create_and_execute(true, opts(), |handle| async move {
                tracer.end_span(handle, None);
                tracer.end_span(handle, None); // no panic, just a debug log
            })
            .await;
    }

    #[tokio::test]
    async fn exportable_span_reaches_the_exporter() {
        use crate::exporter::{ExportResult, SpanExportAdapter};
        use async_trait::async_trait;
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CountingAdapter(Arc<AtomicUsize>);
        #[async_trait]
        impl SpanExportAdapter for CountingAdapter {
            fn name(&self) -> &str {
                "mem"
            }
            async fn export_spans(&self, batch: Vec<Span>) -> ExportResult {
                self.0.fetch_add(batch.len(), Ordering::SeqCst);
                ExportResult::success()
            }
        }

        let (tracer, exporter, _blocking, _clock) = new_tracer();
        let count = Arc::new(AtomicUsize::new(0));
        exporter.add_adapter(Arc::new(CountingAdapter(count.clone())));

        tracer.create_and_execute(true, opts(), |_h| async {}).await;
        exporter.flush().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_exportable_span_never_reaches_the_exporter() {
        use crate::exporter::{ExportResult, SpanExportAdapter};
        use async_trait::async_trait;
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CountingAdapter(Arc<AtomicUsize>);
        #[async_trait]
        impl SpanExportAdapter for CountingAdapter {
            fn name(&self) -> &str {
                "mem"
            }
            async fn export_spans(&self, batch: Vec<Span>) -> ExportResult {
                self.0.fetch_add(batch.len(), Ordering::SeqCst);
                ExportResult::success()
            }
        }

        let (tracer, exporter, _blocking, _clock) = new_tracer();
        let count = Arc::new(AtomicUsize::new(0));
        exporter.add_adapter(Arc::new(CountingAdapter(count.clone())));

        tracer.create_and_execute(false, opts(), |_h| async {}).await;
        exporter.flush().await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn replay_trace_binding_propagates_to_children() {
        let (tracer, _exporter, _blocking, _clock) = new_tracer();
        tracer
            .create_and_execute(true, opts(), |_outer| async {
                tracer.set_current_replay_trace_id("replay-42");
                let ctx = tracer
                    .create_and_execute(true, opts(), |_inner| async { context::current() })
                    .await;
                assert_eq!(ctx.unwrap().replay_trace_id.as_deref(), Some("replay-42"));
            })
            .await;
    }

    #[tokio::test]
    async fn replay_env_vars_propagate_to_children() {
        let (tracer, _exporter, _blocking, _clock) = new_tracer();
        tracer
            .create_and_execute(true, opts(), |_outer| async {
                let mut vars = serde_json::Map::new();
                vars.insert("FEATURE_FLAG".to_string(), serde_json::json!("on"));
                tracer.set_current_replay_env_vars(vars);
                let ctx = tracer
                    .create_and_execute(true, opts(), |_inner| async { context::current() })
                    .await;
                assert_eq!(
                    ctx.unwrap().replay_env_vars.unwrap().get("FEATURE_FLAG"),
                    Some(&serde_json::json!("on"))
                );
            })
            .await;
    }

    #[tokio::test]
    async fn add_attributes_on_unknown_span_does_not_panic() {
        let (tracer, _exporter, _blocking, _clock) = new_tracer();
        tracer.add_attributes(
            SpanHandle {
                trace_id: TraceId::new(),
                span_id: SpanId::new(),
            },
            Some(serde_json::json!({"x": 1})),
            None,
        );
    }

    struct ReplacingTransform;
    impl SpanTransform for ReplacingTransform {
        fn apply_to_span(
            &self,
            _package_name: &str,
            _kind: SpanKind,
            input_value: &mut serde_json::Value,
            _output_value: &mut serde_json::Value,
        ) -> TransformMetadata {
            *input_value = serde_json::json!({"redacted": true});
            let mut metadata = TransformMetadata::default();
            metadata.push(tracekit_types::TransformActionRecord::new(
                tracekit_types::TransformActionKind::Redact,
                "fullBody",
            ));
            metadata
        }
    }

    #[tokio::test]
    async fn end_span_runs_the_transform_hook_before_export() {
        use crate::exporter::{ExportResult, SpanExportAdapter};
        use async_trait::async_trait;

        struct CapturingAdapter(Arc<Mutex<Vec<Span>>>);
        #[async_trait]
        impl SpanExportAdapter for CapturingAdapter {
            fn name(&self) -> &str {
                "mem"
            }
            async fn export_spans(&self, batch: Vec<Span>) -> ExportResult {
                self.0.lock().extend(batch);
                ExportResult::success()
            }
        }

        let blocking = Arc::new(TraceBlockingManager::new());
        let clock = Arc::new(FakeClock::new());
        let clock_dyn: Arc<dyn Clock> = clock.clone();
        let exporter = Arc::new(SpanExporter::new(
            blocking.clone(),
            Arc::new(TraceSizeTracker::new(10 * 1024 * 1024)),
            clock_dyn.clone(),
        ));
        let transform: Arc<dyn SpanTransform> = Arc::new(ReplacingTransform);
        let tracer = Tracer::new(exporter.clone(), blocking.clone(), clock_dyn, Some(transform));

        let captured = Arc::new(Mutex::new(Vec::new()));
        exporter.add_adapter(Arc::new(CapturingAdapter(captured.clone())));

        let mut call_opts = opts();
        call_opts.input_value = serde_json::json!({"password": "hunter2"});
        tracer.create_and_execute(true, call_opts, |_h| async {}).await;
        exporter.flush().await;

        let spans = captured.lock();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].input_value, serde_json::json!({"redacted": true}));
        let metadata = spans[0].transform_metadata.as_ref().expect("transform_metadata set");
        assert_eq!(metadata.actions[0].kind, tracekit_types::TransformActionKind::Redact);
    }
}
