//! Batching exporter pipeline fronting a set of named adapters (§3, §4.1).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use tracekit_types::{Span, TraceId};

use crate::blocking::TraceBlockingManager;
use crate::clock::Clock;
use crate::size::TraceSizeTracker;

pub const DEFAULT_BATCH_MAX_SPANS: usize = 512;
pub const DEFAULT_BATCH_WINDOW: Duration = Duration::from_millis(2000);

/// Outcome of a bulk export call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportCode {
    Success,
    Failed,
}

#[derive(Debug, Clone)]
pub struct ExportResult {
    pub code: ExportCode,
    pub error: Option<String>,
}

impl ExportResult {
    pub fn success() -> Self {
        Self {
            code: ExportCode::Success,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            code: ExportCode::Failed,
            error: Some(error.into()),
        }
    }
}

/// A named export sink. In-memory/test sinks typically only implement
/// `collect_span`; remote sinks implement `export_spans` for bulk pushes.
#[async_trait]
pub trait SpanExportAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// Per-adapter single-span push (used by in-memory/test sinks).
    async fn collect_span(&self, span: Span) {
        self.export_spans(vec![span]).await;
    }

    /// Bulk push, used by remote adapters.
    async fn export_spans(&self, batch: Vec<Span>) -> ExportResult;

    /// Flush and release any held resources. Best-effort.
    async fn shutdown(&self) {}
}

fn approx_serialized_size(span: &Span) -> u64 {
    serde_json::to_vec(span).map(|v| v.len() as u64).unwrap_or(0)
}

struct PendingBatch {
    spans: Vec<Span>,
    opened_at_millis: u64,
}

impl PendingBatch {
    fn new(now_millis: u64) -> Self {
        Self {
            spans: Vec::new(),
            opened_at_millis: now_millis,
        }
    }
}

/// Fronts a set of [`SpanExportAdapter`]s and batches spans per §4.1's
/// window policy (N spans or T milliseconds, whichever first).
pub struct SpanExporter {
    adapters: Mutex<HashMap<String, Arc<dyn SpanExportAdapter>>>,
    pending: Mutex<PendingBatch>,
    blocking: Arc<TraceBlockingManager>,
    sizes: Arc<TraceSizeTracker>,
    clock: Arc<dyn Clock>,
    max_spans: usize,
    window: Duration,
}

impl SpanExporter {
    pub fn new(blocking: Arc<TraceBlockingManager>, sizes: Arc<TraceSizeTracker>, clock: Arc<dyn Clock>) -> Self {
        Self::with_batch_policy(blocking, sizes, clock, DEFAULT_BATCH_MAX_SPANS, DEFAULT_BATCH_WINDOW)
    }

    pub fn with_batch_policy(
        blocking: Arc<TraceBlockingManager>,
        sizes: Arc<TraceSizeTracker>,
        clock: Arc<dyn Clock>,
        max_spans: usize,
        window: Duration,
    ) -> Self {
        let now = clock.monotonic_millis();
        Self {
            adapters: Mutex::new(HashMap::new()),
            pending: Mutex::new(PendingBatch::new(now)),
            blocking,
            sizes,
            clock,
            max_spans,
            window,
        }
    }

    pub fn add_adapter(&self, adapter: Arc<dyn SpanExportAdapter>) {
        self.adapters.lock().insert(adapter.name().to_string(), adapter);
    }

    pub fn remove_adapter(&self, name: &str) {
        self.adapters.lock().remove(name);
    }

    /// Offer a span to the exporter.
    ///
    /// Returns `true` if this call pushed the batch to (or past) `max_spans`
    /// — the caller should follow up with [`SpanExporter::flush`]. Collect
    /// itself stays synchronous so it can be called from `end_span` without
    /// forcing every call site through an await.
    pub fn collect(&self, span: Span) -> bool {
        let trace_id = span.trace_id;
        if self.blocking.is_blocked(trace_id) {
            debug!(%trace_id, "dropping span for already-blocked trace");
            return false;
        }

        let size = approx_serialized_size(&span);
        let crossed = self.sizes.record(trace_id, size);
        if crossed {
            self.blocking.block(trace_id, self.clock.monotonic_millis());
            self.drop_queued_spans_for(trace_id);
            warn!(%trace_id, "trace crossed its export size ceiling; blocking");
            return false;
        }

        let mut pending = self.pending.lock();
        pending.spans.push(span);
        pending.spans.len() >= self.max_spans
    }

    fn drop_queued_spans_for(&self, trace_id: TraceId) {
        let mut pending = self.pending.lock();
        pending.spans.retain(|s| s.trace_id != trace_id);
    }

    /// Flush whatever is queued right now to every registered adapter,
    /// regardless of batch window state. Used by the periodic ticker and by
    /// `shutdown`.
    pub async fn flush(&self) {
        let batch = {
            let mut pending = self.pending.lock();
            if pending.spans.is_empty() {
                return;
            }
            let now = self.clock.monotonic_millis();
            std::mem::replace(&mut *pending, PendingBatch::new(now)).spans
        };

        let adapters: Vec<_> = self.adapters.lock().values().cloned().collect();
        for adapter in adapters {
            let result = adapter.export_spans(batch.clone()).await;
            if result.code == ExportCode::Failed {
                warn!(
                    adapter = adapter.name(),
                    error = result.error.as_deref().unwrap_or(""),
                    "span export failed; not retrying"
                );
            }
        }
    }

    /// Flush if the batch window has elapsed since the first span currently
    /// queued. Intended to be polled by a periodic ticker.
    pub async fn flush_if_window_elapsed(&self) {
        let elapsed = {
            let pending = self.pending.lock();
            if pending.spans.is_empty() {
                return;
            }
            self.clock.monotonic_millis().saturating_sub(pending.opened_at_millis)
        };
        if elapsed >= self.window.as_millis() as u64 {
            self.flush().await;
        }
    }

    pub async fn shutdown(&self) {
        self.flush().await;
        let adapters: Vec<_> = self.adapters.lock().values().cloned().collect();
        for adapter in adapters {
            adapter.shutdown().await;
        }
    }
}

/// Background ticker driving [`SpanExporter::flush_if_window_elapsed`].
/// Separate from the blocked-trace sweeper since the two run on unrelated
/// cadences.
pub struct ExportTicker {
    task: JoinHandle<()>,
}

impl ExportTicker {
    pub fn spawn(exporter: Arc<SpanExporter>, tick: Duration) -> Self {
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            loop {
                interval.tick().await;
                exporter.flush_if_window_elapsed().await;
            }
        });
        Self { task }
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for ExportTicker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracekit_types::{SpanOptions, Timestamp};

    use crate::clock::FakeClock;

    struct CountingAdapter {
        name: String,
        calls: Arc<AtomicUsize>,
        spans_seen: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SpanExportAdapter for CountingAdapter {
        fn name(&self) -> &str {
            &self.name
        }

        async fn export_spans(&self, batch: Vec<Span>) -> ExportResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.spans_seen.fetch_add(batch.len(), Ordering::SeqCst);
            ExportResult::success()
        }
    }

    fn sample_span(trace_id: TraceId) -> Span {
        let opts = SpanOptions::new("op", tracekit_types::SpanKind::Client);
        Span::new(
            trace_id,
            tracekit_types::SpanId::new(),
            None,
            opts,
            Timestamp::default(),
        )
    }

    fn new_exporter(clock: Arc<dyn Clock>) -> SpanExporter {
        SpanExporter::new(
            Arc::new(TraceBlockingManager::new()),
            Arc::new(TraceSizeTracker::new(10 * 1024 * 1024)),
            clock,
        )
    }

    #[tokio::test]
    async fn flush_delivers_queued_spans_to_all_adapters() {
        let clock: Arc<dyn Clock> = Arc::new(FakeClock::new());
        let exporter = new_exporter(clock);
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(AtomicUsize::new(0));
        exporter.add_adapter(Arc::new(CountingAdapter {
            name: "mem".into(),
            calls: calls.clone(),
            spans_seen: seen.clone(),
        }));

        let trace = TraceId::new();
        exporter.collect(sample_span(trace));
        exporter.collect(sample_span(trace));
        exporter.flush().await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn reaching_max_spans_triggers_a_flush_on_next_poll() {
        let clock: Arc<dyn Clock> = Arc::new(FakeClock::new());
        let exporter = Arc::new(SpanExporter::with_batch_policy(
            Arc::new(TraceBlockingManager::new()),
            Arc::new(TraceSizeTracker::new(10 * 1024 * 1024)),
            clock,
            2,
            Duration::from_secs(9999),
        ));
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(AtomicUsize::new(0));
        exporter.add_adapter(Arc::new(CountingAdapter {
            name: "mem".into(),
            calls: calls.clone(),
            spans_seen: seen.clone(),
        }));

        let trace = TraceId::new();
        exporter.collect(sample_span(trace));
        exporter.collect(sample_span(trace));
        exporter.flush().await;

        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn crossing_the_size_ceiling_blocks_the_trace_and_drops_its_queued_spans() {
        let clock: Arc<dyn Clock> = Arc::new(FakeClock::new());
        let blocking = Arc::new(TraceBlockingManager::new());
        let sizes = Arc::new(TraceSizeTracker::new(1)); // any span crosses this
        let exporter = SpanExporter::new(blocking.clone(), sizes, clock);

        let trace = TraceId::new();
        exporter.collect(sample_span(trace));
        assert!(blocking.is_blocked(trace));

        // A further span for the same trace is dropped outright.
        assert!(!exporter.collect(sample_span(trace)));
    }

    #[tokio::test]
    async fn flush_if_window_elapsed_waits_for_the_window() {
        let clock = Arc::new(FakeClock::new());
        let clock_dyn: Arc<dyn Clock> = clock.clone();
        let exporter = SpanExporter::with_batch_policy(
            Arc::new(TraceBlockingManager::new()),
            Arc::new(TraceSizeTracker::new(10 * 1024 * 1024)),
            clock_dyn,
            512,
            Duration::from_millis(100),
        );
        let calls = Arc::new(AtomicUsize::new(0));
        exporter.add_adapter(Arc::new(CountingAdapter {
            name: "mem".into(),
            calls: calls.clone(),
            spans_seen: Arc::new(AtomicUsize::new(0)),
        }));

        exporter.collect(sample_span(TraceId::new()));
        exporter.flush_if_window_elapsed().await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        clock.advance(150);
        exporter.flush_if_window_elapsed().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
