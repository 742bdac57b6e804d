//! The tracing core (§4.1): span lifecycle, async context propagation, the
//! blocked-trace registry, per-trace size accounting, and the batching
//! exporter pipeline.
//!
//! [`CoreHandle`] is the crate's single construction site — it owns one
//! instance of each internal service behind `Arc`, matching the teacher's
//! shared-state pattern rather than exposing ad hoc globals.

pub mod blocking;
pub mod clock;
pub mod context;
pub mod error;
pub mod exporter;
pub mod size;
pub mod tracer;

use std::sync::Arc;
use std::time::Duration;

pub use blocking::{SweeperHandle, TraceBlockingManager};
pub use clock::{Clock, FakeClock, SystemClock};
pub use error::{CoreError, CoreResult};
pub use exporter::{ExportCode, ExportResult, ExportTicker, SpanExportAdapter, SpanExporter};
pub use size::TraceSizeTracker;
pub use tracer::{SpanHandle, SpanTransform, Tracer};

/// Owns every tracing-core service and the background tasks that keep them
/// healthy. Constructed once by `tracekit`'s `Runtime::initialize`.
pub struct CoreHandle {
    pub tracer: Arc<Tracer>,
    pub exporter: Arc<SpanExporter>,
    pub blocking: Arc<TraceBlockingManager>,
    pub clock: Arc<dyn Clock>,
    sweeper: SweeperHandle,
    ticker: ExportTicker,
}

impl CoreHandle {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_transform(clock, None)
    }

    /// Like [`CoreHandle::new`], but wires a span-finalization transform
    /// hook (redact/mask/replace/drop, §4.3) into every `end_span` call.
    pub fn with_transform(clock: Arc<dyn Clock>, transform: Option<Arc<dyn SpanTransform>>) -> Self {
        Self::with_policy(
            clock,
            size::DEFAULT_MAX_TRACE_SIZE_BYTES,
            blocking::DEFAULT_TTL,
            blocking::DEFAULT_SWEEP_INTERVAL,
            exporter::DEFAULT_BATCH_MAX_SPANS,
            exporter::DEFAULT_BATCH_WINDOW,
            transform,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_policy(
        clock: Arc<dyn Clock>,
        max_trace_size_bytes: u64,
        blocked_ttl: Duration,
        sweep_interval: Duration,
        batch_max_spans: usize,
        batch_window: Duration,
        transform: Option<Arc<dyn SpanTransform>>,
    ) -> Self {
        let blocking = Arc::new(TraceBlockingManager::new());
        let sizes = Arc::new(TraceSizeTracker::new(max_trace_size_bytes));
        let exporter = Arc::new(SpanExporter::with_batch_policy(
            blocking.clone(),
            sizes,
            clock.clone(),
            batch_max_spans,
            batch_window,
        ));
        let tracer = Arc::new(Tracer::new(exporter.clone(), blocking.clone(), clock.clone(), transform));

        let sweeper = SweeperHandle::spawn(blocking.clone(), clock.clone(), sweep_interval, blocked_ttl);
        let ticker = ExportTicker::spawn(exporter.clone(), batch_window);

        Self {
            tracer,
            exporter,
            blocking,
            clock,
            sweeper,
            ticker,
        }
    }

    /// Flush pending spans and stop background tasks. The sweeper and
    /// ticker must not keep the process alive past normal shutdown (§3).
    pub async fn shutdown(&self) {
        self.sweeper.stop();
        self.ticker.stop();
        self.exporter.shutdown().await;
    }
}
