//! Errors raised by the tracing core.

use tracekit_types::{SpanId, TraceId};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("no active span on the current task")]
    NoActiveSpan,

    #[error("span {0} was already ended")]
    AlreadyEnded(SpanId),

    #[error("unknown span {0}")]
    UnknownSpan(SpanId),

    #[error("trace {0} is blocked and is not accepting further spans")]
    TraceBlocked(TraceId),

    #[error("exporter shut down while a flush was in flight")]
    ExporterShutDown,
}

pub type CoreResult<T> = Result<T, CoreError>;
