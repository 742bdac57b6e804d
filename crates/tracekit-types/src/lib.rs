//! Shared span/trace data model for tracekit.
//!
//! This crate is the relational foundation: typed ids, the span shape,
//! trace context, and the record entries returned by replay matching. It has
//! **no internal tracekit dependencies** — a pure leaf crate the rest of the
//! workspace builds on.
//!
//! # Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`TraceId`] / [`SpanId`] | Identity |
//! | [`Span`] | The unit of observation (§3) |
//! | [`TraceContext`] | The active span on the current task (§3, §5) |
//! | [`RecordEntry`] | What the replay match service returns (§3, §4.4) |
//! | [`TransformMetadata`] | Record of transforms applied to a span (§4.3) |

pub mod context;
pub mod ids;
pub mod record;
pub mod span;
pub mod transform;

pub use context::TraceContext;
pub use ids::{ParseIdError, SpanId, TraceId};
pub use record::{MatchCandidate, MatchLevel, MatchScope, RecordEntry};
pub use span::{
    PackageType, Span, SpanDuration, SpanKind, SpanOptions, SpanStatus, StatusCode, Timestamp,
};
pub use transform::{TransformActionKind, TransformActionRecord, TransformMetadata};
