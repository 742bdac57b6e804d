//! The embeddable facade (§2, §6): `initialize`, `markAppAsReady`,
//! `isAppReady`, and the [`Runtime`] handle that wires every other
//! `tracekit-*` crate together.
//!
//! This is the only crate an instrumentation package or host application
//! should depend on directly; everything else in the workspace is an
//! implementation detail reachable only through what [`Runtime`] exposes.

pub mod error;
pub mod init;
pub mod runtime;

pub use error::{InitError, InitResult};
pub use init::InitOptions;
pub use runtime::Runtime;

pub use tracekit_canon::Canonical;
pub use tracekit_core::{Clock, SpanHandle, SystemClock};
pub use tracekit_dispatch::{classify, Decision, HeaderView, Mode, RequestOrigin};
pub use tracekit_replay::{InMemoryMatchClient, MatchClient, TimeoutMatchClient};
pub use tracekit_transform::TransformEngineConfig;
pub use tracekit_types::{Span, SpanKind, SpanOptions, TraceId};
