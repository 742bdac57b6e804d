//! Ambient telemetry surfaces (SPEC_FULL.md §6): the logging front end, the
//! span wire protocol, the default remote export adapter, and the
//! instrumentation manifest model.
//!
//! This crate has no span *lifecycle* logic of its own — that's
//! `tracekit-core`. It owns the parts of the system that face outward: what
//! goes over the wire to a collector, and how the SDK's own logs are set up.

pub mod manifest;
pub mod remote;
pub mod wire;

pub use manifest::{merge_manifests, merge_supported_versions, rewrite_to_public_name, InstrumentationEntry, InstrumentationManifest};
pub use remote::RemoteExportAdapter;
pub use wire::{ExportSpansRequest, ExportSpansResponse, WireSpan};

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the process-wide logging front end.
///
/// Reads `RUST_LOG` via `EnvFilter`, defaulting to `level` when unset.
/// Every tracing-core/dispatcher/transform/replay operation logs through
/// the `tracing` crate (not `log`); this wires that up to stderr the way
/// every binary in the surrounding pack does it. Safe to call once per
/// process — a second call is a no-op (the global subscriber can only be
/// set once, and `try_init`'s error is swallowed since re-initialization
/// is not a failure condition for an embedding application).
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
