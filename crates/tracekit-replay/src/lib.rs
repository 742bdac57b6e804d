//! Replay match service client and mock connection constructors (§4.4).
//!
//! This crate answers one question for an instrumented call running under
//! replay mode: given a call's fingerprint, what result should the call
//! site reconstruct, and in what shape? It does not own a transport to any
//! out-of-process matcher — that integration point is [`MatchClient`],
//! left for the embedding application to implement against whatever
//! channel it actually uses.

pub mod buffer;
pub mod client;
pub mod error;
pub mod events;
pub mod mock_connection;
pub mod request;
pub mod stack;

pub use client::{fetch_or_no_match, InMemoryMatchClient, MatchClient, TimeoutMatchClient, DEFAULT_MATCH_TIMEOUT};
pub use error::{ReplayError, ReplayResult};
pub use events::{EventSink, EventSource, ReplayEvent};
pub use mock_connection::{escape_identifier, format_statement, BindValue, MockConnection};
pub use request::MatchRequest;

use std::sync::Arc;

use serde_json::Value;

/// Resolve a single replayed call end-to-end: fetch a matching record and
/// hand back its raw result, with any wrapped `Buffer` payloads restored.
///
/// When no ambient replay context is available at all (§5: a call made
/// with nothing to correlate it against), callers should skip this
/// entirely and synthesize a no-op result locally via
/// [`EventSource::emit_empty_success`] rather than invoking a match.
pub async fn resolve(client: &Arc<dyn MatchClient>, request: MatchRequest) -> ReplayResult<Value> {
    let mut entry = fetch_or_no_match(client, request).await?;
    buffer::restore_buffers(&mut entry.result);
    Ok(entry.result)
}
