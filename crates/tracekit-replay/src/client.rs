//! The matcher client contract (§4.4) plus the default timeout wrapper
//! (§5: "per-call timeout, default 30s, measured from dispatch; on expiry
//! the mock returns 'no match'"). Transport is out of scope (§6) — this
//! crate supplies the trait and an in-memory implementation for tests and
//! for wiring into a real transport elsewhere.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::warn;

use tracekit_types::RecordEntry;

use crate::error::{ReplayError, ReplayResult};
use crate::request::MatchRequest;

pub const DEFAULT_MATCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Queries an out-of-process matcher with a call fingerprint (§4.4).
#[async_trait]
pub trait MatchClient: Send + Sync {
    /// `Ok(Some(entry))` on a match, `Ok(None)` on an explicit "no match"
    /// response, `Err` on a transport-level failure.
    async fn fetch(&self, request: MatchRequest) -> ReplayResult<Option<RecordEntry>>;
}

/// Wraps any [`MatchClient`] with the default dispatch timeout. A timed-out
/// call becomes a `NoMatch`, not a transport error (§5).
pub struct TimeoutMatchClient<C> {
    inner: C,
    timeout: Duration,
}

impl<C: MatchClient> TimeoutMatchClient<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            timeout: DEFAULT_MATCH_TIMEOUT,
        }
    }

    pub fn with_timeout(inner: C, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<C: MatchClient> MatchClient for TimeoutMatchClient<C> {
    async fn fetch(&self, request: MatchRequest) -> ReplayResult<Option<RecordEntry>> {
        match tokio::time::timeout(self.timeout, self.inner.fetch(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "match RPC timed out");
                Ok(None)
            }
        }
    }
}

/// Keys a fixture store by the input-value hash, fulfilling
/// `MatchClient` for tests and for offline record playback.
#[derive(Default)]
pub struct InMemoryMatchClient {
    fixtures: Mutex<HashMap<String, RecordEntry>>,
}

impl InMemoryMatchClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, entry: RecordEntry) {
        self.fixtures.lock().insert(key.into(), entry);
    }

    fn key_for(request: &MatchRequest) -> String {
        tracekit_canon::hash::hash_value(&request.input_value)
    }
}

#[async_trait]
impl MatchClient for InMemoryMatchClient {
    async fn fetch(&self, request: MatchRequest) -> ReplayResult<Option<RecordEntry>> {
        let key = Self::key_for(&request);
        Ok(self.fixtures.lock().get(&key).cloned())
    }
}

/// Convenience: fetch through a client, mapping `Ok(None)` to
/// [`ReplayError::NoMatch`] for call sites that want a flat `Result`.
pub async fn fetch_or_no_match(client: &Arc<dyn MatchClient>, request: MatchRequest) -> ReplayResult<RecordEntry> {
    client.fetch(request).await?.ok_or(ReplayError::NoMatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracekit_types::{RecordEntry, SpanId, SpanKind, TraceId};

    fn sample_request(input: serde_json::Value) -> MatchRequest {
        MatchRequest {
            trace_id: TraceId::new(),
            span_id: SpanId::new(),
            name: "op".to_string(),
            input_value: input,
            package_name: "http".to_string(),
            instrumentation_name: "http".to_string(),
            submodule_name: None,
            kind: SpanKind::Client,
            stack_trace: None,
        }
    }

    #[tokio::test]
    async fn in_memory_client_matches_by_input_hash() {
        let client = InMemoryMatchClient::new();
        let input = serde_json::json!({"a": 1});
        let key = tracekit_canon::hash::hash_value(&input);
        client.insert(key, RecordEntry::exact(serde_json::json!({"ok": true})));

        let result = client.fetch(sample_request(input)).await.unwrap();
        assert!(result.is_some());
    }

    #[tokio::test]
    async fn in_memory_client_returns_none_on_miss() {
        let client = InMemoryMatchClient::new();
        let result = client.fetch(sample_request(serde_json::json!({"x": 1}))).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn timeout_wrapper_maps_slow_calls_to_no_match() {
        struct SlowClient;
        #[async_trait]
        impl MatchClient for SlowClient {
            async fn fetch(&self, _: MatchRequest) -> ReplayResult<Option<RecordEntry>> {
                tokio::time::sleep(Duration::from_secs(10)).await;
                unreachable!("timeout should fire first");
            }
        }

        let client = TimeoutMatchClient::with_timeout(SlowClient, Duration::from_millis(10));
        let result = client.fetch(sample_request(serde_json::json!({}))).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn fetch_or_no_match_maps_none_to_error() {
        let client: Arc<dyn MatchClient> = Arc::new(InMemoryMatchClient::new());
        let err = fetch_or_no_match(&client, sample_request(serde_json::json!({}))).await.unwrap_err();
        assert!(matches!(err, ReplayError::NoMatch));
    }
}
