//! The `Runtime` handle (§2, §4.1 supplement): the single construction site
//! for every tracing-core service, built once by [`Runtime::initialize`]
//! and held by the embedding application for its process lifetime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use tracekit_config::ProjectConfig;
use tracekit_core::{Clock, CoreHandle, SystemClock};
use tracekit_dispatch::{Decision, Dispatcher, HeaderView, Mode, RequestOrigin};
use tracekit_replay::MatchClient;
use tracekit_telemetry::RemoteExportAdapter;
use tracekit_transform::TransformEngine;

use crate::error::{InitError, InitResult};
use crate::init::InitOptions;

const DEFAULT_COLLECTOR_URL: &str = "https://app.tracekit.dev";

/// Wires the tracing core, dispatcher, transform engine, and an optional
/// replay match client into one handle.
///
/// Constructed exactly once per process by [`Runtime::initialize`] — there
/// is no global/ambient instance; the embedding application holds this and
/// passes it (or an `Arc` clone of it) to whatever instrumentation wraps
/// patched calls.
pub struct Runtime {
    pub core: Arc<CoreHandle>,
    pub dispatcher: Arc<Dispatcher>,
    pub transform_engine: Arc<TransformEngine>,
    pub config: ProjectConfig,
    pub project_root: std::path::PathBuf,
    match_client: Mutex<Option<Arc<dyn MatchClient>>>,
    ready_logged: AtomicBool,
}

impl Runtime {
    /// `initialize` (§6). Reads `TUSK_DRIFT_MODE` from the process
    /// environment, loads `.tusk/config.yaml` (if present) from
    /// `options.base_directory` or the current working directory, compiles
    /// the transform engine, sets up logging, and registers the default
    /// remote export adapter.
    ///
    /// Invalid configuration or transform rules are the one failure mode
    /// that is fatal here (§7) — everything downstream of a successful
    /// `initialize` degrades silently instead of panicking or propagating.
    pub fn initialize(options: InitOptions) -> InitResult<Self> {
        tracekit_telemetry::init_logging(&options.log_level);

        let base_directory = options
            .base_directory
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
        let loaded = tracekit_config::load(&base_directory)?;

        let transform_config = if options.transforms.is_empty() {
            loaded.config.transforms.clone()
        } else {
            options.transforms.clone()
        };
        let transform_engine = Arc::new(TransformEngine::compile(&transform_config)?);

        let sampling_rate = options.sampling_rate.unwrap_or(loaded.config.recording.sampling_rate);
        let mode = Mode::from_env();
        let dispatcher = Arc::new(Dispatcher::new(mode, sampling_rate));

        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
        let span_transform: Arc<dyn tracekit_core::SpanTransform> = transform_engine.clone();
        let core = Arc::new(CoreHandle::with_transform(clock, Some(span_transform)));

        if loaded.config.recording.export_spans {
            let collector_url = options
                .collector_url
                .clone()
                .or_else(|| loaded.config.collector.url.clone())
                .unwrap_or_else(|| DEFAULT_COLLECTOR_URL.to_string());
            let service_id = loaded
                .config
                .service
                .id
                .clone()
                .or_else(|| loaded.config.service.name.clone())
                .unwrap_or_else(|| "unknown-service".to_string());
            let sdk_instance_id = tracekit_types::SpanId::new().to_hex();
            core.exporter.add_adapter(Arc::new(RemoteExportAdapter::new(
                collector_url,
                options.api_key.clone(),
                service_id,
                options.env.clone(),
                sdk_instance_id,
            )));
        }

        info!(mode = ?mode, sampling_rate, "tracekit runtime initialized");

        Ok(Self {
            core,
            dispatcher,
            transform_engine,
            config: loaded.config,
            project_root: loaded.project_root,
            match_client: Mutex::new(None),
            ready_logged: AtomicBool::new(false),
        })
    }

    /// `markAppAsReady` (§4.2): flips the dispatcher's readiness gate.
    /// Idempotent; only the first call logs.
    pub fn mark_app_as_ready(&self) {
        self.dispatcher.mark_app_as_ready();
        if !self.ready_logged.swap(true, Ordering::SeqCst) {
            info!("application marked ready; pre-app-start recording window closed");
        }
    }

    /// `isAppReady` (§4.2).
    pub fn is_app_ready(&self) -> bool {
        self.dispatcher.is_app_ready()
    }

    pub fn mode(&self) -> Mode {
        self.dispatcher.mode()
    }

    /// Register the transport an embedding application uses to reach its
    /// out-of-process matcher. Left unset, replayed calls in `Replay` mode
    /// always resolve to [`tracekit_replay::ReplayError::NoMatch`] — the
    /// match service's own transport is explicitly out of scope (§6).
    pub fn set_match_client(&self, client: Arc<dyn MatchClient>) {
        *self.match_client.lock() = Some(client);
    }

    pub fn match_client(&self) -> Option<Arc<dyn MatchClient>> {
        self.match_client.lock().clone()
    }

    /// Decide the action for an outbound call, combining the dispatcher's
    /// state-machine decision with the origin classification (§4.2).
    pub fn decide_outbound(&self, headers: &dyn HeaderView, hint: Option<RequestOrigin>, is_root: bool) -> Decision {
        let origin = tracekit_dispatch::classify(headers, hint);
        self.dispatcher.decide_outbound(origin, is_root)
    }

    /// Whether an inbound call should be suppressed entirely before any
    /// dispatcher decision runs (§4.2/§4.3).
    pub fn should_drop_inbound(
        &self,
        method: &str,
        url: &str,
        headers: &serde_json::Map<String, serde_json::Value>,
        body: &serde_json::Value,
    ) -> bool {
        self.transform_engine.should_drop_inbound(method, url, headers, body)
    }

    /// Inbound trace propagation (§6): in `REPLAY` mode, bind an incoming
    /// call's `x-td-trace-id`/`x-td-env-vars` headers to the trace context
    /// active for the span `f` runs inside. A no-op outside `REPLAY`, since
    /// the headers only carry meaning for a replay run.
    ///
    /// Must be called from inside the inbound span's closure — same
    /// requirement as `tracekit_core::Tracer::set_current_replay_trace_id`,
    /// which this binds through to.
    pub fn bind_inbound_replay(&self, headers: &dyn HeaderView) {
        if self.mode() != Mode::Replay {
            return;
        }
        let binding = tracekit_dispatch::extract_inbound_replay_binding(headers);
        if let Some(trace_id) = binding.trace_id {
            self.core.tracer.set_current_replay_trace_id(trace_id);
        }
        if let Some(env_vars) = binding.env_vars {
            self.core.tracer.set_current_replay_env_vars(env_vars);
        }
    }

    /// Flush pending spans and stop the core's background tasks. Does not
    /// consume `self` since an embedding application typically holds this
    /// behind an `Arc` shared with instrumentation call sites.
    pub async fn shutdown(&self) {
        self.core.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn options_against(tmp: &std::path::Path) -> InitOptions {
        InitOptions::new("test-api-key", "test").with_base_directory(tmp)
    }

    #[tokio::test]
    async fn initialize_against_an_empty_project_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("Cargo.toml"), "[workspace]").unwrap();

        let runtime = Runtime::initialize(options_against(tmp.path())).unwrap();
        assert_eq!(runtime.mode(), Mode::Disabled);
        assert!(!runtime.is_app_ready());
        runtime.mark_app_as_ready();
        assert!(runtime.is_app_ready());
        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn initialize_reads_project_config_sampling_rate() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join(".tusk")).unwrap();
        fs::write(
            tmp.path().join(".tusk/config.yaml"),
            "recording:\n  samplingRate: 0.1\ncollector:\n  url: https://collector.example.com\n",
        )
        .unwrap();

        let runtime = Runtime::initialize(options_against(tmp.path())).unwrap();
        assert_eq!(runtime.config.recording.sampling_rate, 0.1);
        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn explicit_options_override_the_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join(".tusk")).unwrap();
        fs::write(tmp.path().join(".tusk/config.yaml"), "recording:\n  samplingRate: 0.9\n").unwrap();

        let options = options_against(tmp.path()).with_sampling_rate(0.25);
        let runtime = Runtime::initialize(options).unwrap();
        assert_eq!(runtime.config.recording.sampling_rate, 0.9, "file value is preserved on the config struct");
        assert_eq!(runtime.dispatcher.sampling_rate(), 0.25, "but the dispatcher uses the override");
        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn invalid_transform_rule_fails_initialize() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("Cargo.toml"), "[workspace]").unwrap();

        let mut transforms = tracekit_transform::TransformEngineConfig::default();
        transforms.insert(
            "http".to_string(),
            vec![serde_json::from_value(serde_json::json!({
                "matcher": {"direction": "outbound", "jsonPath": "$.a", "headerName": "X-Foo"},
                "action": {"type": "drop"},
            }))
            .unwrap()],
        );

        let options = options_against(tmp.path()).with_transforms(transforms);
        let err = Runtime::initialize(options).unwrap_err();
        assert!(matches!(err, InitError::Transform(_)));
    }

    #[test]
    fn match_client_starts_unset() {
        // Pure state test, no filesystem/network involvement.
        let client: Mutex<Option<Arc<dyn MatchClient>>> = Mutex::new(None);
        assert!(client.lock().is_none());
    }

    struct MapHeaders(std::collections::HashMap<String, String>);
    impl HeaderView for MapHeaders {
        fn get(&self, name: &str) -> Option<&str> {
            self.0.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
        }
    }

    #[tokio::test]
    async fn bind_inbound_replay_is_a_no_op_outside_replay_mode() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("Cargo.toml"), "[workspace]").unwrap();
        let runtime = Runtime::initialize(options_against(tmp.path())).unwrap();
        assert_eq!(runtime.mode(), Mode::Disabled);

        let mut map = std::collections::HashMap::new();
        map.insert("x-td-trace-id".to_string(), "replay-1".to_string());
        let headers = MapHeaders(map);

        runtime
            .core
            .tracer
            .create_and_execute(true, tracekit_types::SpanOptions::new("inbound", tracekit_types::SpanKind::Server), |_h| async {
                runtime.bind_inbound_replay(&headers);
                assert!(tracekit_core::context::current().unwrap().replay_trace_id.is_none());
            })
            .await;

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn configured_transform_redacts_a_real_span_before_export() {
        use async_trait::async_trait;
        use tracekit_core::{ExportResult, SpanExportAdapter};
        use tracekit_types::{SpanKind, SpanOptions, TransformActionKind};

        struct CapturingAdapter(Arc<Mutex<Vec<tracekit_types::Span>>>);
        #[async_trait]
        impl SpanExportAdapter for CapturingAdapter {
            fn name(&self) -> &str {
                "mem"
            }
            async fn export_spans(&self, batch: Vec<tracekit_types::Span>) -> ExportResult {
                self.0.lock().extend(batch);
                ExportResult::success()
            }
        }

        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("Cargo.toml"), "[workspace]").unwrap();

        let mut transforms = tracekit_transform::TransformEngineConfig::default();
        transforms.insert(
            "http".to_string(),
            vec![serde_json::from_value(serde_json::json!({
                "matcher": {"direction": "outbound", "fullBody": true},
                "action": {"type": "redact"},
            }))
            .unwrap()],
        );

        let options = options_against(tmp.path()).with_transforms(transforms);
        let runtime = Runtime::initialize(options).unwrap();

        let captured = Arc::new(Mutex::new(Vec::new()));
        runtime.core.exporter.add_adapter(Arc::new(CapturingAdapter(captured.clone())));

        let mut opts = SpanOptions::new("outbound-call", SpanKind::Client);
        opts.package_name = "http".to_string();
        opts.input_value = serde_json::json!({
            "method": "POST",
            "hostname": "api.example.com",
            "path": "/pay",
            "body": "super-secret-payload",
        });

        runtime.core.tracer.create_and_execute(true, opts, |_h| async {}).await;
        runtime.core.exporter.flush().await;

        let spans = captured.lock();
        assert_eq!(spans.len(), 1);
        assert_ne!(spans[0].input_value["body"], serde_json::json!("super-secret-payload"));
        let metadata = spans[0].transform_metadata.as_ref().expect("transform_metadata set on redacted span");
        assert_eq!(metadata.actions[0].kind, TransformActionKind::Redact);
        assert_eq!(metadata.actions[0].field, "fullBody");

        runtime.shutdown().await;
    }
}
