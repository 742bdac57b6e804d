//! `initialize`'s argument bundle (§6).

use std::path::PathBuf;

use tracekit_transform::TransformEngineConfig;

/// Arguments to [`crate::Runtime::initialize`]. Mirrors the embedding
/// application's call site: `initialize({ apiKey, env, logLevel,
/// transforms, samplingRate?, baseDirectory? })`.
#[derive(Clone, Debug, Default)]
pub struct InitOptions {
    pub api_key: String,
    pub env: String,
    /// Passed straight through to [`tracekit_telemetry::init_logging`].
    pub log_level: String,
    /// Transform rules supplied directly by the embedding application.
    /// Takes precedence over whatever `.tusk/config.yaml` declares; when
    /// empty, the project config file's `transforms` section is used
    /// instead.
    pub transforms: TransformEngineConfig,
    /// Overrides `recording.samplingRate` from the project config file.
    pub sampling_rate: Option<f64>,
    /// Where to look for `.tusk/config.yaml` and its fallback markers.
    /// Defaults to the process's current working directory.
    pub base_directory: Option<PathBuf>,
    /// Collector base URL. Overrides `collector.url` from the project
    /// config file; one of the two must resolve to a value or the default
    /// remote adapter is left unregistered and spans only reach whatever
    /// adapters the caller adds afterward.
    pub collector_url: Option<String>,
}

impl InitOptions {
    pub fn new(api_key: impl Into<String>, env: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            env: env.into(),
            log_level: "info".to_string(),
            transforms: TransformEngineConfig::default(),
            sampling_rate: None,
            base_directory: None,
            collector_url: None,
        }
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_transforms(mut self, transforms: TransformEngineConfig) -> Self {
        self.transforms = transforms;
        self
    }

    pub fn with_sampling_rate(mut self, rate: f64) -> Self {
        self.sampling_rate = Some(rate);
        self
    }

    pub fn with_base_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_directory = Some(dir.into());
        self
    }

    pub fn with_collector_url(mut self, url: impl Into<String>) -> Self {
        self.collector_url = Some(url.into());
        self
    }
}
