//! The recognized key set of the project configuration file (§6). All
//! sections are optional; a missing section takes its type's `Default`.

use std::time::Duration;

use serde::Deserialize;

use tracekit_transform::TransformEngineConfig;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub traces: TracesConfig,
    /// The out-of-process collector this process exports spans to. Named
    /// for what it is rather than carrying the source product's literal
    /// config key.
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub test_execution: TestExecutionConfig,
    #[serde(default)]
    pub comparison: ComparisonConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
    /// One transform rule list per package family (`http`, `fetch`, …).
    #[serde(default)]
    pub transforms: TransformEngineConfig,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceConfig {
    pub id: Option<String>,
    pub name: Option<String>,
    pub port: Option<u16>,
    pub start: StartConfig,
    pub readiness_check: ReadinessCheckConfig,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StartConfig {
    pub command: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReadinessCheckConfig {
    pub command: Option<String>,
    #[serde(with = "humantime_seconds", default)]
    pub timeout: Option<Duration>,
    #[serde(with = "humantime_seconds", default)]
    pub interval: Option<Duration>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TracesConfig {
    pub dir: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CollectorConfig {
    pub url: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TestExecutionConfig {
    pub concurrency: Option<u32>,
    #[serde(with = "humantime_seconds", default)]
    pub timeout: Option<Duration>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComparisonConfig {
    pub ignore_fields: Vec<String>,
}

fn default_sampling_rate() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecordingConfig {
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: f64,
    #[serde(default = "default_true")]
    pub export_spans: bool,
    pub enable_env_var_recording: bool,
    pub enable_analytics: bool,
    pub exclude_paths: Vec<String>,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            sampling_rate: default_sampling_rate(),
            export_spans: true,
            enable_env_var_recording: false,
            enable_analytics: false,
            exclude_paths: Vec::new(),
        }
    }
}

/// Seconds-as-integer (de)serialization for the handful of duration fields
/// in the config file, which are authored as plain seconds in YAML rather
/// than `humantime`-style strings.
mod humantime_seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        let secs: Option<u64> = Option::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
