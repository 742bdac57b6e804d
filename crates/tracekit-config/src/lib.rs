//! Project configuration file loading and project-root discovery (§6).

pub mod discovery;
pub mod error;
pub mod loader;
pub mod schema;

pub use discovery::{find_project_root, CONFIG_RELATIVE_PATH};
pub use error::{ConfigError, ConfigResult};
pub use loader::{load, LoadedConfig};
pub use schema::{
    CollectorConfig, ComparisonConfig, ProjectConfig, ReadinessCheckConfig, RecordingConfig,
    ServiceConfig, StartConfig, TestExecutionConfig, TracesConfig,
};
