//! Configuration error taxonomy (§7): invalid config is fatal at load time.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no project root found starting from {0}")]
    ProjectRootNotFound(PathBuf),
    #[error("failed to read config file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid transform config: {0}")]
    Transform(#[from] tracekit_transform::CompileError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
