//! Initialization error taxonomy (§7): an invalid config or transform rule
//! set is fatal at `initialize` time, the one place in the system where
//! failing loudly is correct (everything after this is best-effort).

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] tracekit_config::ConfigError),
    #[error(transparent)]
    Transform(#[from] tracekit_transform::CompileError),
    #[error("initialize called more than once for this process")]
    AlreadyInitialized,
}

pub type InitResult<T> = Result<T, InitError>;
