//! Loads and compiles the project configuration file (§6).

use std::path::{Path, PathBuf};

use tracekit_transform::TransformEngine;

use crate::discovery::{find_project_root, CONFIG_RELATIVE_PATH};
use crate::error::{ConfigError, ConfigResult};
use crate::schema::ProjectConfig;

/// A loaded configuration, with its transform rules already compiled.
pub struct LoadedConfig {
    pub project_root: PathBuf,
    pub config: ProjectConfig,
    pub transform_engine: TransformEngine,
}

/// Discover the project root from `cwd` and load `.tusk/config.yaml` from
/// it. A missing config file is not an error — it is equivalent to every
/// section being absent.
pub fn load(cwd: &Path) -> ConfigResult<LoadedConfig> {
    let project_root = find_project_root(cwd)?;
    let config_path = project_root.join(CONFIG_RELATIVE_PATH);

    let config = if config_path.is_file() {
        let raw = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.clone(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: config_path,
            source,
        })?
    } else {
        ProjectConfig::default()
    };

    let transform_engine = TransformEngine::compile(&config.transforms)?;

    Ok(LoadedConfig {
        project_root,
        config,
        transform_engine,
    })
}
