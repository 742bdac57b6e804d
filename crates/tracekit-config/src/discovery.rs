//! Project-root discovery: walk up from the current working directory
//! looking for the config file itself, falling back to VCS/manifest
//! markers (§6).

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};

pub const CONFIG_RELATIVE_PATH: &str = ".tusk/config.yaml";

const FALLBACK_MARKERS: &[&str] = &["Cargo.toml", ".git"];

/// Walk up from `start` looking for `.tusk/config.yaml`, then for any
/// fallback marker, returning the directory it was found in.
pub fn find_project_root(start: &Path) -> ConfigResult<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        if dir.join(CONFIG_RELATIVE_PATH).is_file() {
            return Ok(dir);
        }
        if FALLBACK_MARKERS.iter().any(|marker| dir.join(marker).exists()) {
            return Ok(dir);
        }
        if !dir.pop() {
            return Err(ConfigError::ProjectRootNotFound(start.to_path_buf()));
        }
    }
}
