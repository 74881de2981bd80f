use crate::types::PluginOptions;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file names looked up in the project root, in order
pub const CONFIG_FILE_NAMES: &[&str] = &["sass.config.json", "sass.config.jsonc"];

/// Error types for config loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to strip comments: {0}")]
    StripComments(String),
}

/// Find default config file in directory
pub fn find_default_config(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES.iter().map(|name| dir.join(name)).find(|path| path.is_file())
}

/// Load plugin options from a `.json` or `.jsonc` file
pub fn load_config_file(path: &Path) -> Result<PluginOptions, ConfigError> {
    let mut content = fs::read_to_string(path)?;
    json_strip_comments::strip(&mut content).map_err(|e| ConfigError::StripComments(e.to_string()))?;
    Ok(serde_json::from_str(&content)?)
}
