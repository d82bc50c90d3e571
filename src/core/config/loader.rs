#![allow(clippy::result_large_err)]

use super::{ConfigValidator, EngineConfig};
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use std::env;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "switchyard.toml";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config from workspace root (workspace/switchyard.toml)
    /// Environment variables override config file values; a missing file yields defaults.
    pub fn load_from_workspace(workspace_path: &Path) -> Result<EngineConfig, AppError> {
        let config_path = workspace_path.join(CONFIG_FILE_NAME);
        let mut config = Self::load_from_file(&config_path)?.unwrap_or_default();
        Self::apply_env_overrides(&mut config);
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Returns Ok(None) if the file doesn't exist
    pub fn load_from_file(path: &Path) -> Result<Option<EngineConfig>, AppError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(
                ErrorCategory::IoError,
                format!("Failed to read config file {}: {}", path.display(), e),
            )
        })?;

        let config: EngineConfig = toml::from_str(&content).map_err(|e| {
            AppError::new(
                ErrorCategory::ValidationError,
                format!("Failed to parse config file {}: {}", path.display(), e),
            )
        })?;

        Ok(Some(config))
    }

    fn apply_env_overrides(config: &mut EngineConfig) {
        if let Ok(state_dir) = env::var("SWITCHYARD_STATE_DIR") {
            config.engine.state_dir = PathBuf::from(state_dir);
        }

        if let Ok(definitions_dir) = env::var("SWITCHYARD_DEFINITIONS_DIR") {
            config.engine.definitions_dir = PathBuf::from(definitions_dir);
        }
    }

    pub fn env_var_documentation() -> &'static [&'static str] {
        &[
            "SWITCHYARD_STATE_DIR - Override instance state directory (default: .switchyard/state)",
            "SWITCHYARD_DEFINITIONS_DIR - Override workflow definitions directory (default: .switchyard/workflows)",
            "SWITCHYARD_LOG_LEVEL - Override default tracing level (default: info)",
            "SWITCHYARD_LOG_DIR - Enable the file sink in this directory",
            "SWITCHYARD_LOG_CONSOLE - Console sink: stdout, stderr, none",
        ]
    }
}
