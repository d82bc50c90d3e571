use crate::logging::layers::console::ConsoleOutput;
use crate::Result;
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::filter::Directive;

const DEFAULT_LEVEL: &str = "info";

/// `[logging]` table of `switchyard.toml`. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_level: Option<String>,
    /// File sink directory; relative paths resolve against the workspace root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console_output: Option<ConsoleOutput>,
}

/// Resolved logging configuration after reading config files and env overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub default_level: String,
    /// Enables the file sink when set.
    pub log_dir: Option<PathBuf>,
    pub console_output: ConsoleOutput,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_level: DEFAULT_LEVEL.to_string(),
            log_dir: None,
            console_output: ConsoleOutput::default(),
        }
    }
}

impl LoggingConfig {
    /// Resolve with deterministic precedence: defaults, `[logging]` settings, env overrides.
    pub fn from_settings(settings: &LoggingSettings, workspace_root: Option<&Path>) -> Result<Self> {
        let mut config = LoggingConfig::default();
        config.apply(settings, workspace_root);
        config.apply_env_overrides(workspace_root)?;
        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, settings: &LoggingSettings, workspace_root: Option<&Path>) {
        if let Some(level) = &settings.default_level {
            self.default_level = level.clone();
        }
        if let Some(log_dir) = &settings.log_dir {
            self.log_dir = Some(resolve_dir(log_dir, workspace_root));
        }
        if let Some(console_output) = settings.console_output {
            self.console_output = console_output;
        }
    }

    fn apply_env_overrides(&mut self, workspace_root: Option<&Path>) -> Result<()> {
        if let Ok(level) = env::var("SWITCHYARD_LOG_LEVEL") {
            if !level.trim().is_empty() {
                self.default_level = level.trim().to_string();
            }
        }
        if let Ok(log_dir) = env::var("SWITCHYARD_LOG_DIR") {
            if !log_dir.trim().is_empty() {
                self.log_dir = Some(resolve_dir(log_dir.trim(), workspace_root));
            }
        }
        if let Ok(console) = env::var("SWITCHYARD_LOG_CONSOLE") {
            self.console_output = ConsoleOutput::from_str(&console).map_err(|err| anyhow!(err))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        Directive::from_str(&self.default_level)
            .map_err(|_| anyhow!("logging.default_level must be a valid tracing directive"))?;
        Ok(())
    }
}

fn resolve_dir(raw: &str, workspace_root: Option<&Path>) -> PathBuf {
    let path = PathBuf::from(raw);
    match workspace_root {
        Some(root) if path.is_relative() => root.join(path),
        _ => path,
    }
}
