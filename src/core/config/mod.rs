pub mod loader;
pub mod validation;

pub use loader::ConfigLoader;
pub use validation::ConfigValidator;

use crate::logging::LoggingSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Engine configuration loaded from switchyard.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct EngineConfig {
    #[serde(default)]
    pub engine: EngineSection,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Storage locations used by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineSection {
    /// Root of persisted instance state
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    /// Directory scanned for workflow definition documents
    #[serde(default = "default_definitions_dir")]
    pub definitions_dir: PathBuf,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            definitions_dir: default_definitions_dir(),
        }
    }
}

impl EngineConfig {
    pub fn resolve_state_dir(&self, workspace_root: &Path) -> PathBuf {
        resolve(workspace_root, &self.engine.state_dir)
    }

    pub fn resolve_definitions_dir(&self, workspace_root: &Path) -> PathBuf {
        resolve(workspace_root, &self.engine.definitions_dir)
    }
}

fn resolve(workspace_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace_root.join(path)
    }
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".switchyard/state")
}

fn default_definitions_dir() -> PathBuf {
    PathBuf::from(".switchyard/workflows")
}
