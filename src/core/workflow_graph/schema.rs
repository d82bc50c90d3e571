#![allow(clippy::result_large_err)] // Workflow schema APIs return AppError to preserve structured validation context without boxing.

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

fn default_properties() -> Map<String, Value> {
    Map::new()
}

fn default_version() -> u32 {
    1
}

/// Static workflow graph: activities are nodes, transitions are outcome-labelled edges.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowDefinition {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_version")]
    pub version: u32,
    pub activities: Vec<ActivityRecord>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

/// Static configuration of one graph node.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActivityRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default = "default_properties")]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub start: bool,
}

impl ActivityRecord {
    pub fn new(id: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
            properties: Map::new(),
            start: false,
        }
    }

    pub fn as_start(mut self) -> Self {
        self.start = true;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn is_type(&self, name: &str) -> bool {
        type_names_match(&self.type_name, name)
    }
}

/// Normalized form of an activity type name; every type lookup compares these.
pub fn type_key(name: &str) -> String {
    name.to_lowercase()
}

/// Case-insensitive type name comparison, Unicode-aware.
pub fn type_names_match(a: &str, b: &str) -> bool {
    a == b || type_key(a) == type_key(b)
}

/// Edge from (source activity, outcome label) to a destination activity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Transition {
    pub source: String,
    pub outcome: String,
    pub destination: String,
}

impl Transition {
    pub fn new(
        source: impl Into<String>,
        outcome: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            outcome: outcome.into(),
            destination: destination.into(),
        }
    }
}

impl WorkflowDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            version: default_version(),
            activities: Vec::new(),
            transitions: Vec::new(),
        }
    }

    pub fn with_activity(mut self, activity: ActivityRecord) -> Self {
        self.activities.push(activity);
        self
    }

    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transitions.push(transition);
        self
    }

    pub fn activity(&self, id: &str) -> Option<&ActivityRecord> {
        self.activities.iter().find(|activity| activity.id == id)
    }

    /// First activity flagged as a start node, in declaration order.
    pub fn start_activity(&self) -> Option<&ActivityRecord> {
        self.activities.iter().find(|activity| activity.start)
    }

    pub fn start_activities(&self) -> impl Iterator<Item = &ActivityRecord> {
        self.activities.iter().filter(|activity| activity.start)
    }

    /// First transition leaving `source` on `outcome`, in declaration order.
    pub fn transition_for(&self, source: &str, outcome: &str) -> Option<&Transition> {
        self.transitions
            .iter()
            .find(|t| t.source == source && t.outcome == outcome)
    }

    /// Transitions whose destination does not resolve to an activity.
    pub fn dangling_transitions(&self) -> Vec<&Transition> {
        let ids: HashSet<&str> = self.activities.iter().map(|a| a.id.as_str()).collect();
        self.transitions
            .iter()
            .filter(|t| !ids.contains(t.destination.as_str()))
            .collect()
    }

    /// Validate structural requirements of the definition.
    ///
    /// Dangling destinations are tolerated here; the scheduler skips them.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.id.trim().is_empty() {
            return Err(invalid("workflow definition id must not be empty"));
        }
        if self.activities.is_empty() {
            return Err(invalid(format!(
                "workflow {} must define at least one activity",
                self.id
            )));
        }

        let mut ids = HashSet::new();
        for activity in &self.activities {
            if !ids.insert(activity.id.as_str()) {
                return Err(invalid(format!(
                    "workflow {} has duplicate activity id: {}",
                    self.id, activity.id
                )));
            }
            if activity.type_name.trim().is_empty() {
                return Err(invalid(format!(
                    "activity {} in workflow {} has empty type",
                    activity.id, self.id
                )));
            }
        }

        for transition in &self.transitions {
            if !ids.contains(transition.source.as_str()) {
                return Err(invalid(format!(
                    "transition source references unknown activity: {}",
                    transition.source
                )));
            }
        }

        Ok(())
    }

    /// Parse and validate a definition from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, AppError> {
        let definition: WorkflowDefinition = serde_yaml::from_str(text).map_err(|err| {
            AppError::new(
                ErrorCategory::SerializationError,
                format!("failed to parse workflow definition: {}", err),
            )
        })?;
        definition.validate()?;
        for transition in definition.dangling_transitions() {
            tracing::warn!(
                definition_id = %definition.id,
                source = %transition.source,
                outcome = %transition.outcome,
                destination = %transition.destination,
                "transition destination does not resolve to an activity"
            );
        }
        Ok(definition)
    }
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::new(ErrorCategory::ValidationError, message).with_code("WFG-DEF-003")
}

/// Load and validate a workflow definition from a YAML file.
pub fn load_definition(path: &Path) -> Result<WorkflowDefinition, AppError> {
    let text = fs::read_to_string(path).map_err(|err| {
        AppError::new(
            ErrorCategory::IoError,
            format!("failed to read {}: {}", path.display(), err),
        )
    })?;
    WorkflowDefinition::from_yaml(&text).map_err(|err| err.with_context(path.display().to_string()))
}

/// Load every `*.yaml` / `*.yml` definition in a directory, sorted by file name.
pub fn load_definitions_dir(dir: &Path) -> Result<Vec<WorkflowDefinition>, AppError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|err| {
            AppError::new(
                ErrorCategory::IoError,
                format!("failed to list {}: {}", dir.display(), err),
            )
        })?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            matches!(
                path.extension().and_then(|ext| ext.to_str()),
                Some("yaml") | Some("yml")
            )
        })
        .collect();
    paths.sort();
    paths.iter().map(|path| load_definition(path)).collect()
}
