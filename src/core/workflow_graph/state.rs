use crate::core::workflow_graph::schema::{type_names_match, ActivityRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Version embedded in persisted workflow instance documents.
pub const WORKFLOW_INSTANCE_FORMAT_VERSION: &str = "1";

fn default_format_version() -> String {
    WORKFLOW_INSTANCE_FORMAT_VERSION.to_string()
}

/// Input and variable bag carried by a workflow instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowState(Map<String, Value>);

impl WorkflowState {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Top-level key merge: keys in `other` overwrite, all other keys are kept.
    pub fn merge(&mut self, other: &WorkflowState) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for WorkflowState {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for WorkflowState {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

/// Suspension marker persisted while an instance waits on an event activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwaitingActivityRecord {
    pub activity_id: String,
    pub type_name: String,
    pub since: DateTime<Utc>,
}

impl AwaitingActivityRecord {
    pub fn matches_type(&self, name: &str) -> bool {
        type_names_match(&self.type_name, name)
    }
}

impl From<&ActivityRecord> for AwaitingActivityRecord {
    fn from(record: &ActivityRecord) -> Self {
        Self {
            activity_id: record.id.clone(),
            type_name: record.type_name.clone(),
            since: Utc::now(),
        }
    }
}

// Awaiting entries are identified by activity id only.
impl PartialEq for AwaitingActivityRecord {
    fn eq(&self, other: &Self) -> bool {
        self.activity_id == other.activity_id
    }
}

impl Eq for AwaitingActivityRecord {}

/// Durable checkpoint of one workflow execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowInstanceRecord {
    #[serde(default = "default_format_version")]
    pub format_version: String,
    pub id: Uuid,
    pub definition_id: String,
    #[serde(default)]
    pub correlation_id: Option<String>,
    #[serde(default)]
    pub state: WorkflowState,
    #[serde(default)]
    pub awaiting: Vec<AwaitingActivityRecord>,
    /// Optimistic concurrency token; 0 means never persisted.
    #[serde(default)]
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowInstanceRecord {
    pub fn new(
        definition_id: impl Into<String>,
        state: WorkflowState,
        correlation_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            format_version: default_format_version(),
            id: Uuid::new_v4(),
            definition_id: definition_id.into(),
            correlation_id,
            state,
            awaiting: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_awaiting_type(&self, name: &str) -> bool {
        self.awaiting.iter().any(|entry| entry.matches_type(name))
    }

    pub fn matches_correlation(&self, correlation_id: Option<&str>) -> bool {
        match correlation_id {
            Some(expected) => self.correlation_id.as_deref() == Some(expected),
            None => true,
        }
    }

    /// Remove the awaiting entry for the same activity id, if present.
    pub fn remove_awaiting(&mut self, entry: &AwaitingActivityRecord) -> bool {
        let before = self.awaiting.len();
        self.awaiting.retain(|existing| existing != entry);
        before != self.awaiting.len()
    }

    /// Add an awaiting entry unless the activity is already awaited.
    pub fn add_awaiting(&mut self, entry: AwaitingActivityRecord) {
        if !self.awaiting.contains(&entry) {
            self.awaiting.push(entry);
        }
    }
}

/// Outcome of the latest engine call on a workflow context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowStatus {
    #[default]
    Idle,
    Cancelled,
    Suspended,
    Completed,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Idle => "Idle",
            WorkflowStatus::Cancelled => "Cancelled",
            WorkflowStatus::Suspended => "Suspended",
            WorkflowStatus::Completed => "Completed",
        }
    }
}
