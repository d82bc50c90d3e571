//! Persistence contracts consumed by the workflow manager.
//!
//! The engine never serializes concurrent calls against one instance. Stores are the point of
//! concurrency control: every `save`/`delete` is checked against the record's `version` and a
//! stale record is rejected with `WFG-STORE-409`.

pub mod file;
pub mod memory;

pub use file::FileInstanceStore;
pub use memory::{InMemoryDefinitionStore, InMemoryInstanceStore};

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use crate::core::workflow_graph::schema::WorkflowDefinition;
use crate::core::workflow_graph::state::WorkflowInstanceRecord;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// Read access to workflow definitions.
#[async_trait]
pub trait DefinitionStore: Send + Sync {
    async fn get_by_id(&self, id: &str) -> Result<Option<Arc<WorkflowDefinition>>, AppError>;

    /// Definitions with a start activity of the given type (case-insensitive).
    async fn find_by_start_activity_type(
        &self,
        type_name: &str,
    ) -> Result<Vec<Arc<WorkflowDefinition>>, AppError>;
}

/// Durable storage of suspended workflow instances.
#[async_trait]
pub trait InstanceStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<WorkflowInstanceRecord>, AppError>;

    async fn list(&self) -> Result<Vec<WorkflowInstanceRecord>, AppError>;

    /// Instances awaiting an activity of the given type, optionally narrowed by correlation id.
    async fn find_awaiting_activity_type(
        &self,
        type_name: &str,
        correlation_id: Option<&str>,
    ) -> Result<Vec<WorkflowInstanceRecord>, AppError>;

    /// Insert or update; bumps `version` and `updated_at` on success.
    async fn save(&self, instance: &mut WorkflowInstanceRecord) -> Result<(), AppError>;

    async fn delete(&self, instance: &WorkflowInstanceRecord) -> Result<(), AppError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize instance {id}: {source}")]
    Serialization {
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("instance {id} was modified concurrently (expected version {expected}, found {found})")]
    VersionConflict { id: Uuid, expected: u64, found: u64 },
    #[error("instance {id} not found")]
    NotFound { id: Uuid },
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let (category, code) = match &err {
            StoreError::Io { .. } => (ErrorCategory::IoError, "WFG-STORE-IO"),
            StoreError::Serialization { .. } => {
                (ErrorCategory::SerializationError, "WFG-STORE-SER")
            }
            StoreError::VersionConflict { .. } => (ErrorCategory::ConflictError, "WFG-STORE-409"),
            StoreError::NotFound { .. } => (ErrorCategory::NotFound, "WFG-STORE-404"),
        };
        let message = err.to_string();
        AppError::with_source(category, message, Box::new(err)).with_code(code)
    }
}

/// Deterministic ordering for query results.
pub(crate) fn sort_instances(instances: &mut [WorkflowInstanceRecord]) {
    instances.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}

pub(crate) fn is_awaiting_match(
    instance: &WorkflowInstanceRecord,
    type_name: &str,
    correlation_id: Option<&str>,
) -> bool {
    instance.is_awaiting_type(type_name) && instance.matches_correlation(correlation_id)
}
