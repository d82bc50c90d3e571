#![allow(clippy::result_large_err)]

use super::{is_awaiting_match, sort_instances, DefinitionStore, InstanceStore, StoreError};
use crate::core::error::AppError;
use crate::core::workflow_graph::schema::{self, WorkflowDefinition};
use crate::core::workflow_graph::state::WorkflowInstanceRecord;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Definitions held in memory, kept in registration order.
#[derive(Default)]
pub struct InMemoryDefinitionStore {
    definitions: std::sync::RwLock<Vec<Arc<WorkflowDefinition>>>,
}

impl InMemoryDefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every YAML definition found in `dir`.
    pub fn load_dir(dir: &Path) -> Result<Self, AppError> {
        let store = Self::new();
        for definition in schema::load_definitions_dir(dir)? {
            store.insert(definition);
        }
        Ok(store)
    }

    /// Add a definition, replacing any previous one with the same id.
    pub fn insert(&self, definition: WorkflowDefinition) -> Arc<WorkflowDefinition> {
        let definition = Arc::new(definition);
        let mut guard = self
            .definitions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match guard.iter().position(|d| d.id == definition.id) {
            Some(pos) => guard[pos] = Arc::clone(&definition),
            None => guard.push(Arc::clone(&definition)),
        }
        definition
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Arc<WorkflowDefinition>>> {
        self.definitions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DefinitionStore for InMemoryDefinitionStore {
    async fn get_by_id(&self, id: &str) -> Result<Option<Arc<WorkflowDefinition>>, AppError> {
        Ok(self.read().iter().find(|d| d.id == id).cloned())
    }

    async fn find_by_start_activity_type(
        &self,
        type_name: &str,
    ) -> Result<Vec<Arc<WorkflowDefinition>>, AppError> {
        Ok(self
            .read()
            .iter()
            .filter(|d| {
                d.start_activities()
                    .any(|a| a.is_type(type_name))
            })
            .cloned()
            .collect())
    }
}

/// Instances held in a concurrent map with optimistic version checks.
#[derive(Default)]
pub struct InMemoryInstanceStore {
    instances: DashMap<Uuid, WorkflowInstanceRecord>,
}

impl InMemoryInstanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[async_trait]
impl InstanceStore for InMemoryInstanceStore {
    async fn get(&self, id: Uuid) -> Result<Option<WorkflowInstanceRecord>, AppError> {
        Ok(self.instances.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list(&self) -> Result<Vec<WorkflowInstanceRecord>, AppError> {
        let mut all: Vec<_> = self
            .instances
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        sort_instances(&mut all);
        Ok(all)
    }

    async fn find_awaiting_activity_type(
        &self,
        type_name: &str,
        correlation_id: Option<&str>,
    ) -> Result<Vec<WorkflowInstanceRecord>, AppError> {
        let mut matches: Vec<_> = self
            .instances
            .iter()
            .filter(|entry| is_awaiting_match(entry.value(), type_name, correlation_id))
            .map(|entry| entry.value().clone())
            .collect();
        sort_instances(&mut matches);
        Ok(matches)
    }

    async fn save(&self, instance: &mut WorkflowInstanceRecord) -> Result<(), AppError> {
        match self.instances.entry(instance.id) {
            Entry::Occupied(mut occupied) => {
                let found = occupied.get().version;
                if found != instance.version {
                    return Err(StoreError::VersionConflict {
                        id: instance.id,
                        expected: instance.version,
                        found,
                    }
                    .into());
                }
                bump(instance);
                occupied.insert(instance.clone());
            }
            Entry::Vacant(vacant) => {
                // A persisted record that is no longer present was deleted by someone else.
                if instance.version != 0 {
                    return Err(StoreError::VersionConflict {
                        id: instance.id,
                        expected: instance.version,
                        found: 0,
                    }
                    .into());
                }
                bump(instance);
                vacant.insert(instance.clone());
            }
        }
        Ok(())
    }

    async fn delete(&self, instance: &WorkflowInstanceRecord) -> Result<(), AppError> {
        if self
            .instances
            .remove_if(&instance.id, |_, stored| stored.version == instance.version)
            .is_some()
        {
            return Ok(());
        }
        match self.instances.get(&instance.id) {
            Some(stored) => Err(StoreError::VersionConflict {
                id: instance.id,
                expected: instance.version,
                found: stored.version,
            }
            .into()),
            None => Err(StoreError::NotFound { id: instance.id }.into()),
        }
    }
}

pub(crate) fn bump(instance: &mut WorkflowInstanceRecord) {
    instance.version += 1;
    instance.updated_at = Utc::now();
}
