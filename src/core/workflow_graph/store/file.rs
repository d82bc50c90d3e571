#![allow(clippy::result_large_err)] // File store returns AppError to preserve structured diagnostic context.

use super::memory::bump;
use super::{is_awaiting_match, sort_instances, InstanceStore, StoreError};
use crate::core::error::AppError;
use crate::core::workflow_graph::state::WorkflowInstanceRecord;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Instances persisted as one JSON document each under `<state_dir>/instances/<id>.json`.
pub struct FileInstanceStore {
    instances_dir: PathBuf,
    // Serializes read-compare-write sequences within this process.
    write_lock: Mutex<()>,
}

impl FileInstanceStore {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            instances_dir: state_dir.into().join("instances"),
            write_lock: Mutex::new(()),
        }
    }

    pub fn instances_dir(&self) -> &Path {
        &self.instances_dir
    }

    pub fn instance_path(&self, id: &Uuid) -> PathBuf {
        self.instances_dir.join(format!("{}.json", id))
    }

    async fn read_instance(&self, path: &Path) -> Result<Option<WorkflowInstanceRecord>, StoreError> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Serialization {
                id: path.display().to_string(),
                source,
            })
    }

    async fn read_all(&self) -> Result<Vec<WorkflowInstanceRecord>, StoreError> {
        let mut records = Vec::new();
        let mut entries = match fs::read_dir(&self.instances_dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(records),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.instances_dir.clone(),
                    source,
                })
            }
        };
        loop {
            let entry = entries.next_entry().await.map_err(|source| StoreError::Io {
                path: self.instances_dir.clone(),
                source,
            })?;
            let Some(entry) = entry else { break };
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(record) = self.read_instance(&path).await? {
                records.push(record);
            }
        }
        sort_instances(&mut records);
        Ok(records)
    }

    async fn atomic_write(&self, path: &Path, data: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, data)
            .await
            .map_err(|source| StoreError::Io {
                path: tmp_path.clone(),
                source,
            })?;
        fs::rename(&tmp_path, path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(())
    }
}

#[async_trait]
impl InstanceStore for FileInstanceStore {
    async fn get(&self, id: Uuid) -> Result<Option<WorkflowInstanceRecord>, AppError> {
        Ok(self.read_instance(&self.instance_path(&id)).await?)
    }

    async fn list(&self) -> Result<Vec<WorkflowInstanceRecord>, AppError> {
        Ok(self.read_all().await?)
    }

    async fn find_awaiting_activity_type(
        &self,
        type_name: &str,
        correlation_id: Option<&str>,
    ) -> Result<Vec<WorkflowInstanceRecord>, AppError> {
        let mut records = self.read_all().await?;
        records.retain(|record| is_awaiting_match(record, type_name, correlation_id));
        Ok(records)
    }

    async fn save(&self, instance: &mut WorkflowInstanceRecord) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let path = self.instance_path(&instance.id);
        let found = self
            .read_instance(&path)
            .await?
            .map(|stored| stored.version)
            .unwrap_or(0);
        if found != instance.version {
            return Err(StoreError::VersionConflict {
                id: instance.id,
                expected: instance.version,
                found,
            }
            .into());
        }
        let mut next = instance.clone();
        bump(&mut next);
        let content =
            serde_json::to_vec_pretty(&next).map_err(|source| StoreError::Serialization {
                id: next.id.to_string(),
                source,
            })?;
        self.atomic_write(&path, &content).await?;
        *instance = next;
        tracing::debug!(instance_id = %instance.id, version = instance.version, "instance saved");
        Ok(())
    }

    async fn delete(&self, instance: &WorkflowInstanceRecord) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let path = self.instance_path(&instance.id);
        let stored = self
            .read_instance(&path)
            .await?
            .ok_or(StoreError::NotFound { id: instance.id })?;
        if stored.version != instance.version {
            return Err(StoreError::VersionConflict {
                id: instance.id,
                expected: instance.version,
                found: stored.version,
            }
            .into());
        }
        fs::remove_file(&path).await.map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(instance_id = %instance.id, "instance deleted");
        Ok(())
    }
}
