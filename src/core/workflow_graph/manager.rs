#![allow(clippy::result_large_err)] // Manager returns AppError so store and activity failures surface unmodified.

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use crate::core::workflow_graph::activity::ActivityCatalog;
use crate::core::workflow_graph::context::WorkflowContext;
use crate::core::workflow_graph::scheduler;
use crate::core::workflow_graph::schema::WorkflowDefinition;
use crate::core::workflow_graph::state::{
    AwaitingActivityRecord, WorkflowInstanceRecord, WorkflowState, WorkflowStatus,
};
use crate::core::workflow_graph::store::{DefinitionStore, InstanceStore};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Result of one start or resume performed on behalf of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub instance_id: Uuid,
    pub definition_id: String,
    pub status: WorkflowStatus,
    pub blocking: Vec<String>,
}

impl From<&WorkflowContext> for RunReport {
    fn from(context: &WorkflowContext) -> Self {
        Self {
            instance_id: context.instance().id,
            definition_id: context.definition().id.clone(),
            status: context.status(),
            blocking: context.blocking().to_vec(),
        }
    }
}

/// What a call to [`WorkflowManager::trigger_event`] did, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerSummary {
    pub resumed: Vec<RunReport>,
    pub started: Vec<RunReport>,
}

impl TriggerSummary {
    pub fn is_empty(&self) -> bool {
        self.resumed.is_empty() && self.started.is_empty()
    }
}

/// Orchestrates starting, resuming, and event routing, and decides when instances are
/// persisted or deleted.
#[derive(Clone)]
pub struct WorkflowManager {
    catalog: Arc<dyn ActivityCatalog>,
    definitions: Arc<dyn DefinitionStore>,
    instances: Arc<dyn InstanceStore>,
}

impl WorkflowManager {
    pub fn new(
        catalog: Arc<dyn ActivityCatalog>,
        definitions: Arc<dyn DefinitionStore>,
        instances: Arc<dyn InstanceStore>,
    ) -> Self {
        Self {
            catalog,
            definitions,
            instances,
        }
    }

    pub fn instances(&self) -> &Arc<dyn InstanceStore> {
        &self.instances
    }

    pub fn definitions(&self) -> &Arc<dyn DefinitionStore> {
        &self.definitions
    }

    /// Start a new instance of `definition`.
    ///
    /// The returned context reports `Cancelled` when a starting hook vetoed the run (nothing
    /// executed, nothing persisted), `Completed` when the traversal ran to termination (nothing
    /// persisted), or `Suspended` when the instance was saved with its blocking activities.
    pub async fn start_workflow(
        &self,
        definition: Arc<WorkflowDefinition>,
        start_activity: Option<&str>,
        input: Option<WorkflowState>,
        correlation_id: Option<String>,
    ) -> Result<WorkflowContext, AppError> {
        let start_id = resolve_start_activity(&definition, start_activity)?;
        let instance = WorkflowInstanceRecord::new(
            definition.id.clone(),
            input.unwrap_or_default(),
            correlation_id,
        );
        let mut context = WorkflowContext::new(definition, instance, self.catalog.as_ref())?;
        let instance_id = context.instance().id;
        let definition_id = context.definition().id.clone();

        if context.broadcast_workflow_starting() {
            warn!(%instance_id, %definition_id, "workflow start cancelled");
            context.set_status(WorkflowStatus::Cancelled);
            return Ok(context);
        }
        context.broadcast_workflow_started();

        let blocking = scheduler::execute_workflow(&mut context, &start_id).await?;
        if blocking.is_empty() {
            info!(%instance_id, %definition_id, "workflow completed in a single pass");
            context.set_status(WorkflowStatus::Completed);
            return Ok(context);
        }

        context.record_blocking(blocking);
        self.instances.save(context.instance_mut()).await?;
        context.set_status(WorkflowStatus::Suspended);
        info!(
            %instance_id,
            %definition_id,
            blocking = ?context.blocking(),
            "workflow suspended"
        );
        Ok(context)
    }

    /// Resume every activity the instance is currently awaiting, one after another.
    ///
    /// `instance` is updated in place with the state persisted by each resume.
    pub async fn resume_workflow(
        &self,
        instance: &mut WorkflowInstanceRecord,
    ) -> Result<Vec<WorkflowContext>, AppError> {
        self.resume_entries(instance, None).await
    }

    /// Resume the awaiting entries whose activity type matches `type_name`.
    pub async fn resume_matching(
        &self,
        instance: &mut WorkflowInstanceRecord,
        type_name: &str,
    ) -> Result<Vec<WorkflowContext>, AppError> {
        self.resume_entries(instance, Some(type_name)).await
    }

    async fn resume_entries(
        &self,
        instance: &mut WorkflowInstanceRecord,
        type_name: Option<&str>,
    ) -> Result<Vec<WorkflowContext>, AppError> {
        let snapshot: Vec<AwaitingActivityRecord> = instance
            .awaiting
            .iter()
            .filter(|entry| type_name.map_or(true, |name| entry.matches_type(name)))
            .cloned()
            .collect();

        let mut contexts = Vec::with_capacity(snapshot.len());
        for entry in snapshot {
            if !instance.awaiting.contains(&entry) {
                continue;
            }
            if let Some(context) = self.resume_workflow_at(instance, &entry).await? {
                let completed = context.status() == WorkflowStatus::Completed;
                contexts.push(context);
                if completed {
                    break;
                }
            }
        }
        Ok(contexts)
    }

    /// Resume one suspended activity of `instance`.
    ///
    /// Returns `Ok(None)` and leaves the instance untouched when its definition or the awaited
    /// activity no longer exists, or when `awaiting` is not one of the instance's entries. A cancelled resume persists nothing. Otherwise the instance is
    /// deleted once nothing is awaited any more, or saved with the new blocking activities, and
    /// `instance` is replaced by the persisted record.
    pub async fn resume_workflow_at(
        &self,
        instance: &mut WorkflowInstanceRecord,
        awaiting: &AwaitingActivityRecord,
    ) -> Result<Option<WorkflowContext>, AppError> {
        let instance_id = instance.id;
        let Some(definition) = self.definitions.get_by_id(&instance.definition_id).await? else {
            warn!(
                %instance_id,
                definition_id = %instance.definition_id,
                "definition not found; instance left suspended"
            );
            return Ok(None);
        };
        if definition.activity(&awaiting.activity_id).is_none() {
            warn!(
                %instance_id,
                definition_id = %definition.id,
                activity_id = %awaiting.activity_id,
                "awaited activity not found in definition; instance left suspended"
            );
            return Ok(None);
        }
        if !instance.awaiting.contains(awaiting) {
            warn!(
                %instance_id,
                activity_id = %awaiting.activity_id,
                "activity is not awaited by this instance; nothing resumed"
            );
            return Ok(None);
        }

        let mut context = WorkflowContext::new(definition, instance.clone(), self.catalog.as_ref())?;
        if context.broadcast_workflow_resuming() {
            warn!(%instance_id, activity_id = %awaiting.activity_id, "workflow resume cancelled");
            context.set_status(WorkflowStatus::Cancelled);
            return Ok(Some(context));
        }
        context.broadcast_workflow_resumed();
        context.instance_mut().remove_awaiting(awaiting);

        let blocking = scheduler::execute_workflow(&mut context, &awaiting.activity_id).await?;
        if blocking.is_empty() && context.instance().awaiting.is_empty() {
            self.instances.delete(context.instance()).await?;
            context.set_status(WorkflowStatus::Completed);
            info!(%instance_id, "workflow completed; instance deleted");
        } else {
            context.record_blocking(blocking);
            self.instances.save(context.instance_mut()).await?;
            context.set_status(WorkflowStatus::Suspended);
            info!(
                %instance_id,
                awaiting = context.instance().awaiting.len(),
                "workflow suspended"
            );
        }
        *instance = context.instance().clone();
        Ok(Some(context))
    }

    /// Route an external event: resume every matching suspended instance, then start every
    /// definition whose start activity is of the event's type.
    pub async fn trigger_event(
        &self,
        name: &str,
        input: Option<WorkflowState>,
        correlation_id: Option<&str>,
    ) -> Result<TriggerSummary, AppError> {
        let mut summary = TriggerSummary::default();
        let Some(factory) = self.catalog.resolve(name) else {
            warn!(event = name, "no activity type registered for event");
            return Ok(summary);
        };

        let definitions = self.definitions.find_by_start_activity_type(name).await?;
        let instances = self
            .instances
            .find_awaiting_activity_type(name, correlation_id)
            .await?;
        if definitions.is_empty() && instances.is_empty() {
            debug!(event = %factory.type_name(), "no subscribers for event");
            return Ok(summary);
        }

        // Suspended instances are resumed before any new instance starts.
        for mut instance in instances {
            if let Some(input) = input.as_ref().filter(|input| !input.is_empty()) {
                instance.state.merge(input);
            }
            for context in self.resume_matching(&mut instance, name).await? {
                summary.resumed.push(RunReport::from(&context));
            }
        }

        for definition in definitions {
            let start_id = definition
                .start_activities()
                .find(|activity| activity.is_type(name))
                .map(|activity| activity.id.clone());
            let Some(start_id) = start_id else {
                continue;
            };
            let context = self
                .start_workflow(
                    definition,
                    Some(&start_id),
                    input.clone(),
                    correlation_id.map(str::to_string),
                )
                .await?;
            summary.started.push(RunReport::from(&context));
        }

        info!(
            event = %factory.type_name(),
            resumed = summary.resumed.len(),
            started = summary.started.len(),
            "event dispatched"
        );
        Ok(summary)
    }
}

fn resolve_start_activity(
    definition: &WorkflowDefinition,
    start_activity: Option<&str>,
) -> Result<String, AppError> {
    match start_activity {
        Some(id) if definition.activity(id).is_some() => Ok(id.to_string()),
        Some(id) => Err(AppError::new(
            ErrorCategory::ValidationError,
            format!(
                "start activity '{}' is not part of workflow {}",
                id, definition.id
            ),
        )
        .with_code("WFG-DEF-002")),
        None => definition
            .start_activity()
            .map(|activity| activity.id.clone())
            .ok_or_else(|| {
                AppError::new(
                    ErrorCategory::ValidationError,
                    format!("workflow {} has no start activity", definition.id),
                )
                .with_code("WFG-DEF-001")
            }),
    }
}
