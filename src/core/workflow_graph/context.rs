#![allow(clippy::result_large_err)]

use crate::core::error::AppError;
use crate::core::workflow_graph::activity::{
    unregistered_type, Activity, ActivityCatalog, ActivityExecutionContext, HookContext,
};
use crate::core::workflow_graph::schema::{ActivityRecord, WorkflowDefinition};
use crate::core::workflow_graph::state::{
    AwaitingActivityRecord, WorkflowInstanceRecord, WorkflowStatus,
};
use std::collections::HashMap;
use std::sync::Arc;

/// One graph node paired with its instantiated behavior.
pub struct ActivityContext {
    pub record: ActivityRecord,
    activity: Box<dyn Activity>,
    event: bool,
}

impl ActivityContext {
    pub fn new(record: ActivityRecord, activity: Box<dyn Activity>, event: bool) -> Self {
        Self {
            record,
            activity,
            event,
        }
    }

    pub fn activity(&self) -> &dyn Activity {
        self.activity.as_ref()
    }

    /// Whether the node's type was registered as an event.
    pub fn is_event(&self) -> bool {
        self.event
    }
}

/// Per-call aggregate of one definition, one instance, and a runtime activity per node.
///
/// Built fresh for every start or resume; only the wrapped instance record outlives it.
pub struct WorkflowContext {
    definition: Arc<WorkflowDefinition>,
    instance: WorkflowInstanceRecord,
    activities: Vec<ActivityContext>,
    index: HashMap<String, usize>,
    status: WorkflowStatus,
    blocking: Vec<String>,
}

impl WorkflowContext {
    /// Instantiate every activity of the definition, in declaration order.
    pub fn new(
        definition: Arc<WorkflowDefinition>,
        instance: WorkflowInstanceRecord,
        catalog: &dyn ActivityCatalog,
    ) -> Result<Self, AppError> {
        let mut activities = Vec::with_capacity(definition.activities.len());
        let mut index = HashMap::with_capacity(definition.activities.len());
        for record in &definition.activities {
            let built = catalog
                .resolve(&record.type_name)
                .ok_or_else(|| unregistered_type(&record.type_name))
                .and_then(|factory| {
                    let activity = factory.create(&record.properties)?;
                    Ok((activity, factory.is_event()))
                })
                .map_err(|mut err| {
                    err.add_context("activity_id", &record.id);
                    err.add_context("definition_id", &definition.id);
                    err
                });
            let (activity, event) = built?;
            index.entry(record.id.clone()).or_insert(activities.len());
            activities.push(ActivityContext::new(record.clone(), activity, event));
        }
        Ok(Self {
            definition,
            instance,
            activities,
            index,
            status: WorkflowStatus::Idle,
            blocking: Vec::new(),
        })
    }

    pub fn definition(&self) -> &WorkflowDefinition {
        &self.definition
    }

    pub fn definition_arc(&self) -> Arc<WorkflowDefinition> {
        Arc::clone(&self.definition)
    }

    pub fn instance(&self) -> &WorkflowInstanceRecord {
        &self.instance
    }

    pub fn instance_mut(&mut self) -> &mut WorkflowInstanceRecord {
        &mut self.instance
    }

    pub fn into_instance(self) -> WorkflowInstanceRecord {
        self.instance
    }

    pub fn activities(&self) -> &[ActivityContext] {
        &self.activities
    }

    pub fn activity_index(&self, activity_id: &str) -> Option<usize> {
        self.index.get(activity_id).copied()
    }

    pub fn status(&self) -> WorkflowStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: WorkflowStatus) {
        self.status = status;
    }

    /// Activities the latest traversal blocked on.
    pub fn blocking(&self) -> &[String] {
        &self.blocking
    }

    /// Turn a blocking set into awaiting entries on the instance.
    pub(crate) fn record_blocking(&mut self, blocking: Vec<String>) {
        for activity_id in &blocking {
            if let Some(record) = self.definition.activity(activity_id) {
                self.instance.add_awaiting(AwaitingActivityRecord::from(record));
            }
        }
        self.blocking = blocking;
    }

    pub(crate) fn can_execute(&self, index: usize) -> bool {
        let ctx = HookContext {
            instance_id: self.instance.id,
            definition_id: &self.definition.id,
            correlation_id: self.instance.correlation_id.as_deref(),
            state: &self.instance.state,
            activity_id: Some(&self.activities[index].record.id),
        };
        self.activities[index].activity.can_execute(&ctx)
    }

    pub(crate) fn is_event(&self, index: usize) -> bool {
        self.activities[index].event
    }

    pub(crate) async fn execute_activity(&mut self, index: usize) -> Result<Vec<String>, AppError> {
        let ActivityContext {
            record, activity, ..
        } = &mut self.activities[index];
        let record: &ActivityRecord = record;
        let mut ctx = ActivityExecutionContext {
            instance_id: self.instance.id,
            definition_id: &self.definition.id,
            correlation_id: self.instance.correlation_id.as_deref(),
            activity: record,
            state: &mut self.instance.state,
        };
        activity.execute(&mut ctx).await.map_err(|mut err| {
            err.add_context("activity_id", &record.id);
            err.add_context("instance_id", &self.instance.id.to_string());
            err
        })
    }

    /// Returns true when any activity requested cancellation.
    pub fn broadcast_workflow_starting(&mut self) -> bool {
        let mut cancel = false;
        self.broadcast(None, |activity, ctx| {
            activity.on_workflow_starting(ctx, &mut cancel)
        });
        cancel
    }

    pub fn broadcast_workflow_started(&mut self) {
        self.broadcast(None, |activity, ctx| activity.on_workflow_started(ctx));
    }

    /// Returns true when any activity requested cancellation.
    pub fn broadcast_workflow_resuming(&mut self) -> bool {
        let mut cancel = false;
        self.broadcast(None, |activity, ctx| {
            activity.on_workflow_resuming(ctx, &mut cancel)
        });
        cancel
    }

    pub fn broadcast_workflow_resumed(&mut self) {
        self.broadcast(None, |activity, ctx| activity.on_workflow_resumed(ctx));
    }

    /// Returns true when any activity vetoed execution of `activity_id`.
    pub fn broadcast_activity_executing(&mut self, activity_id: &str) -> bool {
        let mut cancel = false;
        self.broadcast(Some(activity_id), |activity, ctx| {
            activity.on_activity_executing(ctx, &mut cancel)
        });
        cancel
    }

    pub fn broadcast_activity_executed(&mut self, activity_id: &str) {
        self.broadcast(Some(activity_id), |activity, ctx| {
            activity.on_activity_executed(ctx)
        });
    }

    // Every activity is notified, in declaration order.
    fn broadcast<F>(&mut self, activity_id: Option<&str>, mut notify: F)
    where
        F: FnMut(&mut Box<dyn Activity>, &HookContext<'_>),
    {
        let ctx = HookContext {
            instance_id: self.instance.id,
            definition_id: &self.definition.id,
            correlation_id: self.instance.correlation_id.as_deref(),
            state: &self.instance.state,
            activity_id,
        };
        for entry in self.activities.iter_mut() {
            notify(&mut entry.activity, &ctx);
        }
    }
}

impl std::fmt::Debug for WorkflowContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowContext")
            .field("definition_id", &self.definition.id)
            .field("instance_id", &self.instance.id)
            .field("status", &self.status)
            .field("blocking", &self.blocking)
            .finish()
    }
}
