#![allow(clippy::result_large_err)] // Activity trait and registry return AppError directly for structured diagnostics without boxing.

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use crate::core::workflow_graph::schema::{type_key, ActivityRecord};
use crate::core::workflow_graph::state::WorkflowState;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Read-only view handed to gating predicates and lifecycle hooks.
#[derive(Clone, Copy)]
pub struct HookContext<'a> {
    pub instance_id: Uuid,
    pub definition_id: &'a str,
    pub correlation_id: Option<&'a str>,
    pub state: &'a WorkflowState,
    /// Activity being executed, for the activity-level notifications.
    pub activity_id: Option<&'a str>,
}

/// Mutable view handed to an activity while it executes.
pub struct ActivityExecutionContext<'a> {
    pub instance_id: Uuid,
    pub definition_id: &'a str,
    pub correlation_id: Option<&'a str>,
    pub activity: &'a ActivityRecord,
    pub state: &'a mut WorkflowState,
}

/// Runtime behavior of a graph node.
///
/// The engine only consults the gate and results below, never the concrete type. Whether a
/// node is an event is decided by its [`ActivityFactory`].
#[async_trait]
pub trait Activity: Send + Sync {
    fn type_name(&self) -> &str;

    fn can_execute(&self, _ctx: &HookContext<'_>) -> bool {
        true
    }

    /// Run the activity and return the outcome labels it produced.
    async fn execute(
        &mut self,
        ctx: &mut ActivityExecutionContext<'_>,
    ) -> Result<Vec<String>, AppError>;

    fn on_workflow_starting(&mut self, _ctx: &HookContext<'_>, _cancel: &mut bool) {}

    fn on_workflow_started(&mut self, _ctx: &HookContext<'_>) {}

    fn on_workflow_resuming(&mut self, _ctx: &HookContext<'_>, _cancel: &mut bool) {}

    fn on_workflow_resumed(&mut self, _ctx: &HookContext<'_>) {}

    fn on_activity_executing(&mut self, _ctx: &HookContext<'_>, _cancel: &mut bool) {}

    fn on_activity_executed(&mut self, _ctx: &HookContext<'_>) {}
}

/// Constructs configured activity instances for one activity type.
pub trait ActivityFactory: Send + Sync + 'static {
    /// Type name used in workflow definitions and as the event name.
    fn type_name(&self) -> &str;

    /// Event types only execute when they are the entry point of a traversal; reached any
    /// other way they suspend the workflow.
    fn is_event(&self) -> bool {
        false
    }

    /// Build an activity from definition-time properties.
    fn create(&self, properties: &Map<String, Value>) -> Result<Box<dyn Activity>, AppError>;
}

/// Resolves activity types by name.
pub trait ActivityCatalog: Send + Sync {
    fn resolve(&self, name: &str) -> Option<Arc<dyn ActivityFactory>>;

    fn instantiate(
        &self,
        type_name: &str,
        properties: &Map<String, Value>,
    ) -> Result<Box<dyn Activity>, AppError> {
        let factory = self
            .resolve(type_name)
            .ok_or_else(|| unregistered_type(type_name))?;
        factory.create(properties)
    }
}

pub(crate) fn unregistered_type(type_name: &str) -> AppError {
    AppError::new(
        ErrorCategory::ValidationError,
        format!("activity type '{}' is not registered", type_name),
    )
    .with_code("WFG-ACT-001")
}

struct FnFactory<F> {
    name: String,
    event: bool,
    build: F,
}

impl<F> ActivityFactory for FnFactory<F>
where
    F: Fn(&Map<String, Value>) -> Result<Box<dyn Activity>, AppError> + Send + Sync + 'static,
{
    fn type_name(&self) -> &str {
        &self.name
    }

    fn is_event(&self) -> bool {
        self.event
    }

    fn create(&self, properties: &Map<String, Value>) -> Result<Box<dyn Activity>, AppError> {
        (self.build)(properties)
    }
}

/// Builder used to register activity types before the engine runs.
pub struct ActivityRegistryBuilder {
    factories: HashMap<String, Arc<dyn ActivityFactory>>,
}

impl Default for ActivityRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityRegistryBuilder {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn register<T: ActivityFactory>(&mut self, factory: T) -> &mut Self {
        self.register_arc(Arc::new(factory))
    }

    pub fn register_arc(&mut self, factory: Arc<dyn ActivityFactory>) -> &mut Self {
        let key = type_key(factory.type_name());
        if self.factories.contains_key(&key) {
            panic!("duplicate activity type registered: {}", factory.type_name());
        }
        self.factories.insert(key, factory);
        self
    }

    /// Register a closure-backed factory.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, is_event: bool, build: F) -> &mut Self
    where
        F: Fn(&Map<String, Value>) -> Result<Box<dyn Activity>, AppError> + Send + Sync + 'static,
    {
        self.register(FnFactory {
            name: name.into(),
            event: is_event,
            build,
        })
    }

    pub fn build(self) -> ActivityRegistry {
        ActivityRegistry {
            inner: Arc::new(self.factories),
        }
    }
}

/// Immutable catalog shared by the engine.
#[derive(Clone)]
pub struct ActivityRegistry {
    inner: Arc<HashMap<String, Arc<dyn ActivityFactory>>>,
}

impl Default for ActivityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityRegistry {
    pub fn new() -> Self {
        ActivityRegistryBuilder::new().build()
    }

    pub fn builder() -> ActivityRegistryBuilder {
        ActivityRegistryBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl ActivityCatalog for ActivityRegistry {
    fn resolve(&self, name: &str) -> Option<Arc<dyn ActivityFactory>> {
        self.inner.get(&type_key(name)).cloned()
    }
}
