//! Durable, event-interruptible workflow graphs.
//!
//! A [`schema::WorkflowDefinition`] is a static graph of activities and outcome-labelled
//! transitions. The [`manager::WorkflowManager`] starts instances, resumes suspended ones, and
//! routes external events; [`scheduler::execute_workflow`] performs the traversal.

pub mod activities;
pub mod activity;
pub mod context;
pub mod manager;
pub mod scheduler;
pub mod schema;
pub mod state;
pub mod store;

pub use activity::{
    Activity, ActivityCatalog, ActivityExecutionContext, ActivityFactory, ActivityRegistry,
    ActivityRegistryBuilder, HookContext,
};
pub use context::WorkflowContext;
pub use manager::{RunReport, TriggerSummary, WorkflowManager};
pub use schema::{type_names_match, ActivityRecord, Transition, WorkflowDefinition};
pub use state::{AwaitingActivityRecord, WorkflowInstanceRecord, WorkflowState, WorkflowStatus};
pub use store::{
    DefinitionStore, FileInstanceStore, InMemoryDefinitionStore, InMemoryInstanceStore,
    InstanceStore,
};
