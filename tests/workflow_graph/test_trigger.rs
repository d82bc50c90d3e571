mod support;

use serde_json::json;
use std::sync::Arc;
use support::{approval, state, task, timer, Harness};
use switchyard::core::workflow_graph::activities;
use switchyard::core::workflow_graph::{
    ActivityRecord, ActivityRegistry, InMemoryDefinitionStore, InMemoryInstanceStore,
    InstanceStore, Transition, WorkflowDefinition, WorkflowManager, WorkflowStatus,
};

/// submit -> review (WaitForApproval) -> publish
fn approval_flow() -> WorkflowDefinition {
    WorkflowDefinition::new("approval")
        .with_activity(task("submit").as_start())
        .with_activity(approval("review"))
        .with_activity(task("publish"))
        .with_transition(Transition::new("submit", "Done", "review"))
        .with_transition(Transition::new("review", "Done", "publish"))
}

/// Started by a WaitForApproval event.
fn on_approval() -> WorkflowDefinition {
    WorkflowDefinition::new("on-approval")
        .with_activity(approval("entry").as_start())
        .with_activity(task("audit"))
        .with_transition(Transition::new("entry", "Done", "audit"))
}

async fn suspend(harness: &Harness, definition_id: &str, correlation: Option<&str>) -> uuid::Uuid {
    let context = harness
        .manager
        .start_workflow(
            harness.definition(definition_id).await,
            None,
            Some(state(json!({"status": "pending", "amount": 10}))),
            correlation.map(str::to_string),
        )
        .await
        .expect("start");
    assert_eq!(context.status(), WorkflowStatus::Suspended);
    context.instance().id
}

#[tokio::test]
async fn unknown_event_name_is_a_no_op() {
    let harness = Harness::new(vec![approval_flow()]);
    suspend(&harness, "approval", None).await;
    harness.journal.clear();

    let summary = harness
        .manager
        .trigger_event("Teleport", None, None)
        .await
        .expect("trigger");

    assert!(summary.is_empty());
    assert!(harness.journal.entries().is_empty());
    assert_eq!(harness.stored().await.len(), 1);
}

#[tokio::test]
async fn event_without_subscribers_is_a_no_op() {
    let harness = Harness::new(vec![approval_flow()]);

    let summary = harness
        .manager
        .trigger_event("Timer", None, None)
        .await
        .expect("trigger");

    assert!(summary.is_empty());
}

#[tokio::test]
async fn event_resumes_suspended_instance_to_completion() {
    let harness = Harness::new(vec![approval_flow()]);
    let id = suspend(&harness, "approval", None).await;
    harness.journal.clear();

    let summary = harness
        .manager
        .trigger_event(
            "WaitForApproval",
            Some(state(json!({"status": "approved", "approver": "ops"}))),
            None,
        )
        .await
        .expect("trigger");

    assert!(summary.started.is_empty());
    assert_eq!(summary.resumed.len(), 1);
    assert_eq!(summary.resumed[0].instance_id, id);
    assert_eq!(summary.resumed[0].status, WorkflowStatus::Completed);
    assert_eq!(harness.journal.executed(), vec!["review", "publish"]);
    assert!(harness.stored().await.is_empty());
}

#[tokio::test]
async fn merged_input_is_persisted_when_instance_stays_suspended() {
    let definition = WorkflowDefinition::new("two-step")
        .with_activity(task("submit").as_start())
        .with_activity(approval("first"))
        .with_activity(approval("second"))
        .with_transition(Transition::new("submit", "Done", "first"))
        .with_transition(Transition::new("first", "Done", "second"));
    let harness = Harness::new(vec![definition]);
    let id = suspend(&harness, "two-step", None).await;

    let summary = harness
        .manager
        .trigger_event("waitforapproval", Some(state(json!({"status": "approved"}))), None)
        .await
        .expect("trigger");

    assert_eq!(summary.resumed[0].status, WorkflowStatus::Suspended);
    assert_eq!(summary.resumed[0].blocking, vec!["second"]);
    let stored = harness.instances.get(id).await.expect("get").expect("stored");
    assert_eq!(stored.state.get("status"), Some(&json!("approved")));
    assert_eq!(stored.state.get("amount"), Some(&json!(10)));
    assert_eq!(stored.awaiting.len(), 1);
    assert_eq!(stored.awaiting[0].activity_id, "second");
}

#[tokio::test]
async fn correlation_id_narrows_resumed_instances() {
    let harness = Harness::new(vec![approval_flow()]);
    let first = suspend(&harness, "approval", Some("order-1")).await;
    let second = suspend(&harness, "approval", Some("order-2")).await;

    let summary = harness
        .manager
        .trigger_event("WaitForApproval", None, Some("order-2"))
        .await
        .expect("trigger");

    assert_eq!(summary.resumed.len(), 1);
    assert_eq!(summary.resumed[0].instance_id, second);
    let remaining = harness.stored().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, first);
}

#[tokio::test]
async fn event_without_correlation_resumes_every_waiting_instance() {
    let harness = Harness::new(vec![approval_flow()]);
    suspend(&harness, "approval", Some("order-1")).await;
    suspend(&harness, "approval", Some("order-2")).await;

    let summary = harness
        .manager
        .trigger_event("WaitForApproval", None, None)
        .await
        .expect("trigger");

    assert_eq!(summary.resumed.len(), 2);
    assert!(harness.stored().await.is_empty());
}

#[tokio::test]
async fn only_matching_awaiting_entries_are_resumed() {
    let definition = WorkflowDefinition::new("mixed")
        .with_activity(
            task("submit")
                .as_start()
                .with_property("outcomes", json!(["A", "B"])),
        )
        .with_activity(approval("review"))
        .with_activity(timer("deadline"))
        .with_activity(task("approved"))
        .with_activity(task("expired"))
        .with_transition(Transition::new("submit", "A", "review"))
        .with_transition(Transition::new("submit", "B", "deadline"))
        .with_transition(Transition::new("review", "Done", "approved"))
        .with_transition(Transition::new("deadline", "Done", "expired"));
    let harness = Harness::new(vec![definition]);
    let id = suspend(&harness, "mixed", None).await;
    harness.journal.clear();

    let summary = harness
        .manager
        .trigger_event("WaitForApproval", None, None)
        .await
        .expect("trigger");

    assert_eq!(summary.resumed.len(), 1);
    assert_eq!(harness.journal.executed(), vec!["review", "approved"]);
    let stored = harness.instances.get(id).await.expect("get").expect("stored");
    let awaiting: Vec<_> = stored.awaiting.iter().map(|e| e.activity_id.as_str()).collect();
    assert_eq!(awaiting, vec!["deadline"]);
}

#[tokio::test]
async fn event_starts_definitions_that_begin_with_it() {
    let harness = Harness::new(vec![on_approval()]);

    let summary = harness
        .manager
        .trigger_event(
            "WaitForApproval",
            Some(state(json!({"request": 42}))),
            Some("req-42"),
        )
        .await
        .expect("trigger");

    assert!(summary.resumed.is_empty());
    assert_eq!(summary.started.len(), 1);
    assert_eq!(summary.started[0].definition_id, "on-approval");
    assert_eq!(summary.started[0].status, WorkflowStatus::Completed);
    assert_eq!(harness.journal.executed(), vec!["entry", "audit"]);
}

#[tokio::test]
async fn suspended_instances_resume_before_new_ones_start() {
    let harness = Harness::new(vec![approval_flow(), on_approval()]);
    suspend(&harness, "approval", None).await;
    harness.journal.clear();

    let summary = harness
        .manager
        .trigger_event("WaitForApproval", None, None)
        .await
        .expect("trigger");

    assert_eq!(summary.resumed.len(), 1);
    assert_eq!(summary.started.len(), 1);
    assert_eq!(
        harness.journal.executed(),
        vec!["review", "publish", "entry", "audit"]
    );
}

#[tokio::test]
async fn started_instance_that_suspends_is_not_resumed_by_the_same_event() {
    let definition = WorkflowDefinition::new("re-wait")
        .with_activity(approval("entry").as_start())
        .with_activity(approval("again"))
        .with_transition(Transition::new("entry", "Done", "again"));
    let harness = Harness::new(vec![definition]);

    let summary = harness
        .manager
        .trigger_event("WaitForApproval", None, None)
        .await
        .expect("trigger");

    assert!(summary.resumed.is_empty());
    assert_eq!(summary.started[0].status, WorkflowStatus::Suspended);
    assert_eq!(summary.started[0].blocking, vec!["again"]);
    assert_eq!(harness.journal.executed(), vec!["entry"]);
    assert_eq!(harness.stored().await.len(), 1);
}

#[tokio::test]
async fn event_names_match_regardless_of_non_ascii_case() {
    let mut builder = ActivityRegistry::builder();
    activities::register_builtins(&mut builder);
    activities::register_signal(&mut builder, "Ärger");
    let definitions = Arc::new(InMemoryDefinitionStore::new());
    let definition = definitions.insert(
        WorkflowDefinition::new("complaint")
            .with_activity(ActivityRecord::new("start", "NoOp").as_start())
            .with_activity(ActivityRecord::new("wait", "Ärger"))
            .with_transition(Transition::new("start", "Done", "wait")),
    );
    let instances = Arc::new(InMemoryInstanceStore::new());
    let manager = WorkflowManager::new(Arc::new(builder.build()), definitions, instances.clone());

    let started = manager
        .start_workflow(definition, None, None, None)
        .await
        .expect("start");
    assert_eq!(started.status(), WorkflowStatus::Suspended);

    let summary = manager.trigger_event("ärger", None, None).await.expect("trigger");

    assert_eq!(summary.resumed.len(), 1);
    assert_eq!(summary.resumed[0].status, WorkflowStatus::Completed);
    assert!(summary.started.is_empty());
    assert!(instances.list().await.expect("list").is_empty());
}
