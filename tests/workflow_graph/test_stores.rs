use serde_json::json;
use std::fs;
use switchyard::core::types::ErrorCategory;
use switchyard::core::workflow_graph::{
    ActivityRecord, AwaitingActivityRecord, DefinitionStore, FileInstanceStore,
    InMemoryDefinitionStore, InstanceStore, WorkflowInstanceRecord, WorkflowState,
};
use tempfile::TempDir;

fn suspended(type_name: &str, correlation: Option<&str>) -> WorkflowInstanceRecord {
    let mut state = WorkflowState::new();
    state.set("amount", json!(10));
    let mut instance =
        WorkflowInstanceRecord::new("approval", state, correlation.map(str::to_string));
    instance.add_awaiting(AwaitingActivityRecord::from(&ActivityRecord::new(
        "wait", type_name,
    )));
    instance
}

#[tokio::test]
async fn file_store_persists_one_document_per_instance() {
    let temp = TempDir::new().expect("tempdir");
    let store = FileInstanceStore::new(temp.path());
    let mut instance = suspended("WaitForApproval", Some("order-1"));

    store.save(&mut instance).await.expect("save");

    let path = store.instance_path(&instance.id);
    assert!(path.starts_with(temp.path().join("instances")));
    let document: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
    assert_eq!(document["version"], json!(1));
    assert_eq!(document["state"]["amount"], json!(10));
    assert_eq!(document["awaiting"][0]["type_name"], json!("WaitForApproval"));

    let leftovers: Vec<_> = fs::read_dir(store.instances_dir())
        .expect("list")
        .flatten()
        .filter(|entry| entry.path().extension().and_then(|e| e.to_str()) == Some("tmp"))
        .collect();
    assert!(leftovers.is_empty());

    let loaded = store.get(instance.id).await.expect("get").expect("present");
    assert_eq!(loaded.version, 1);
    assert_eq!(loaded.correlation_id.as_deref(), Some("order-1"));
}

#[tokio::test]
async fn file_store_rejects_stale_writes() {
    let temp = TempDir::new().expect("tempdir");
    let store = FileInstanceStore::new(temp.path());
    let mut instance = suspended("WaitForApproval", None);
    store.save(&mut instance).await.expect("insert");
    let mut stale = instance.clone();
    store.save(&mut instance).await.expect("update");

    let err = store.save(&mut stale).await.expect_err("stale save");
    assert_eq!(err.code, "WFG-STORE-409");
    assert_eq!(err.category, ErrorCategory::ConflictError);

    let err = store.delete(&stale).await.expect_err("stale delete");
    assert_eq!(err.code, "WFG-STORE-409");

    store.delete(&instance).await.expect("delete");
    assert!(store.get(instance.id).await.expect("get").is_none());
    let err = store.delete(&instance).await.expect_err("gone");
    assert_eq!(err.code, "WFG-STORE-404");
}

#[tokio::test]
async fn file_store_queries_scan_the_directory() {
    let temp = TempDir::new().expect("tempdir");
    let store = FileInstanceStore::new(temp.path());
    assert!(store.list().await.expect("empty list").is_empty());

    let mut a = suspended("WaitForApproval", Some("order-1"));
    let mut b = suspended("Timer", Some("order-1"));
    let mut c = suspended("waitforapproval", Some("order-2"));
    for instance in [&mut a, &mut b, &mut c] {
        store.save(instance).await.expect("save");
    }
    fs::write(store.instances_dir().join("notes.txt"), "ignored").expect("write");

    assert_eq!(store.list().await.expect("list").len(), 3);

    let approvals = store
        .find_awaiting_activity_type("WaitForApproval", None)
        .await
        .expect("query");
    let mut ids: Vec<_> = approvals.iter().map(|i| i.id).collect();
    ids.sort();
    let mut expected = vec![a.id, c.id];
    expected.sort();
    assert_eq!(ids, expected);

    let narrowed = store
        .find_awaiting_activity_type("WaitForApproval", Some("order-1"))
        .await
        .expect("query");
    assert_eq!(narrowed.len(), 1);
    assert_eq!(narrowed[0].id, a.id);
}

#[tokio::test]
async fn corrupt_instance_document_is_a_serialization_error() {
    let temp = TempDir::new().expect("tempdir");
    let store = FileInstanceStore::new(temp.path());
    let instance = suspended("Timer", None);
    fs::create_dir_all(store.instances_dir()).expect("mkdir");
    fs::write(store.instance_path(&instance.id), "{ not json").expect("write");

    let err = store.get(instance.id).await.expect_err("corrupt");
    assert_eq!(err.code, "WFG-STORE-SER");
    assert_eq!(err.category, ErrorCategory::SerializationError);
}

#[tokio::test]
async fn definition_store_loads_yaml_directory() {
    let temp = TempDir::new().expect("tempdir");
    fs::write(
        temp.path().join("b_on_approval.yaml"),
        r#"
id: on-approval
activities:
  - id: entry
    type: WaitForApproval
    start: true
"#,
    )
    .expect("write");
    fs::write(
        temp.path().join("a_linear.yml"),
        r#"
id: linear
activities:
  - id: only
    type: NoOp
    start: true
"#,
    )
    .expect("write");
    fs::write(temp.path().join("README.md"), "not a workflow").expect("write");

    let store = InMemoryDefinitionStore::load_dir(temp.path()).expect("load");

    assert_eq!(store.len(), 2);
    assert!(store.get_by_id("linear").await.expect("get").is_some());
    let started_by_event = store
        .find_by_start_activity_type("WaitForApproval")
        .await
        .expect("query");
    assert_eq!(started_by_event.len(), 1);
    assert_eq!(started_by_event[0].id, "on-approval");
}
