//! Integration tests for the hosted editing workspace: loading persisted
//! flows, the per-actor lifecycle and validated persistence.

use flowdeck::editor::EditorService;
use flowdeck::flow::{Connection, FlowGraph, NodeConfig};
use flowdeck::session::{EditTarget, LockCoordinator, NodeDraft, OpenOutcome, SaveOutcome};
use flowdeck::session::SessionError;
use flowdeck::storage::FlowStorage;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::sync::Arc;

async fn memory_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite")
}

async fn seeded_storage() -> (FlowStorage, String) {
    let storage = FlowStorage::new(memory_pool().await);
    storage.init_schema().await.expect("schema");

    let mut graph = FlowGraph::new();
    graph.create_node(NodeConfig {
        label: "Start".into(),
        ..NodeConfig::default()
    });
    graph.create_node(NodeConfig {
        label: "Finish".into(),
        ..NodeConfig::default()
    });

    let flow_id = storage
        .create_flow("Seeded", None, None, &graph.snapshot())
        .await
        .expect("create");
    (storage, flow_id)
}

fn draft(label: &str) -> NodeDraft {
    NodeDraft {
        label: label.to_string(),
        ..NodeDraft::default()
    }
}

#[tokio::test]
async fn edit_loaded_flow_and_persist_back() {
    let (storage, flow_id) = seeded_storage().await;
    let lock = Arc::new(LockCoordinator::new());
    let editor = EditorService::new(Arc::clone(&lock));

    let record = storage
        .get_flow(&flow_id)
        .await
        .expect("get")
        .expect("record");
    editor.load_flow(record).await;

    let opened = editor
        .open("alice", EditTarget::Existing("node-0".into()))
        .await
        .expect("open");
    assert!(matches!(opened, OpenOutcome::Opened));

    let outcome = editor
        .save("alice", draft("Start (edited)"))
        .await
        .expect("save");
    assert!(matches!(outcome, SaveOutcome::Updated { ref node_id } if node_id == "node-0"));

    // The lock was released when the form closed.
    assert!(!lock.status().await.locked);

    let persisted = editor.persist(&storage, None).await.expect("persist");
    assert_eq!(persisted.flow_id, flow_id);
    assert!(!persisted.created);

    let record = storage
        .get_flow(&flow_id)
        .await
        .expect("get")
        .expect("record");
    let edited = record
        .payload
        .nodes
        .iter()
        .find(|n| n.id == "node-0")
        .expect("node");
    assert_eq!(edited.config.label, "Start (edited)");
}

#[tokio::test]
async fn new_nodes_continue_the_loaded_id_sequence() {
    let (storage, flow_id) = seeded_storage().await;
    let editor = EditorService::new(Arc::new(LockCoordinator::new()));

    let record = storage
        .get_flow(&flow_id)
        .await
        .expect("get")
        .expect("record");
    editor.load_flow(record).await;

    assert!(matches!(
        editor.open("alice", EditTarget::NewNode).await.expect("open"),
        OpenOutcome::Opened
    ));
    let outcome = editor.save("alice", draft("Review")).await.expect("save");
    // node-0 and node-1 came from the persisted flow.
    assert!(matches!(outcome, SaveOutcome::Created { ref node_id } if node_id == "node-2"));
}

#[tokio::test]
async fn actors_contend_for_the_single_workspace_lock() {
    let (storage, flow_id) = seeded_storage().await;
    let editor = EditorService::new(Arc::new(LockCoordinator::new()));

    let record = storage
        .get_flow(&flow_id)
        .await
        .expect("get")
        .expect("record");
    editor.load_flow(record).await;

    assert!(matches!(
        editor.open("alice", EditTarget::NewNode).await.expect("open"),
        OpenOutcome::Opened
    ));

    match editor
        .open("bob", EditTarget::Existing("node-0".into()))
        .await
        .expect("open")
    {
        OpenOutcome::Locked { holder, .. } => assert_eq!(holder.as_deref(), Some("alice")),
        other => panic!("expected locked, got {other:?}"),
    }

    // Alice cancels; bob gets through.
    editor.cancel("alice").await;
    assert!(matches!(
        editor
            .open("bob", EditTarget::Existing("node-0".into()))
            .await
            .expect("open"),
        OpenOutcome::Opened
    ));
    editor.cancel("bob").await;
}

#[tokio::test]
async fn opening_a_missing_node_is_rejected_before_locking() {
    let editor = EditorService::new(Arc::new(LockCoordinator::new()));
    editor.new_workspace().await;

    let result = editor
        .open("alice", EditTarget::Existing("node-42".into()))
        .await;
    assert!(matches!(result, Err(SessionError::UnknownNode(_))));

    // No lock was taken for the failed open.
    assert!(matches!(
        editor.open("alice", EditTarget::NewNode).await.expect("open"),
        OpenOutcome::Opened
    ));
    editor.cancel("alice").await;
}

#[tokio::test]
async fn persist_requires_a_name_for_new_workspaces() {
    let storage = FlowStorage::new(memory_pool().await);
    storage.init_schema().await.expect("schema");
    let editor = EditorService::new(Arc::new(LockCoordinator::new()));
    editor.new_workspace().await;

    assert!(editor.persist(&storage, None).await.is_err());

    let outcome = editor
        .persist(&storage, Some("Fresh workflow"))
        .await
        .expect("persist");
    assert!(outcome.created);

    // Subsequent persists update the same flow under the remembered name.
    let again = editor.persist(&storage, None).await.expect("persist");
    assert_eq!(again.flow_id, outcome.flow_id);
    assert!(!again.created);
    assert_eq!(storage.list_flows().await.expect("list").len(), 1);
}

#[tokio::test]
async fn persist_rejects_structurally_invalid_graphs() {
    let storage = FlowStorage::new(memory_pool().await);
    storage.init_schema().await.expect("schema");
    let editor = EditorService::new(Arc::new(LockCoordinator::new()));
    editor.new_workspace().await;

    assert!(matches!(
        editor.open("alice", EditTarget::NewNode).await.expect("open"),
        OpenOutcome::Opened
    ));
    let mut bad = draft("Dangler");
    bad.connections = vec![Connection {
        target_node_id: "node-99".into(),
        logic_description: String::new(),
    }];
    // The editor accepts the transiently invalid state...
    assert!(matches!(
        editor.save("alice", bad).await.expect("save"),
        SaveOutcome::Created { .. }
    ));

    // ...but persistence is gated on validation.
    assert!(editor.persist(&storage, Some("Broken")).await.is_err());
    assert!(storage.list_flows().await.expect("list").is_empty());
}
