//! Integration tests for the edit session controller: lock checkpoints,
//! abort paths and release-on-close behavior.

use anyhow::Result;
use flowdeck::flow::{Connection, FlowGraph, GateKind, NodeConfig, TriggerConfig};
use flowdeck::session::{
    AbortReason, EditSession, EditTarget, LockBackend, LockCoordinator, LockDescriptor, NodeDraft,
    OpenOutcome, SaveOutcome, SessionError,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn draft(label: &str) -> NodeDraft {
    NodeDraft {
        label: label.to_string(),
        ..NodeDraft::default()
    }
}

/// Lock backend that can be switched into a failing state to model a lost
/// connection to the coordinator.
struct FlakyBackend {
    inner: LockCoordinator,
    failing: AtomicBool,
}

impl FlakyBackend {
    fn new() -> Self {
        Self {
            inner: LockCoordinator::new(),
            failing: AtomicBool::new(false),
        }
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("connection reset by peer");
        }
        Ok(())
    }
}

impl LockBackend for FlakyBackend {
    async fn acquire(&self, actor: &str) -> Result<LockDescriptor> {
        self.check()?;
        Ok(self.inner.acquire(actor).await)
    }

    async fn release(&self, token: &str) -> Result<bool> {
        self.check()?;
        Ok(self.inner.release(token).await)
    }

    async fn status(&self) -> Result<LockDescriptor> {
        self.check()?;
        Ok(self.inner.status().await)
    }
}

#[tokio::test]
async fn create_node_through_full_lifecycle() {
    let lock = Arc::new(LockCoordinator::new());
    let mut graph = FlowGraph::new();
    let mut session = EditSession::new(Arc::clone(&lock), "alice");

    let opened = session.open(EditTarget::NewNode).await.expect("open");
    assert!(matches!(opened, OpenOutcome::Opened));
    assert!(session.holds_lock());

    let outcome = session
        .save(&mut graph, draft("Start"))
        .await
        .expect("save");
    match outcome {
        SaveOutcome::Created { node_id } => {
            assert_eq!(node_id, "node-0");
            assert_eq!(graph.node(&node_id).expect("node").config.label, "Start");
        }
        other => panic!("expected created, got {other:?}"),
    }

    // The form closed and the lock was released.
    assert!(!session.holds_lock());
    assert!(session.editing().is_none());
    assert!(!lock.status().await.locked);
}

#[tokio::test]
async fn update_existing_node_replaces_config() {
    let lock = Arc::new(LockCoordinator::new());
    let mut graph = FlowGraph::new();
    let first = graph.create_node(NodeConfig {
        label: "Start".into(),
        ..NodeConfig::default()
    });
    let second = graph.create_node(NodeConfig {
        label: "Finish".into(),
        ..NodeConfig::default()
    });

    let mut session = EditSession::new(Arc::clone(&lock), "alice");
    let opened = session
        .open(EditTarget::Existing(first.clone()))
        .await
        .expect("open");
    assert!(matches!(opened, OpenOutcome::Opened));

    let mut node_draft = draft("Start (renamed)");
    node_draft.description = Some("entry point".into());
    node_draft.connections = vec![Connection {
        target_node_id: second.clone(),
        logic_description: "continue on success".into(),
    }];
    node_draft.trigger = Some(TriggerConfig::gate(GateKind::Or, vec![second.clone()]));

    let outcome = session.save(&mut graph, node_draft).await.expect("save");
    assert!(matches!(outcome, SaveOutcome::Updated { ref node_id } if *node_id == first));

    let node = graph.node(&first).expect("node");
    assert_eq!(node.config.label, "Start (renamed)");
    assert_eq!(node.config.description.as_deref(), Some("entry point"));
    assert_eq!(node.config.connections.len(), 1);
    assert!(node.config.trigger.is_some());
    // Identity never changes on update.
    assert_eq!(node.id, first);
}

#[tokio::test]
async fn contention_reports_holder_identity() {
    let lock = Arc::new(LockCoordinator::new());
    let mut alice = EditSession::new(Arc::clone(&lock), "alice");
    let mut bob = EditSession::new(Arc::clone(&lock), "bob");

    assert!(matches!(
        alice.open(EditTarget::NewNode).await.expect("open"),
        OpenOutcome::Opened
    ));

    match bob.open(EditTarget::NewNode).await.expect("open") {
        OpenOutcome::Locked { holder, since } => {
            assert_eq!(holder.as_deref(), Some("alice"));
            assert!(since.is_some());
        }
        other => panic!("expected locked, got {other:?}"),
    }
    assert!(!bob.holds_lock());
}

#[tokio::test]
async fn reopening_the_same_target_does_not_reacquire() {
    let lock = Arc::new(LockCoordinator::new());
    let mut graph = FlowGraph::new();
    let node_id = graph.create_node(NodeConfig {
        label: "Start".into(),
        ..NodeConfig::default()
    });

    let mut session = EditSession::new(Arc::clone(&lock), "alice");
    assert!(matches!(
        session
            .open(EditTarget::Existing(node_id.clone()))
            .await
            .expect("open"),
        OpenOutcome::Opened
    ));
    let token_before = lock.status().await.token;

    assert!(matches!(
        session
            .open(EditTarget::Existing(node_id.clone()))
            .await
            .expect("reopen"),
        OpenOutcome::Reopened
    ));
    assert_eq!(lock.status().await.token, token_before);

    // A different target while mid-edit is refused locally.
    match session.open(EditTarget::NewNode).await.expect("open") {
        OpenOutcome::Busy { editing } => {
            assert_eq!(editing, EditTarget::Existing(node_id));
        }
        other => panic!("expected busy, got {other:?}"),
    }
}

#[tokio::test]
async fn save_aborts_when_lock_released_externally() {
    let lock = Arc::new(LockCoordinator::new());
    let mut graph = FlowGraph::new();
    let mut session = EditSession::new(Arc::clone(&lock), "alice");

    assert!(matches!(
        session.open(EditTarget::NewNode).await.expect("open"),
        OpenOutcome::Opened
    ));

    // A second client force-unlocks out of band.
    lock.force_clear().await;

    let outcome = session.save(&mut graph, draft("Start")).await.expect("save");
    assert!(matches!(
        outcome,
        SaveOutcome::Aborted(AbortReason::LockExpired)
    ));

    // No partial save, local state cleared, editor closed.
    assert!(graph.is_empty());
    assert!(!session.holds_lock());
    assert!(session.editing().is_none());
}

#[tokio::test]
async fn save_aborts_without_unlocking_the_new_holder() {
    let lock = Arc::new(LockCoordinator::new());
    let mut graph = FlowGraph::new();
    let mut alice = EditSession::new(Arc::clone(&lock), "alice");

    assert!(matches!(
        alice.open(EditTarget::NewNode).await.expect("open"),
        OpenOutcome::Opened
    ));

    // Alice's lock is force-cleared and bob grabs it before she saves.
    lock.force_clear().await;
    let bob = lock.acquire("bob").await;
    assert!(bob.locked);

    let outcome = alice.save(&mut graph, draft("Start")).await.expect("save");
    match outcome {
        SaveOutcome::Aborted(AbortReason::TokenMismatch { holder }) => {
            assert_eq!(holder.as_deref(), Some("bob"));
        }
        other => panic!("expected token mismatch, got {other:?}"),
    }
    assert!(graph.is_empty());
    assert!(!alice.holds_lock());

    // Alice's close-time release used her own stale token, so bob's session
    // survives intact.
    let status = lock.status().await;
    assert!(status.locked);
    assert_eq!(status.locked_by.as_deref(), Some("bob"));
    assert_eq!(status.token, bob.token);
}

#[tokio::test]
async fn cancel_releases_the_lock_without_mutation() {
    let lock = Arc::new(LockCoordinator::new());
    let mut graph = FlowGraph::new();
    let mut alice = EditSession::new(Arc::clone(&lock), "alice");
    let mut bob = EditSession::new(Arc::clone(&lock), "bob");

    assert!(matches!(
        alice.open(EditTarget::NewNode).await.expect("open"),
        OpenOutcome::Opened
    ));
    alice.cancel().await;

    assert!(graph.is_empty());
    assert!(!alice.holds_lock());
    assert!(!lock.status().await.locked);

    // The resource is free for the next actor.
    assert!(matches!(
        bob.open(EditTarget::NewNode).await.expect("open"),
        OpenOutcome::Opened
    ));
}

#[tokio::test]
async fn empty_label_blocks_before_any_checkpoint() {
    let lock = Arc::new(LockCoordinator::new());
    let mut graph = FlowGraph::new();
    let mut session = EditSession::new(Arc::clone(&lock), "alice");

    assert!(matches!(
        session.open(EditTarget::NewNode).await.expect("open"),
        OpenOutcome::Opened
    ));

    let result = session.save(&mut graph, draft("   ")).await;
    assert!(matches!(result, Err(SessionError::MissingLabel)));

    // Validation failure leaves the form open and the lock held.
    assert!(session.holds_lock());
    assert!(lock.status().await.locked);
    assert!(graph.is_empty());

    session.cancel().await;
}

#[tokio::test]
async fn save_without_an_open_form_aborts() {
    let lock = Arc::new(LockCoordinator::new());
    let mut graph = FlowGraph::new();
    let mut session = EditSession::new(Arc::clone(&lock), "alice");

    let outcome = session.save(&mut graph, draft("Start")).await.expect("save");
    assert!(matches!(
        outcome,
        SaveOutcome::Aborted(AbortReason::NotHolding)
    ));
    assert!(graph.is_empty());
}

#[tokio::test]
async fn transport_failure_clears_local_state_and_skips_the_write() {
    let backend = Arc::new(FlakyBackend::new());
    let mut graph = FlowGraph::new();
    let mut session = EditSession::new(Arc::clone(&backend), "alice");

    assert!(matches!(
        session.open(EditTarget::NewNode).await.expect("open"),
        OpenOutcome::Opened
    ));

    backend.set_failing(true);
    let result = session.save(&mut graph, draft("Start")).await;
    assert!(matches!(result, Err(SessionError::Transport(_))));

    // Conservative default after an unreachable coordinator: not held.
    assert!(!session.holds_lock());
    assert!(session.editing().is_none());
    assert!(graph.is_empty());

    // The remote lock is orphaned until cleared out of band; this design has
    // no expiry timer.
    backend.set_failing(false);
    assert!(backend.inner.status().await.locked);
    backend.inner.force_clear().await;
    assert!(!backend.inner.status().await.locked);
}

#[tokio::test]
async fn dropping_a_session_releases_the_lock() {
    let lock = Arc::new(LockCoordinator::new());
    let mut session = EditSession::new(Arc::clone(&lock), "alice");

    assert!(matches!(
        session.open(EditTarget::NewNode).await.expect("open"),
        OpenOutcome::Opened
    ));
    assert!(lock.status().await.locked);

    drop(session);

    // The teardown guard spawns the release; poll until it lands.
    for _ in 0..50 {
        if !lock.status().await.locked {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("lock was not released after session teardown");
}

#[tokio::test]
async fn open_races_resolve_to_a_single_winner() {
    let lock = Arc::new(LockCoordinator::with_latency(Duration::from_millis(5)));

    let mut handles = Vec::new();
    for i in 0..4 {
        let lock = Arc::clone(&lock);
        handles.push(tokio::spawn(async move {
            let actor = format!("actor-{i}");
            let mut session = EditSession::new(lock, actor);
            let outcome = session.open(EditTarget::NewNode).await.expect("open");
            let won = matches!(outcome, OpenOutcome::Opened);
            if won {
                // Keep the lock until after the race is tallied.
                tokio::time::sleep(Duration::from_millis(50)).await;
                session.cancel().await;
            }
            won
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.expect("open task") {
            winners += 1;
        }
    }
    assert_eq!(winners, 1, "exactly one session may open the editor");
}
