/// Hosted editing workspace
///
/// Holds the one editable graph session the coordinator protects: the loaded
/// workspace (graph + name + origin flow id) and one `EditSession` per actor,
/// all sharing the process-wide lock coordinator. The HTTP editor endpoints
/// are thin wrappers over this service.

use crate::flow::{FlowGraph, FlowSnapshot};
use crate::session::{EditSession, EditTarget, LockCoordinator, OpenOutcome, SaveOutcome};
use crate::session::{NodeDraft, SessionError};
use crate::storage::flows::{FlowRecord, FlowStorage, TemplateRecord};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// The graph currently open for editing
#[derive(Debug, Default)]
pub struct Workspace {
    /// Persisted flow this workspace was loaded from; None until first persist
    pub flow_id: Option<String>,
    pub name: String,
    pub graph: FlowGraph,
}

#[derive(Debug, Default)]
struct EditorState {
    workspace: Workspace,
    sessions: HashMap<String, EditSession<LockCoordinator>>,
}

/// Result of persisting the workspace
#[derive(Debug, Clone, serde::Serialize)]
pub struct PersistOutcome {
    pub flow_id: String,
    pub created: bool,
}

/// Service owning the editable workspace and its per-actor sessions
#[derive(Debug)]
pub struct EditorService {
    lock: Arc<LockCoordinator>,
    state: Mutex<EditorState>,
}

impl EditorService {
    pub fn new(lock: Arc<LockCoordinator>) -> Self {
        Self {
            lock,
            state: Mutex::new(EditorState::default()),
        }
    }

    pub fn lock_coordinator(&self) -> Arc<LockCoordinator> {
        Arc::clone(&self.lock)
    }

    /// Replace the workspace with a persisted flow
    ///
    /// Rebuilding the graph reseeds the identifier allocator from the loaded
    /// node ids. Existing per-actor sessions are dropped; any lock they still
    /// hold is released by their teardown guard.
    pub async fn load_flow(&self, record: FlowRecord) {
        let mut state = self.state.lock().await;
        state.sessions.clear();
        state.workspace = Workspace {
            flow_id: Some(record.flow_id),
            name: record.name,
            graph: FlowGraph::from_snapshot(record.payload),
        };
        tracing::info!(
            flow_id = state.workspace.flow_id.as_deref().unwrap_or(""),
            nodes = state.workspace.graph.len(),
            "workspace loaded from flow"
        );
    }

    /// Seed the workspace from a reusable template
    ///
    /// The workspace starts unsaved (`flow_id: None`); persisting creates a
    /// fresh flow that records the originating template id.
    pub async fn load_template(&self, record: TemplateRecord) {
        let mut state = self.state.lock().await;
        state.sessions.clear();
        state.workspace = Workspace {
            flow_id: None,
            name: record.name,
            graph: FlowGraph::from_snapshot(record.payload),
        };
        tracing::info!(template_id = %record.template_id, "workspace seeded from template");
    }

    /// Reset to an empty, unsaved workspace
    pub async fn new_workspace(&self) {
        let mut state = self.state.lock().await;
        state.sessions.clear();
        state.workspace = Workspace::default();
        tracing::info!("workspace reset");
    }

    /// Open the create/edit form for `actor`
    pub async fn open(&self, actor: &str, target: EditTarget) -> Result<OpenOutcome, SessionError> {
        let mut state = self.state.lock().await;
        if let EditTarget::Existing(node_id) = &target {
            if state.workspace.graph.node(node_id).is_none() {
                return Err(SessionError::UnknownNode(node_id.clone()));
            }
        }

        let lock = Arc::clone(&self.lock);
        let session = state
            .sessions
            .entry(actor.to_string())
            .or_insert_with(|| EditSession::new(lock, actor));
        session.open(target).await
    }

    /// Commit `actor`'s open form to the workspace graph
    pub async fn save(&self, actor: &str, draft: NodeDraft) -> Result<SaveOutcome, SessionError> {
        let mut state = self.state.lock().await;
        let EditorState {
            workspace,
            sessions,
        } = &mut *state;

        let lock = Arc::clone(&self.lock);
        let session = sessions
            .entry(actor.to_string())
            .or_insert_with(|| EditSession::new(lock, actor));
        session.save(&mut workspace.graph, draft).await
    }

    /// Close `actor`'s form without mutating the graph
    pub async fn cancel(&self, actor: &str) {
        let mut state = self.state.lock().await;
        if let Some(session) = state.sessions.get_mut(actor) {
            session.cancel().await;
        }
    }

    /// Current workspace graph in persisted form
    pub async fn snapshot(&self) -> FlowSnapshot {
        let state = self.state.lock().await;
        state.workspace.graph.snapshot()
    }

    /// Validate and persist the workspace
    ///
    /// Creates a new flow when the workspace has no origin, updates it
    /// otherwise. The asset reference is taken from the first node carrying
    /// one (a fresh opaque id is minted when none does), and every persist
    /// mints a new template reference, as the original editor did.
    pub async fn persist(
        &self,
        storage: &FlowStorage,
        name: Option<&str>,
    ) -> Result<PersistOutcome> {
        let mut state = self.state.lock().await;

        if let Some(name) = name {
            state.workspace.name = name.trim().to_string();
        }
        if state.workspace.name.is_empty() {
            anyhow::bail!("workflow name is required");
        }

        state.workspace.graph.validate()?;
        let payload = state.workspace.graph.snapshot();

        let asset_id = payload
            .nodes
            .iter()
            .find_map(|node| node.config.asset_id.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let template_id = Uuid::new_v4().to_string();

        let outcome = match state.workspace.flow_id.clone() {
            Some(flow_id) => {
                let updated = storage
                    .update_flow(
                        &flow_id,
                        &state.workspace.name,
                        Some(&asset_id),
                        Some(&template_id),
                        &payload,
                    )
                    .await?;
                if !updated {
                    anyhow::bail!("workflow not found: {flow_id}");
                }
                PersistOutcome {
                    flow_id,
                    created: false,
                }
            }
            None => {
                let flow_id = storage
                    .create_flow(
                        &state.workspace.name,
                        Some(&asset_id),
                        Some(&template_id),
                        &payload,
                    )
                    .await?;
                state.workspace.flow_id = Some(flow_id.clone());
                PersistOutcome {
                    flow_id,
                    created: true,
                }
            }
        };

        Ok(outcome)
    }
}
