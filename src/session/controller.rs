/// Edit session controller
///
/// Sequences one actor's edit lifecycle (open → edit → save/cancel) against
/// the lock coordinator, re-verifying the lock at explicit named checkpoints
/// instead of assuming it survived any asynchronous gap. The graph model is
/// only mutated after the final pre-commit verification passes; every exit
/// path funnels through the same best-effort release with unconditional local
/// cleanup.

use crate::flow::types::{
    ComponentBinding, Connection, ContextMode, ContextVariable, NodeConfig, TriggerConfig,
};
use crate::flow::{FlowGraph, NodeUpdate};
use crate::session::error::SessionError;
use crate::session::lock::LockBackend;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What the open editor form is pointed at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    /// Creating a node that does not exist yet
    NewNode,
    /// Editing an existing node in place
    Existing(String),
}

/// Result of trying to open the editor
#[derive(Debug, Clone)]
pub enum OpenOutcome {
    /// Lock acquired, form open
    Opened,
    /// Same actor, same target, lock already held: reopened without
    /// reacquiring
    Reopened,
    /// This session is mid-edit of a different target
    Busy { editing: EditTarget },
    /// Another actor holds the lock (or this session lost the acquire race)
    Locked {
        holder: Option<String>,
        since: Option<DateTime<Utc>>,
    },
}

/// Why an in-progress edit was abandoned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// No locally remembered token; the editor was never opened or was
    /// already torn down
    NotHolding,
    /// The coordinator reports unlocked: the lock expired or was released
    /// out-of-band
    LockExpired,
    /// The coordinator holds a different token than this session remembers
    TokenMismatch { holder: Option<String> },
    /// The holder identity no longer matches this session's actor
    HolderMismatch { holder: String },
}

/// The named verification steps of the edit lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockCheckpoint {
    /// Before opening the create/edit form
    OpenEditor,
    /// Immediately before committing a save
    PreSave,
    /// Immediately before applying the mutation to the graph model
    PreCommit,
}

impl LockCheckpoint {
    fn name(self) -> &'static str {
        match self {
            LockCheckpoint::OpenEditor => "open-editor",
            LockCheckpoint::PreSave => "pre-save",
            LockCheckpoint::PreCommit => "pre-commit",
        }
    }
}

/// Outcome of a single checkpoint verification
#[derive(Debug, Clone)]
pub enum CheckpointOutcome {
    Verified,
    Aborted(AbortReason),
}

/// Result of a save attempt
#[derive(Debug, Clone)]
pub enum SaveOutcome {
    Created { node_id: String },
    Updated { node_id: String },
    Aborted(AbortReason),
}

/// The node form as submitted by the editing surface
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDraft {
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub asset_id: Option<String>,
    #[serde(default)]
    pub component: Option<ComponentBinding>,
    #[serde(default)]
    pub upstream_capabilities: Vec<String>,
    #[serde(default)]
    pub context_mode: ContextMode,
    #[serde(default)]
    pub variables: Vec<ContextVariable>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub trigger: Option<TriggerConfig>,
}

impl NodeDraft {
    fn into_config(self) -> NodeConfig {
        NodeConfig {
            label: self.label,
            description: self.description,
            asset_id: self.asset_id,
            component: self.component,
            upstream_capabilities: self.upstream_capabilities,
            context_mode: self.context_mode,
            variables: self.variables,
            connections: self.connections,
            trigger: self.trigger,
        }
    }
}

/// One actor's editing session over the shared graph
///
/// Holds the locally remembered lock token and the open edit target. The
/// session never adopts a token it did not acquire; on abort it surfaces the
/// observed holder and clears its own state only.
#[derive(Debug)]
pub struct EditSession<B: LockBackend> {
    lock: Arc<B>,
    actor: String,
    token: Option<String>,
    editing: Option<EditTarget>,
}

impl<B: LockBackend> EditSession<B> {
    pub fn new(lock: Arc<B>, actor: impl Into<String>) -> Self {
        Self {
            lock,
            actor: actor.into(),
            token: None,
            editing: None,
        }
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    pub fn holds_lock(&self) -> bool {
        self.token.is_some()
    }

    pub fn editing(&self) -> Option<&EditTarget> {
        self.editing.as_ref()
    }

    /// Open the create/edit form over `target`
    ///
    /// Reopens without reacquiring when this session is already mid-edit of
    /// the same node; refuses a second concurrent form; otherwise verifies the
    /// coordinator is unlocked and acquires.
    pub async fn open(&mut self, target: EditTarget) -> Result<OpenOutcome, SessionError> {
        if self.token.is_some() {
            if let Some(current) = &self.editing {
                if *current == target {
                    tracing::debug!(actor = %self.actor, "reopening held edit form");
                    return Ok(OpenOutcome::Reopened);
                }
                tracing::info!(actor = %self.actor, "edit form already open for another target");
                return Ok(OpenOutcome::Busy {
                    editing: current.clone(),
                });
            }
        }

        // Checkpoint: the form must not open over someone else's session.
        let status = self
            .lock
            .status()
            .await
            .map_err(SessionError::Transport)?;
        if status.locked {
            tracing::info!(
                actor = %self.actor,
                holder = status.locked_by.as_deref().unwrap_or("unknown"),
                checkpoint = LockCheckpoint::OpenEditor.name(),
                "editor open rejected: lock held"
            );
            return Ok(OpenOutcome::Locked {
                holder: status.locked_by,
                since: status.locked_at,
            });
        }

        let acquired = self
            .lock
            .acquire(&self.actor)
            .await
            .map_err(SessionError::Transport)?;
        if !acquired.locked {
            // Lost the race between status and acquire.
            return Ok(OpenOutcome::Locked {
                holder: acquired.locked_by,
                since: acquired.locked_at,
            });
        }

        self.token = acquired.token;
        self.editing = Some(target);
        Ok(OpenOutcome::Opened)
    }

    /// Commit the open form to the graph model
    ///
    /// Validation runs locally first; the lock is then re-verified at the
    /// pre-save and pre-commit checkpoints. Only after both pass is the
    /// create-or-update mutation applied and the form closed. Any abort
    /// leaves the graph untouched, closes the form and clears local lock
    /// state.
    pub async fn save(
        &mut self,
        graph: &mut FlowGraph,
        draft: NodeDraft,
    ) -> Result<SaveOutcome, SessionError> {
        if draft.label.trim().is_empty() {
            return Err(SessionError::MissingLabel);
        }

        let target = match (&self.editing, &self.token) {
            (Some(target), Some(_)) => target.clone(),
            _ => return Ok(SaveOutcome::Aborted(AbortReason::NotHolding)),
        };
        if let EditTarget::Existing(id) = &target {
            if graph.node(id).is_none() {
                return Err(SessionError::UnknownNode(id.clone()));
            }
        }

        match self.verify_lock(LockCheckpoint::PreSave).await? {
            CheckpointOutcome::Verified => {}
            CheckpointOutcome::Aborted(reason) => {
                self.abort(&reason).await;
                return Ok(SaveOutcome::Aborted(reason));
            }
        }

        let config = draft.into_config();

        // Final verification immediately before the write, to shrink the race
        // window left by the previous checkpoint.
        match self.verify_lock(LockCheckpoint::PreCommit).await? {
            CheckpointOutcome::Verified => {}
            CheckpointOutcome::Aborted(reason) => {
                self.abort(&reason).await;
                return Ok(SaveOutcome::Aborted(reason));
            }
        }

        let outcome = match target {
            EditTarget::NewNode => {
                let node_id = graph.create_node(config);
                tracing::info!(actor = %self.actor, node_id = %node_id, "node created");
                SaveOutcome::Created { node_id }
            }
            EditTarget::Existing(node_id) => {
                graph.update_node(
                    &node_id,
                    NodeUpdate {
                        label: Some(config.label),
                        description: Some(config.description),
                        asset_id: Some(config.asset_id),
                        component: Some(config.component),
                        upstream_capabilities: Some(config.upstream_capabilities),
                        context_mode: Some(config.context_mode),
                        variables: Some(config.variables),
                    },
                )?;
                graph.set_connections(&node_id, config.connections)?;
                graph.set_trigger_config(&node_id, config.trigger)?;
                tracing::info!(actor = %self.actor, node_id = %node_id, "node updated");
                SaveOutcome::Updated { node_id }
            }
        };

        self.close_editor().await;
        Ok(outcome)
    }

    /// Close the form without applying any mutation
    pub async fn cancel(&mut self) {
        tracing::debug!(actor = %self.actor, "edit cancelled");
        self.close_editor().await;
    }

    /// Re-fetch coordinator state and compare it against local expectations
    ///
    /// A transport failure clears local lock state before propagating: the
    /// conservative default after an unreachable coordinator is "not held".
    async fn verify_lock(
        &mut self,
        checkpoint: LockCheckpoint,
    ) -> Result<CheckpointOutcome, SessionError> {
        let local_token = match &self.token {
            Some(token) => token.clone(),
            None => return Ok(CheckpointOutcome::Aborted(AbortReason::NotHolding)),
        };

        let status = match self.lock.status().await {
            Ok(status) => status,
            Err(error) => {
                tracing::warn!(
                    actor = %self.actor,
                    checkpoint = checkpoint.name(),
                    error = %error,
                    "lock verification unreachable; assuming not held"
                );
                self.token = None;
                self.editing = None;
                return Err(SessionError::Transport(error));
            }
        };

        if !status.locked {
            tracing::warn!(
                actor = %self.actor,
                checkpoint = checkpoint.name(),
                "lock no longer held"
            );
            return Ok(CheckpointOutcome::Aborted(AbortReason::LockExpired));
        }
        if status.token.as_deref() != Some(local_token.as_str()) {
            tracing::warn!(
                actor = %self.actor,
                checkpoint = checkpoint.name(),
                holder = status.locked_by.as_deref().unwrap_or("unknown"),
                "held token does not match local token"
            );
            return Ok(CheckpointOutcome::Aborted(AbortReason::TokenMismatch {
                holder: status.locked_by,
            }));
        }
        if let Some(holder) = &status.locked_by {
            if holder != &self.actor {
                tracing::warn!(
                    actor = %self.actor,
                    checkpoint = checkpoint.name(),
                    holder = %holder,
                    "lock held by a different actor"
                );
                return Ok(CheckpointOutcome::Aborted(AbortReason::HolderMismatch {
                    holder: holder.clone(),
                }));
            }
        }

        tracing::debug!(actor = %self.actor, checkpoint = checkpoint.name(), "lock verified");
        Ok(CheckpointOutcome::Verified)
    }

    /// Abandon the in-progress edit after a failed checkpoint
    ///
    /// The observed holder has already been surfaced by `verify_lock`; here
    /// local state is resynchronized (cleared, never adopting a foreign
    /// token) and the form closed.
    async fn abort(&mut self, reason: &AbortReason) {
        tracing::info!(actor = %self.actor, ?reason, "edit aborted");
        self.close_editor().await;
    }

    /// The single close funnel for save, cancel and abort paths
    ///
    /// Releases with this session's own token only; a failed or ignored
    /// release is logged and local state is cleared regardless, so the
    /// editing surface is never left stuck.
    async fn close_editor(&mut self) {
        self.editing = None;
        if let Some(token) = self.token.take() {
            match self.lock.release(&token).await {
                Ok(true) => tracing::debug!(actor = %self.actor, "lock released"),
                Ok(false) => {
                    tracing::warn!(actor = %self.actor, "release ignored: token not current")
                }
                Err(error) => tracing::warn!(
                    actor = %self.actor,
                    error = %error,
                    "lock release failed; local state cleared anyway"
                ),
            }
        }
    }
}

impl<B: LockBackend> Drop for EditSession<B> {
    /// Best-effort release on abrupt teardown
    ///
    /// When the session is dropped while still holding the lock, the release
    /// is spawned onto the current runtime if one exists; failure to release
    /// is logged and never blocks teardown.
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let lock = Arc::clone(&self.lock);
                    let actor = self.actor.clone();
                    handle.spawn(async move {
                        if let Err(error) = lock.release(&token).await {
                            tracing::warn!(actor = %actor, error = %error, "teardown release failed");
                        }
                    });
                }
                Err(_) => {
                    tracing::warn!(actor = %self.actor, "dropped while holding lock, no runtime to release on");
                }
            }
        }
    }
}
