/// Edit session errors
///
/// Soft, expected states (contention, staleness) are modeled as outcome
/// values, not errors; these variants cover local validation failures and
/// transport-level faults.

/// Errors surfaced by the edit session controller
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The node label is required; checked before any coordinator call.
    #[error("node label is required")]
    MissingLabel,

    /// The edit target no longer exists in the graph.
    #[error("node not found: {0}")]
    UnknownNode(String),

    /// A graph mutation failed structurally.
    #[error(transparent)]
    Graph(#[from] crate::flow::GraphError),

    /// The lock service could not be reached; local lock state has already
    /// been cleared to the conservative "not held" default.
    #[error("lock service unavailable: {0}")]
    Transport(#[source] anyhow::Error),
}
