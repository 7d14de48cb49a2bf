/// Edit Session Layer
///
/// This module owns write-access coordination for the shared graph-editing
/// session:
/// - The single-resource lock coordinator (acquire/release/status)
/// - The per-actor edit session controller with its named verification
///   checkpoints
/// - The session error taxonomy

// Single-resource mutual exclusion service
pub mod lock;

// Open → edit → save/cancel lifecycle orchestration
pub mod controller;

// Session error taxonomy
pub mod error;

// Re-export commonly used types
pub use controller::{
    AbortReason, CheckpointOutcome, EditSession, EditTarget, LockCheckpoint, NodeDraft,
    OpenOutcome, SaveOutcome,
};
pub use error::SessionError;
pub use lock::{LockBackend, LockCoordinator, LockDescriptor};
