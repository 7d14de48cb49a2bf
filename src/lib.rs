/// Flowdeck: collaborative workflow graph editing backend
///
/// This library provides the workflow graph model with its trigger semantics,
/// single-writer editing-lock coordination, and persistence for named
/// workflows and reusable templates.

// Core configuration and setup
pub mod config;

// Graph model layer - nodes, connections, triggers, identifier allocation
pub mod flow;

// Edit session layer - lock coordination and the edit lifecycle
pub mod session;

// Hosted editing workspace shared by all actors
pub mod editor;

// Persistence layer - flows, templates and the reference catalog
pub mod storage;

// Lock-free catalog snapshot registry
pub mod catalog;

// HTTP API layer - REST endpoints for flows, lock lifecycle and the editor
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use editor::EditorService;
pub use flow::{Connection, FlowGraph, FlowNode, FlowSnapshot, NodeConfig, TriggerConfig};
pub use session::{EditSession, EditTarget, LockCoordinator, NodeDraft};
pub use server::start_server;
pub use storage::FlowStorage;
