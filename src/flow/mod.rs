/// Graph Model Layer
///
/// This module owns the workflow graph data structures and their mutation
/// rules:
/// - Type definitions (FlowNode, Connection, TriggerConfig, context modes)
/// - Node identifier allocation (`node-<N>` policy)
/// - Graph operations and petgraph-backed structural validation

// Core graph type definitions
pub mod types;

// Node identifier allocation
pub mod allocator;

// Graph mutation operations and validation
pub mod graph;

// Re-export commonly used types
pub use allocator::NodeIdAllocator;
pub use graph::{FlowGraph, GraphError, NodeUpdate};
pub use types::{
    CompareOp, ComponentBinding, ComponentParam, Connection, ContextMode, ContextVariable,
    FlowNode, FlowSnapshot, GateKind, NodeConfig, SnapshotEdge, TriggerCondition, TriggerConfig,
    TriggerVariant, VariableEquality, VariableType,
};
