/// Graph model: node set mutation and structural validation
///
/// `FlowGraph` owns the in-memory node set and the identifier allocator.
/// Mutation happens through the operations below; structural validation builds
/// a petgraph DiGraph from the node set and checks the persisted-payload
/// invariants before a snapshot leaves the process.

use crate::flow::allocator::NodeIdAllocator;
use crate::flow::types::{
    Connection, ContextMode, FlowNode, FlowSnapshot, NodeConfig, SnapshotEdge, TriggerConfig,
    TriggerVariant,
};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

/// Structural violations reported by `FlowGraph::validate`
#[derive(Debug, Clone, thiserror::Error)]
pub enum GraphError {
    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("duplicate node id: {0}")]
    DuplicateNodeId(String),

    #[error("connection from '{from}' references unknown node '{target}'")]
    DanglingConnection { from: String, target: String },

    #[error("trigger on '{from}' references unknown downstream node '{target}'")]
    DanglingTrigger { from: String, target: String },

    #[error("node '{0}' references itself")]
    SelfReference(String),

    #[error("node '{0}' declares a variable with an empty name")]
    EmptyVariableName(String),

    #[error("node '{node_id}' declares variable '{name}' more than once")]
    DuplicateVariable { node_id: String, name: String },
}

/// Partial node configuration for merge-style updates
///
/// `None` fields leave the existing value untouched; `Some` fields replace it
/// wholesale. Identity is never part of an update.
#[derive(Debug, Clone, Default)]
pub struct NodeUpdate {
    pub label: Option<String>,
    pub description: Option<Option<String>>,
    pub asset_id: Option<Option<String>>,
    pub component: Option<Option<crate::flow::types::ComponentBinding>>,
    pub upstream_capabilities: Option<Vec<String>>,
    pub context_mode: Option<ContextMode>,
    pub variables: Option<Vec<crate::flow::types::ContextVariable>>,
}

/// The editable workflow graph
#[derive(Debug, Default, Clone)]
pub struct FlowGraph {
    nodes: Vec<FlowNode>,
    allocator: NodeIdAllocator,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a graph from a persisted snapshot
    ///
    /// The allocator is reset and reseeded from the loaded node ids so that
    /// subsequent `create_node` calls never collide with persisted ids.
    /// Snapshot edges are folded back into the per-node connection lists;
    /// edges whose source node is missing from the snapshot are dropped with
    /// a warning.
    pub fn from_snapshot(snapshot: FlowSnapshot) -> Self {
        let mut nodes = snapshot.nodes;
        let mut by_id: HashMap<String, usize> = HashMap::new();
        for (idx, node) in nodes.iter_mut().enumerate() {
            // Inline connections are not part of the payload format; the edge
            // list is authoritative.
            node.config.connections.clear();
            by_id.insert(node.id.clone(), idx);
        }

        for edge in snapshot.connections {
            match by_id.get(&edge.source_node_id) {
                Some(&idx) => nodes[idx].config.connections.push(Connection {
                    target_node_id: edge.target_node_id,
                    logic_description: edge.logic_description,
                }),
                None => tracing::warn!(
                    source = %edge.source_node_id,
                    target = %edge.target_node_id,
                    "dropping connection from unknown node"
                ),
            }
        }

        let mut allocator = NodeIdAllocator::new();
        allocator.reset();
        allocator.load_from_nodes(nodes.iter().map(|n| n.id.clone()));

        Self { nodes, allocator }
    }

    /// Serialize the graph into its persisted `{nodes, connections}` form
    ///
    /// Per-node connection lists are flattened into the edge set. Variables on
    /// `Full`-mode nodes stay behind in memory; they are only serialized while
    /// the node is in `Incremental` mode.
    pub fn snapshot(&self) -> FlowSnapshot {
        let mut connections = Vec::new();
        let nodes = self
            .nodes
            .iter()
            .map(|node| {
                for conn in &node.config.connections {
                    connections.push(SnapshotEdge {
                        source_node_id: node.id.clone(),
                        target_node_id: conn.target_node_id.clone(),
                        logic_description: conn.logic_description.clone(),
                    });
                }
                let mut config = node.config.clone();
                config.connections = Vec::new();
                if config.context_mode == ContextMode::Full {
                    config.variables = Vec::new();
                }
                FlowNode {
                    id: node.id.clone(),
                    config,
                }
            })
            .collect();

        FlowSnapshot { nodes, connections }
    }

    /// Create a node from the given configuration, allocating its identifier
    pub fn create_node(&mut self, config: NodeConfig) -> String {
        let id = self.allocator.generate_id();
        self.nodes.push(FlowNode {
            id: id.clone(),
            config,
        });
        id
    }

    /// Merge fields into an existing node; identity is untouched
    pub fn update_node(&mut self, id: &str, update: NodeUpdate) -> Result<(), GraphError> {
        let node = self.node_mut(id)?;
        let config = &mut node.config;
        if let Some(label) = update.label {
            config.label = label;
        }
        if let Some(description) = update.description {
            config.description = description;
        }
        if let Some(asset_id) = update.asset_id {
            config.asset_id = asset_id;
        }
        if let Some(component) = update.component {
            config.component = component;
        }
        if let Some(capabilities) = update.upstream_capabilities {
            config.upstream_capabilities = capabilities;
        }
        if let Some(mode) = update.context_mode {
            // Switching to Full keeps previously recorded variables; they are
            // simply not serialized while the mode is inactive.
            config.context_mode = mode;
        }
        if let Some(variables) = update.variables {
            config.variables = variables;
        }
        Ok(())
    }

    /// Remove a node and release its identifier
    ///
    /// Connections and trigger references held by other nodes are left as-is;
    /// `validate` reports them as dangling until the caller repairs them.
    pub fn delete_node(&mut self, id: &str) -> Result<FlowNode, GraphError> {
        let idx = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        let node = self.nodes.remove(idx);
        self.allocator.release_id(id);
        Ok(node)
    }

    /// Replace a node's outgoing connection list wholesale
    ///
    /// Self-targets are not rejected here; the editor may hold transiently
    /// invalid state. `validate` is the hard gate before persistence.
    pub fn set_connections(
        &mut self,
        id: &str,
        connections: Vec<Connection>,
    ) -> Result<(), GraphError> {
        self.node_mut(id)?.config.connections = connections;
        Ok(())
    }

    /// Replace a node's trigger configuration wholesale
    pub fn set_trigger_config(
        &mut self,
        id: &str,
        trigger: Option<TriggerConfig>,
    ) -> Result<(), GraphError> {
        self.node_mut(id)?.config.trigger = trigger;
        Ok(())
    }

    /// Switch the active trigger variant on a node
    ///
    /// Keeps the downstream node list, discards the previous variant's fields
    /// and reinitializes the new variant to neutral defaults. A node without a
    /// trigger gets a fresh neutral one with an empty downstream list.
    pub fn switch_trigger_variant(
        &mut self,
        id: &str,
        kind: TriggerVariant,
    ) -> Result<(), GraphError> {
        let node = self.node_mut(id)?;
        match node.config.trigger.as_mut() {
            Some(trigger) => trigger.switch_variant(kind),
            None => {
                node.config.trigger = Some(TriggerConfig {
                    condition: crate::flow::types::TriggerCondition::neutral(kind),
                    downstream_node_ids: Vec::new(),
                });
            }
        }
        Ok(())
    }

    pub fn node(&self, id: &str) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn nodes(&self) -> &[FlowNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node_mut(&mut self, id: &str) -> Result<&mut FlowNode, GraphError> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
    }

    /// Validate the structural invariants of the graph
    ///
    /// Builds a petgraph DiGraph over the node set while checking:
    /// - node ids are unique,
    /// - every connection and trigger downstream id targets an existing node,
    /// - no node references itself,
    /// - per-node variable names are non-empty and unique.
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let mut id_to_index: HashMap<&str, NodeIndex> = HashMap::new();

        for node in &self.nodes {
            if id_to_index.contains_key(node.id.as_str()) {
                return Err(GraphError::DuplicateNodeId(node.id.clone()));
            }
            let index = graph.add_node(node.id.as_str());
            id_to_index.insert(node.id.as_str(), index);
        }

        for node in &self.nodes {
            let source = id_to_index[node.id.as_str()];

            for conn in &node.config.connections {
                if conn.target_node_id == node.id {
                    return Err(GraphError::SelfReference(node.id.clone()));
                }
                let target = id_to_index
                    .get(conn.target_node_id.as_str())
                    .ok_or_else(|| GraphError::DanglingConnection {
                        from: node.id.clone(),
                        target: conn.target_node_id.clone(),
                    })?;
                graph.add_edge(source, *target, ());
            }

            if let Some(trigger) = &node.config.trigger {
                for downstream in &trigger.downstream_node_ids {
                    if *downstream == node.id {
                        return Err(GraphError::SelfReference(node.id.clone()));
                    }
                    let target = id_to_index.get(downstream.as_str()).ok_or_else(|| {
                        GraphError::DanglingTrigger {
                            from: node.id.clone(),
                            target: downstream.clone(),
                        }
                    })?;
                    graph.add_edge(source, *target, ());
                }
            }

            let mut seen = HashSet::new();
            for variable in &node.config.variables {
                if variable.name.is_empty() {
                    return Err(GraphError::EmptyVariableName(node.id.clone()));
                }
                if !seen.insert(variable.name.as_str()) {
                    return Err(GraphError::DuplicateVariable {
                        node_id: node.id.clone(),
                        name: variable.name.clone(),
                    });
                }
            }
        }

        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "graph validated"
        );
        Ok(())
    }
}
