/// Core graph model type definitions
///
/// Defines the structures for workflow nodes, their configuration, directed
/// connections and trigger conditions. Node configuration serializes in
/// camelCase (the editor wire format); persistence envelopes around it use
/// snake_case.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a node propagates accumulated context to its downstream nodes
///
/// `Full` forwards the entire accumulated context; `Incremental` forwards only
/// the explicitly declared context variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextMode {
    #[default]
    Full,
    Incremental,
}

/// Declared type tag for a context variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

/// A named context variable declared on a node
///
/// Names must be non-empty and unique within the owning node. Uniqueness is
/// not structural; `FlowGraph::validate` checks it at write time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextVariable {
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: VariableType,
    /// Default value forwarded when no upstream value is bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Directed edge from the owning node to `target_node_id`
///
/// The logic description is the human-readable rationale for taking this
/// transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub target_node_id: String,
    #[serde(default)]
    pub logic_description: String,
}

/// A single named input parameter passed to a bound tool component
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentParam {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Reference to a tool component plus its ordered input parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentBinding {
    pub component_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_params: Vec<ComponentParam>,
}

/// Boolean gate kinds for gate-style trigger conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateKind {
    #[default]
    And,
    Nand,
    Or,
    Nor,
    Xor,
    Xnor,
}

/// Comparison operators for variable-equality trigger conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompareOp {
    #[default]
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
}

/// Variable-equality condition: compare a declared variable against a literal
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableEquality {
    pub variable_name: String,
    #[serde(default)]
    pub operator: CompareOp,
    #[serde(default)]
    pub compare_value: String,
}

/// The condition half of a trigger configuration
///
/// Exactly one variant is active. The wire format is internally tagged:
/// `{"type": "gate", "logicGate": "AND"}` or
/// `{"type": "variableEquality", "variableEquality": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TriggerCondition {
    Gate {
        #[serde(rename = "logicGate", default)]
        logic_gate: GateKind,
    },
    VariableEquality {
        #[serde(rename = "variableEquality", default)]
        variable_equality: VariableEquality,
    },
}

impl TriggerCondition {
    /// Neutral default for a freshly selected variant
    pub fn neutral(kind: TriggerVariant) -> Self {
        match kind {
            TriggerVariant::Gate => TriggerCondition::Gate {
                logic_gate: GateKind::And,
            },
            TriggerVariant::VariableEquality => TriggerCondition::VariableEquality {
                variable_equality: VariableEquality::default(),
            },
        }
    }

    pub fn variant(&self) -> TriggerVariant {
        match self {
            TriggerCondition::Gate { .. } => TriggerVariant::Gate,
            TriggerCondition::VariableEquality { .. } => TriggerVariant::VariableEquality,
        }
    }
}

/// Discriminant used when switching a trigger configuration between variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerVariant {
    Gate,
    VariableEquality,
}

/// Trigger configuration: a condition paired with the downstream nodes it fires
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerConfig {
    #[serde(flatten)]
    pub condition: TriggerCondition,
    #[serde(default)]
    pub downstream_node_ids: Vec<String>,
}

impl TriggerConfig {
    pub fn gate(kind: GateKind, downstream: Vec<String>) -> Self {
        Self {
            condition: TriggerCondition::Gate { logic_gate: kind },
            downstream_node_ids: downstream,
        }
    }

    /// Switch the active variant in place
    ///
    /// The downstream node list survives the switch; the previous variant's
    /// fields are discarded and the new variant starts from its neutral
    /// defaults. Switching to the already-active variant is a no-op.
    pub fn switch_variant(&mut self, kind: TriggerVariant) {
        if self.condition.variant() != kind {
            self.condition = TriggerCondition::neutral(kind);
        }
    }
}

/// A node in the workflow graph: stable identifier plus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: String,
    #[serde(flatten)]
    pub config: NodeConfig,
}

/// Everything about a node except its identity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    /// Display label, required at save time
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Opaque reference into the asset catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    /// Optional bound tool component with its input parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentBinding>,
    /// Human-readable statements of what this node offers to upstream callers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub upstream_capabilities: Vec<String>,
    #[serde(default)]
    pub context_mode: ContextMode,
    /// Context variables; forwarded downstream only under `Incremental`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<ContextVariable>,
    /// Outgoing connections owned by this node
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<Connection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<TriggerConfig>,
}

/// Flattened directed edge as it appears in persisted payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEdge {
    pub source_node_id: String,
    pub target_node_id: String,
    #[serde(default)]
    pub logic_description: String,
}

/// Persisted form of a graph: `{nodes, connections}`
///
/// Connections are flattened out of the per-node lists so the payload carries
/// an explicit edge set; `FlowGraph::from_snapshot` folds them back in.
/// Variables of `Full`-mode nodes are omitted here while staying on the
/// in-memory node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowSnapshot {
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub connections: Vec<SnapshotEdge>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_wire_format_is_internally_tagged() {
        let gate = TriggerConfig::gate(GateKind::Nor, vec!["node-2".into()]);
        let json = serde_json::to_value(&gate).expect("serialize");
        assert_eq!(json["type"], "gate");
        assert_eq!(json["logicGate"], "NOR");
        assert_eq!(json["downstreamNodeIds"][0], "node-2");

        let back: TriggerConfig = serde_json::from_value(json).expect("deserialize");
        assert!(matches!(
            back.condition,
            TriggerCondition::Gate {
                logic_gate: GateKind::Nor
            }
        ));
    }

    #[test]
    fn switch_variant_keeps_downstream_and_resets_fields() {
        let mut config = TriggerConfig {
            condition: TriggerCondition::VariableEquality {
                variable_equality: VariableEquality {
                    variable_name: "score".into(),
                    operator: CompareOp::GreaterThan,
                    compare_value: "70".into(),
                },
            },
            downstream_node_ids: vec!["node-4".into(), "node-5".into()],
        };

        config.switch_variant(TriggerVariant::Gate);
        assert_eq!(config.downstream_node_ids, vec!["node-4", "node-5"]);
        match config.condition {
            TriggerCondition::Gate { logic_gate } => assert_eq!(logic_gate, GateKind::And),
            ref other => panic!("expected gate variant, got {other:?}"),
        }

        // And back: equality fields start from neutral defaults, not the old ones.
        config.switch_variant(TriggerVariant::VariableEquality);
        match config.condition {
            TriggerCondition::VariableEquality {
                ref variable_equality,
            } => {
                assert!(variable_equality.variable_name.is_empty());
                assert_eq!(variable_equality.operator, CompareOp::Equals);
                assert!(variable_equality.compare_value.is_empty());
            }
            ref other => panic!("expected equality variant, got {other:?}"),
        }
    }

    #[test]
    fn switch_to_active_variant_is_a_noop() {
        let mut config = TriggerConfig::gate(GateKind::Xor, vec![]);
        config.switch_variant(TriggerVariant::Gate);
        assert!(matches!(
            config.condition,
            TriggerCondition::Gate {
                logic_gate: GateKind::Xor
            }
        ));
    }

    #[test]
    fn node_config_serializes_camel_case() {
        let node = FlowNode {
            id: "node-1".into(),
            config: NodeConfig {
                label: "Grade".into(),
                context_mode: ContextMode::Incremental,
                variables: vec![ContextVariable {
                    name: "score".into(),
                    var_type: VariableType::Number,
                    value: None,
                    description: None,
                }],
                connections: vec![Connection {
                    target_node_id: "node-2".into(),
                    logic_description: "passing grade".into(),
                }],
                ..Default::default()
            },
        };
        let json = serde_json::to_value(&node).expect("serialize");
        assert_eq!(json["contextMode"], "incremental");
        assert_eq!(json["variables"][0]["type"], "number");
        assert_eq!(json["connections"][0]["targetNodeId"], "node-2");
        assert_eq!(json["connections"][0]["logicDescription"], "passing grade");
    }
}
