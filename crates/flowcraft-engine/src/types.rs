//! Core types for workflow graphs
//!
//! These types define the structure of workflow graphs as produced by
//! the canvas layer: nodes, edges, and per-node configuration.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unique identifier for a node
pub type NodeId = String;

/// Unique identifier for an edge
pub type EdgeId = String;

/// Canvas position of a node. Presentation-only; the engine ignores it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Visual status of a node as tracked by the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Idle,
    Running,
    Success,
    Error,
}

/// Per-node payload: label, type, status, and the config map edited
/// through the properties form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    /// Human-readable label shown on the canvas
    pub label: String,
    /// Node type (references a registry entry)
    #[serde(rename = "type")]
    pub node_type: String,
    /// Visual status, mutated by the canvas between runs
    #[serde(default)]
    pub status: NodeStatus,
    /// Type-specific configuration, shaped by the type's config schema
    #[serde(default)]
    pub config: Map<String, Value>,
}

impl NodeData {
    /// Create node data with an empty config
    pub fn new(label: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            node_type: node_type.into(),
            status: NodeStatus::Idle,
            config: Map::new(),
        }
    }

    /// Set the config map
    pub fn with_config(mut self, config: Map<String, Value>) -> Self {
        self.config = config;
        self
    }
}

/// A node instance in a graph
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    /// Unique identifier for this node instance
    pub id: NodeId,
    /// Node type (duplicated in `data.type` for the canvas layer)
    #[serde(rename = "type")]
    pub node_type: String,
    /// Position in the UI (ignored by the engine)
    #[serde(default)]
    pub position: Position,
    /// Label, status, and configuration
    pub data: NodeData,
}

impl GraphNode {
    /// Create a node with the given id and type and an empty config
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        let id = id.into();
        let node_type = node_type.into();
        Self {
            id: id.clone(),
            node_type: node_type.clone(),
            position: Position::default(),
            data: NodeData::new(id, node_type),
        }
    }

    /// Set the node's config map
    pub fn with_config(mut self, config: Map<String, Value>) -> Self {
        self.data.config = config;
        self
    }
}

/// An edge connecting two nodes: `target` depends on `source` having
/// executed first. Handles identify which port/branch on each side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    /// Unique identifier for this edge
    pub id: EdgeId,
    /// Source node ID
    pub source: NodeId,
    /// Target node ID
    pub target: NodeId,
    /// Source handle (e.g. an ifElse branch: "true" / "false")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    /// Target handle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

impl GraphEdge {
    /// Create an edge from `source` to `target`
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
        }
    }

    /// Set the source handle
    pub fn with_source_handle(mut self, handle: impl Into<String>) -> Self {
        self.source_handle = Some(handle.into());
        self
    }
}

/// Get edges coming into a node
pub fn incoming_edges<'a>(
    edges: &'a [GraphEdge],
    node_id: &'a str,
) -> impl Iterator<Item = &'a GraphEdge> + 'a {
    edges.iter().filter(move |e| e.target == node_id)
}

/// Get edges going out of a node
pub fn outgoing_edges<'a>(
    edges: &'a [GraphEdge],
    node_id: &'a str,
) -> impl Iterator<Item = &'a GraphEdge> + 'a {
    edges.iter().filter(move |e| e.source == node_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incoming_outgoing() {
        let edges = vec![
            GraphEdge::new("e1", "a", "b"),
            GraphEdge::new("e2", "b", "c"),
            GraphEdge::new("e3", "a", "c"),
        ];

        let incoming: Vec<_> = incoming_edges(&edges, "c").map(|e| e.id.as_str()).collect();
        assert_eq!(incoming, vec!["e2", "e3"]);

        let outgoing: Vec<_> = outgoing_edges(&edges, "a").map(|e| e.id.as_str()).collect();
        assert_eq!(outgoing, vec!["e1", "e3"]);
    }

    #[test]
    fn test_node_serialization_shape() {
        let node = GraphNode::new("llm-1", "llm");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "llm");
        assert_eq!(json["data"]["type"], "llm");
        assert_eq!(json["data"]["status"], "idle");
    }

    #[test]
    fn test_edge_handle_roundtrip() {
        let edge = GraphEdge::new("e1", "cond", "next").with_source_handle("true");
        let json = serde_json::to_string(&edge).unwrap();
        let back: GraphEdge = serde_json::from_str(&json).unwrap();
        assert_eq!(back.source_handle.as_deref(), Some("true"));
        assert!(back.target_handle.is_none());
    }
}
