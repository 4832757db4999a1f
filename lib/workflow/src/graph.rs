//! The workflow graph model.
//!
//! A graph is parsed fresh from persisted configuration at the start of each
//! validate or execute call and is immutable for the duration of that call.
//! The serialized shape is exactly what the graph-authoring client persists:
//!
//! ```json
//! {
//!   "nodes": [{"id": "...", "type": "...", "data": {...}}, ...],
//!   "edges": [{"source": "...", "target": "..."}, ...]
//! }
//! ```
//!
//! Node and edge order are meaningful and preserved: the start-node search
//! visits nodes in persisted order, and the executor follows the first
//! matching edge in persisted order.

use crate::edge::Edge;
use crate::node::{Node, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A directed graph of typed processing nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    edges: Vec<Edge>,
}

impl WorkflowGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node, returning the graph for chaining.
    #[must_use]
    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Appends an edge, returning the graph for chaining.
    #[must_use]
    pub fn with_edge(mut self, edge: Edge) -> Self {
        self.edges.push(edge);
        self
    }

    /// Appends a node.
    pub fn add_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    /// Appends an edge.
    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    /// All nodes in persisted order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All edges in persisted order.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// The number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the first node with the given id, if any.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// The set of node ids that appear as some edge's target.
    ///
    /// Dangling targets are included; the start-node computation mirrors the
    /// raw persisted edge list, not a cleaned-up view of it.
    #[must_use]
    pub fn target_ids(&self) -> HashSet<&str> {
        self.edges.iter().map(|e| e.target.as_str()).collect()
    }

    /// Nodes with no incoming edge, in persisted order.
    #[must_use]
    pub fn entry_nodes(&self) -> Vec<&Node> {
        let targets = self.target_ids();
        self.nodes
            .iter()
            .filter(|n| !targets.contains(n.id.as_str()))
            .collect()
    }

    /// The execution start node: the first [`NodeKind::UserQuery`] node with
    /// no incoming edge, in persisted order.
    #[must_use]
    pub fn start_node(&self) -> Option<&Node> {
        let targets = self.target_ids();
        self.nodes
            .iter()
            .find(|n| n.kind == NodeKind::UserQuery && !targets.contains(n.id.as_str()))
    }

    /// The first outgoing edge of the given node, in persisted order.
    #[must_use]
    pub fn first_edge_from(&self, node_id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.source == node_id)
    }

    /// Whether the given node has any outgoing edge.
    #[must_use]
    pub fn has_outgoing(&self, node_id: &str) -> bool {
        self.first_edge_from(node_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn linear_graph() -> WorkflowGraph {
        WorkflowGraph::new()
            .with_node(Node::new("1", NodeKind::UserQuery))
            .with_node(Node::new("2", NodeKind::LlmEngine))
            .with_node(Node::new("3", NodeKind::Output))
            .with_edge(Edge::new("1", "2"))
            .with_edge(Edge::new("2", "3"))
    }

    #[test]
    fn entry_nodes_excludes_edge_targets() {
        let graph = linear_graph();
        let entries = graph.entry_nodes();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "1");
    }

    #[test]
    fn start_node_requires_user_query_kind() {
        let graph = WorkflowGraph::new()
            .with_node(Node::new("a", NodeKind::Output))
            .with_node(Node::new("b", NodeKind::UserQuery))
            .with_edge(Edge::new("b", "a"));
        // "b" is the only node that is both unreferenced and a user query.
        assert_eq!(graph.start_node().map(|n| n.id.as_str()), Some("b"));
    }

    #[test]
    fn start_node_absent_when_query_node_has_incoming_edge() {
        let graph = WorkflowGraph::new()
            .with_node(Node::new("a", NodeKind::UserQuery))
            .with_node(Node::new("b", NodeKind::Output))
            .with_edge(Edge::new("b", "a"));
        assert!(graph.start_node().is_none());
    }

    #[test]
    fn first_edge_from_respects_persisted_order() {
        let graph = WorkflowGraph::new()
            .with_node(Node::new("1", NodeKind::UserQuery))
            .with_node(Node::new("2", NodeKind::Output))
            .with_node(Node::new("3", NodeKind::Output))
            .with_edge(Edge::new("1", "3"))
            .with_edge(Edge::new("1", "2"));
        let edge = graph.first_edge_from("1").expect("edge");
        assert_eq!(edge.target, "3");
    }

    #[test]
    fn wire_shape_roundtrip() {
        let raw = json!({
            "nodes": [
                {"id": "1", "type": "userQuery", "data": {"label": "Query"}},
                {"id": "2", "type": "futureKind", "data": {}},
                {"id": "3", "type": "output"}
            ],
            "edges": [
                {"source": "1", "target": "2"},
                {"source": "2", "target": "3"}
            ]
        });
        let graph: WorkflowGraph = serde_json::from_value(raw.clone()).expect("deserialize");
        assert_eq!(graph.node_count(), 3);
        assert_eq!(
            graph.node("2").map(|n| n.kind.clone()),
            Some(NodeKind::Other("futureKind".to_string()))
        );
        assert_eq!(serde_json::to_value(&graph).expect("serialize"), raw);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let graph: WorkflowGraph = serde_json::from_value(json!({})).expect("deserialize");
        assert_eq!(graph.node_count(), 0);
        assert!(graph.edges().is_empty());
    }
}
