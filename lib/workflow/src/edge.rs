//! Directed connections between workflow nodes.

use serde::{Deserialize, Serialize};

/// A directed edge from one node's output to another node's input.
///
/// Edges are kept in the order the authoring client persisted them; the
/// executor follows the first edge whose source matches the current node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Id of the node this edge leaves.
    pub source: String,
    /// Id of the node this edge enters.
    pub target: String,
}

impl Edge {
    /// Creates a new edge.
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}
