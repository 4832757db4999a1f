//! Structural validation of workflow graphs.
//!
//! Rules run in a fixed order and the first failure wins. Validation gates
//! persistence: the authoring surface refuses to save a graph that fails
//! here. The executor does not call the validator; it only behaves safely
//! when handed an invalid graph.
//!
//! Known gaps, kept deliberately: the validator does not detect cycles,
//! unreachable middle nodes, or disconnected components beyond the
//! no-connections rule. The executor's step bound is the backstop for
//! cyclic graphs.

use crate::error::ValidationError;
use crate::graph::WorkflowGraph;
use crate::node::NodeKind;

/// The message returned for a graph that passes every rule.
pub const VALID_MESSAGE: &str = "Workflow is valid.";

/// Outcome of workflow validation, as surfaced to authoring clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// Whether the graph passed all rules.
    pub valid: bool,
    /// Human-readable detail: the first failing rule's message, or
    /// [`VALID_MESSAGE`].
    pub message: String,
}

/// Validates a graph, returning the boolean/message pair the authoring
/// surface reports to its client.
#[must_use]
pub fn validate(graph: &WorkflowGraph) -> ValidationOutcome {
    match check(graph) {
        Ok(()) => ValidationOutcome {
            valid: true,
            message: VALID_MESSAGE.to_owned(),
        },
        Err(error) => ValidationOutcome {
            valid: false,
            message: error.to_string(),
        },
    }
}

/// Validates a graph, returning the first rule violation as a typed error.
pub fn check(graph: &WorkflowGraph) -> Result<(), ValidationError> {
    if graph.nodes().is_empty() {
        return Err(ValidationError::EmptyWorkflow);
    }

    let entries = graph.entry_nodes();
    if entries.len() != 1 {
        return Err(ValidationError::StartNodeCount {
            found: entries.len(),
        });
    }

    if entries[0].kind != NodeKind::UserQuery {
        return Err(ValidationError::StartNotUserQuery);
    }

    if graph.node_count() > 1 && graph.edges().is_empty() {
        return Err(ValidationError::NoConnections);
    }

    let has_terminal_output = graph
        .nodes()
        .iter()
        .any(|n| n.kind == NodeKind::Output && !graph.has_outgoing(&n.id));
    if !has_terminal_output {
        return Err(ValidationError::MissingOutputNode);
    }

    for (index, edge) in graph.edges().iter().enumerate() {
        for node_id in [&edge.source, &edge.target] {
            if graph.node(node_id).is_none() {
                return Err(ValidationError::DanglingEdge {
                    index,
                    node_id: node_id.clone(),
                });
            }
        }
    }

    Ok(())
}
