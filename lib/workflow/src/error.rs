//! Error types for the workflow crate.
//!
//! Three distinct failure families, matching how each is surfaced:
//! - [`ValidationError`]: structural invariant failures, returned as values
//!   with exact caller-visible messages; they block persistence, never panic.
//! - [`ExecutionError`]: conditions that stop a walk before it can finish.
//!   The display text is what a chat caller receives as the answer.
//! - [`CollaboratorError`]: an opaque failure from a retrieval, model, or
//!   search collaborator. Absorbed by the executor into degraded text and
//!   logged; never propagated to the chat caller.

use std::fmt;

/// A structural validation failure.
///
/// Display strings are part of the authoring client's contract and must not
/// be reworded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The graph has no nodes.
    EmptyWorkflow,
    /// The number of nodes without incoming edges is not exactly one.
    StartNodeCount {
        /// How many entry candidates were found.
        found: usize,
    },
    /// The unique entry node is not a user-query node.
    StartNotUserQuery,
    /// Multiple nodes but no edges at all.
    NoConnections,
    /// No output node without an outgoing edge.
    MissingOutputNode,
    /// An edge references a node id that does not exist in the graph.
    DanglingEdge {
        /// Position of the offending edge in the persisted sequence.
        index: usize,
        /// The unknown node id.
        node_id: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyWorkflow => write!(f, "Workflow cannot be empty."),
            Self::StartNodeCount { found } => {
                write!(
                    f,
                    "Workflow must have exactly one starting point. Found {found}."
                )
            }
            Self::StartNotUserQuery => {
                write!(f, "The starting node must be a 'User Query' node.")
            }
            Self::NoConnections => {
                write!(f, "There are multiple nodes but no connections.")
            }
            Self::MissingOutputNode => {
                write!(f, "Workflow must have at least one Output node.")
            }
            Self::DanglingEdge { index, node_id } => {
                write!(f, "Edge {index} references unknown node '{node_id}'.")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors that stop an execution.
///
/// Collaborator failures are deliberately *not* represented here; they are
/// absorbed into fallback payload text so a chat request always receives an
/// answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// No user-query node without incoming edges exists.
    MissingStartNode,
    /// The walk revisited nodes past the step bound, indicating a cycle.
    StepLimitExceeded {
        /// The bound that was exceeded (the graph's node count).
        limit: usize,
    },
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStartNode => {
                write!(f, "Error: A 'UserQuery' node must be the start of the workflow.")
            }
            Self::StepLimitExceeded { limit } => {
                write!(
                    f,
                    "Error: Workflow execution stopped after {limit} steps; the graph appears to contain a cycle."
                )
            }
        }
    }
}

impl std::error::Error for ExecutionError {}

/// An opaque failure reported by a collaborator.
///
/// Carries only a human-readable reason; the executor logs it and substitutes
/// degraded text, so nothing downstream inspects its structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollaboratorError {
    reason: String,
}

impl CollaboratorError {
    /// Creates a collaborator error with the given reason.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// The failure reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for CollaboratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

impl std::error::Error for CollaboratorError {}
