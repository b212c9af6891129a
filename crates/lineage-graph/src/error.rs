//! Error types for lineage graph construction.
//!
//! Only strict construction ([`LineageGraph::from_parts`](crate::LineageGraph::from_parts))
//! fails. Normalization of backend data, filtering, layout and traversal
//! degrade gracefully and never return errors.

use crate::model::{EdgeId, NodeId};
use thiserror::Error;

/// Result type for lineage graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Structural defects in a lineage graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Two nodes share an id
    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),

    /// Two edges share an id
    #[error("duplicate edge id: {0}")]
    DuplicateEdge(EdgeId),

    /// A node references a parent that is not in the graph
    #[error("node {node} references unknown parent {parent}")]
    UnknownParent {
        /// The child node
        node: NodeId,
        /// The missing parent
        parent: NodeId,
    },

    /// Following parent links from this node loops back to it
    #[error("parent links of node {0} form a cycle")]
    ParentCycle(NodeId),

    /// An edge endpoint is not in the graph
    #[error("edge {edge} references unknown node {node}")]
    DanglingEdge {
        /// The offending edge
        edge: EdgeId,
        /// The missing endpoint
        node: NodeId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_ids() {
        let err = Error::UnknownParent {
            node: NodeId::new("orders"),
            parent: NodeId::new("pkg-1"),
        };
        let message = err.to_string();
        assert!(message.contains("orders"));
        assert!(message.contains("pkg-1"));
    }
}
