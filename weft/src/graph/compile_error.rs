//! Graph compilation error.
//!
//! Returned by `StateGraph::compile` when edges reference unknown nodes or the
//! graph has no usable entry or exit.

use thiserror::Error;

/// Error when compiling a state graph (e.g. edge references unknown node).
///
/// Cycles are allowed (the agent loop is one); a graph only needs a single entry
/// edge, some way to reach END, and exactly one way out of every node.
#[derive(Debug, Error)]
pub enum CompilationError {
    /// A node id in an edge was not registered via `add_node` (and is not START/END).
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// No edge has from_id == START.
    #[error("graph must have exactly one edge from START")]
    MissingStart,

    /// More than one edge leaves START.
    #[error("graph must have exactly one edge from START, found {0}")]
    MultipleStart(usize),

    /// Nothing (edge or conditional path map) leads to END.
    #[error("graph has no path to END")]
    MissingEnd,

    /// A node has two plain outgoing edges.
    #[error("node has more than one outgoing edge: {0}")]
    DuplicateEdge(String),

    /// A node has both an outgoing edge and conditional edges; it must have exactly one.
    #[error("node has both edge and conditional edges: {0}")]
    NodeHasBothEdgeAndConditional(String),

    /// A value in a conditional path_map is not a valid node id or END.
    #[error("conditional path_map invalid target: {0}")]
    InvalidConditionalPathMap(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Display of NodeNotFound contains "node not found" and the node id.
    #[test]
    fn compilation_error_display_node_not_found() {
        let s = CompilationError::NodeNotFound("x".to_string()).to_string();
        assert!(s.contains("node not found"), "{}", s);
        assert!(s.contains('x'), "{}", s);
    }

    /// **Scenario**: Display of MissingStart / MissingEnd mention START / END.
    #[test]
    fn compilation_error_display_start_end() {
        let s = CompilationError::MissingStart.to_string();
        assert!(s.contains("START"), "{}", s);
        let s = CompilationError::MissingEnd.to_string();
        assert!(s.contains("END"), "{}", s);
        let s = CompilationError::MultipleStart(2).to_string();
        assert!(s.contains('2'), "{}", s);
    }
}
