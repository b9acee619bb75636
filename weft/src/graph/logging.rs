//! Logging utilities for graph execution.
//!
//! Structured `tracing` events for graph start/complete/error, node execution,
//! state updates and routing decisions.

use std::fmt::Debug;

/// Log node execution start.
pub fn log_node_start(node_id: &str, step: usize) {
    tracing::debug!(node_id = node_id, step, "Starting node execution");
}

/// Log the state a node is about to read (trace level; states can be large).
pub fn log_node_state<S: Debug>(node_id: &str, state: &S) {
    tracing::trace!(node_id = node_id, state = ?state, "Node execution: state");
}

/// Log node execution completion with the produced update.
pub fn log_node_complete<U: Debug>(node_id: &str, update: &U) {
    tracing::debug!(node_id = node_id, "Node execution complete");
    tracing::trace!(node_id = node_id, update = ?update, "Node update");
}

/// Log state update.
pub fn log_state_update(node_id: &str) {
    tracing::debug!(node_id = node_id, "State updated");
}

/// Log the routing decision taken after a node.
pub fn log_route(from: &str, to: &str) {
    tracing::debug!(from = %from, to = %to, "routing");
}

/// Log graph execution start.
pub fn log_graph_start(recursion_limit: usize) {
    tracing::info!(recursion_limit, "Starting graph execution");
}

/// Log graph execution completion.
pub fn log_graph_complete(steps: usize) {
    tracing::info!(steps, "Graph execution complete");
}

/// Log graph execution error.
pub fn log_graph_error(error: &crate::error::AgentError) {
    match error {
        crate::error::AgentError::Cancelled => tracing::warn!("Graph execution cancelled"),
        _ => tracing::error!(?error, "Graph execution error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_functions() {
        log_node_start("test_node", 1);
        log_node_state("test_node", &());
        log_node_complete("test_node", &vec![1, 2]);
        log_state_update("test_node");
        log_route("a", "b");
        log_graph_start(5);
        log_graph_complete(3);
        log_graph_error(&crate::error::AgentError::ExecutionFailed(
            "test".to_string(),
        ));
        log_graph_error(&crate::error::AgentError::Cancelled);
    }
}
