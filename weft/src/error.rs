//! Graph execution error types.
//!
//! Returned by `Node::run` and the compiled graph's run loop. Failures of external
//! collaborators (model provider, tools) are converted into messages inside the nodes
//! and never surface here; these variants describe the run itself going wrong.

use thiserror::Error;

/// Graph execution error.
///
/// Returned by `Node::run` and `CompiledStateGraph::invoke` when a step cannot
/// complete, the run was cancelled, or the step ceiling was reached.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Execution failed with a message (e.g. a node hit a bug or a missing node id).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The run's cancellation token fired; the step in progress (if any) was abandoned.
    #[error("run cancelled")]
    Cancelled,

    /// The graph executed `limit` node steps without reaching END.
    #[error("recursion limit of {limit} node steps reached without reaching END")]
    RecursionLimit { limit: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Display format of ExecutionFailed contains "execution failed" and the message.
    #[test]
    fn agent_error_display_execution_failed() {
        let err = AgentError::ExecutionFailed("msg".to_string());
        let s = err.to_string();
        assert!(
            s.contains("execution failed"),
            "Display should contain 'execution failed': {}",
            s
        );
        assert!(s.contains("msg"), "Display should contain message: {}", s);
    }

    /// **Scenario**: RecursionLimit reports the configured limit.
    #[test]
    fn agent_error_display_recursion_limit() {
        let err = AgentError::RecursionLimit { limit: 7 };
        let s = err.to_string();
        assert!(s.contains('7'), "Display should contain the limit: {}", s);
        assert!(s.contains("recursion limit"), "{}", s);
    }
}
