//! Graph node trait: one step in a StateGraph.
//!
//! Receives a borrowed state `S`, returns the delta `S::Update` to merge. Used by
//! `StateGraph` and `CompiledStateGraph`. Routing is decided by edges, not by nodes.

use async_trait::async_trait;

use crate::error::AgentError;

use super::{GraphState, RunContext};

/// One step in a graph: state in, delta out.
///
/// **Interaction**: Implemented by `ModelNode` and `ToolNode`; registered with
/// `StateGraph::add_node` and driven by `CompiledStateGraph::invoke`.
#[async_trait]
pub trait Node<S>: Send + Sync
where
    S: GraphState,
{
    /// Node id (e.g. `"agent"`, `"tools"`). Must be unique within a graph.
    fn id(&self) -> &str;

    /// One step: read the state, return the update to apply.
    async fn run(&self, state: &S) -> Result<S::Update, AgentError>;

    /// Variant with run context (streaming, cancellation).
    ///
    /// Default implementation calls `run` and ignores the context.
    async fn run_with_context(
        &self,
        state: &S,
        _ctx: &RunContext<S>,
    ) -> Result<S::Update, AgentError> {
        self.run(state).await
    }
}
