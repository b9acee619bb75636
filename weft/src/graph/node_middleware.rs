//! Node middleware: wrap node.run with external async logic (around pattern).
//!
//! Set via `StateGraph::with_middleware`.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::error::AgentError;

use super::GraphState;

/// Boxed future returned by the wrapped node call.
pub type NodeFuture<U> = Pin<Box<dyn Future<Output = Result<U, AgentError>> + Send>>;

/// The wrapped node call handed to middleware; must be called to execute the node.
pub type NodeRunFn<S> = Box<dyn FnOnce(S) -> NodeFuture<<S as GraphState>::Update> + Send>;

/// Async middleware that wraps node.run.
///
/// Can decide when to call `inner`, inspect or replace its result, time it, etc.
#[async_trait]
pub trait NodeMiddleware<S>: Send + Sync
where
    S: GraphState,
{
    /// - `node_id`: current node id
    /// - `state`: state snapshot passed to the node
    /// - `inner`: actual node.run logic
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        inner: NodeRunFn<S>,
    ) -> Result<S::Update, AgentError>;
}
