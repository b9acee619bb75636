//! Logging middleware that prints node enter/exit around each node.run call.
//!
//! Used by the CLI's `--verbose` flag through `ReactConfig::verbose`.

use std::marker::PhantomData;
use std::time::Instant;

use async_trait::async_trait;

use crate::error::AgentError;

use super::{GraphState, NodeMiddleware, NodeRunFn};

/// Middleware that logs node enter/exit around each node.run call.
///
/// Logs to stderr so that normal output (the assistant reply) can be redirected
/// separately. Only the node id and elapsed time are printed.
pub struct LoggingNodeMiddleware<S> {
    _phantom: PhantomData<fn() -> S>,
}

impl<S> Default for LoggingNodeMiddleware<S> {
    fn default() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<S> NodeMiddleware<S> for LoggingNodeMiddleware<S>
where
    S: GraphState,
{
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        inner: NodeRunFn<S>,
    ) -> Result<S::Update, AgentError> {
        eprintln!("[node] enter node={}", node_id);
        let started = Instant::now();
        let result = inner(state).await;
        let ms = started.elapsed().as_millis();
        match &result {
            Ok(_) => eprintln!("[node] exit node={} elapsed_ms={}", node_id, ms),
            Err(e) => eprintln!("[node] exit node={} elapsed_ms={} error={}", node_id, ms, e),
        }
        result
    }
}
