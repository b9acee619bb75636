//! Run context passed into nodes: stream sender, stream modes, cancellation and step ceiling.

use std::collections::HashSet;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::stream::{StreamEvent, StreamMode};

use super::GraphState;

/// Default maximum number of node executions in one run.
pub const DEFAULT_RECURSION_LIMIT: usize = 25;

/// Per-run execution context.
///
/// Built by the caller (usually `ReactRunner`) for one run and passed by reference
/// to every node. Cloning is cheap: the sender and token are handles.
#[derive(Clone)]
pub struct RunContext<S>
where
    S: GraphState,
{
    /// Optional sender for streaming events.
    pub stream_tx: Option<mpsc::Sender<StreamEvent<S>>>,
    /// Enabled stream modes.
    pub stream_mode: HashSet<StreamMode>,
    /// Cooperative cancellation; checked before every step and raced against the running node.
    pub cancel: CancellationToken,
    /// Maximum node executions before the run fails with `AgentError::RecursionLimit`.
    pub recursion_limit: usize,
}

impl<S> Default for RunContext<S>
where
    S: GraphState,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> RunContext<S>
where
    S: GraphState,
{
    pub fn new() -> Self {
        Self {
            stream_tx: None,
            stream_mode: HashSet::new(),
            cancel: CancellationToken::new(),
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Attaches a stream sender and the modes to emit.
    pub fn with_stream(
        mut self,
        tx: mpsc::Sender<StreamEvent<S>>,
        modes: impl IntoIterator<Item = StreamMode>,
    ) -> Self {
        self.stream_tx = Some(tx);
        self.stream_mode = modes.into_iter().collect();
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Sends `event` if a stream is attached and `mode` is enabled. A dropped receiver is ignored.
    pub async fn emit(&self, mode: StreamMode, event: StreamEvent<S>) {
        if let Some(tx) = &self.stream_tx {
            if self.stream_mode.contains(&mode) {
                let _ = tx.send(event).await;
            }
        }
    }
}
