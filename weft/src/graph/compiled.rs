//! Compiled state graph: immutable, runs nodes until END.
//!
//! Built by `StateGraph::compile`. Holds nodes, the entry node, the routing table
//! and optional middleware. One run loop serves `invoke`, `run_in_place` and
//! `stream`; it applies each node's update to the state, emits stream events,
//! enforces the run context's recursion limit and honours its cancellation token.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::AgentError;
use crate::stream::{StreamEvent, StreamMode};

use super::logging::{
    log_graph_complete, log_graph_error, log_graph_start, log_node_complete, log_node_start,
    log_node_state, log_route, log_state_update,
};
use super::node_middleware::{NodeFuture, NodeMiddleware};
use super::state_graph::END;
use super::{GraphState, NextEntry, Node, RunContext};

/// Compiled graph: immutable structure, supports invoke and stream.
///
/// Created by `StateGraph::compile()`. Runs from the first node; after each node,
/// the routing table (plain edge or conditional router) picks the next node.
#[derive(Clone)]
pub struct CompiledStateGraph<S>
where
    S: GraphState,
{
    pub(super) nodes: HashMap<String, Arc<dyn Node<S>>>,
    /// First node to run (target of the START edge).
    pub(super) first_node_id: String,
    /// Map from node id to how to get next. A node with no entry ends the run.
    pub(super) next_map: HashMap<String, NextEntry<S>>,
    pub(super) middleware: Option<Arc<dyn NodeMiddleware<S>>>,
}

impl<S> CompiledStateGraph<S>
where
    S: GraphState,
{
    /// Runs one node, through the middleware when one is set.
    async fn execute_node(
        &self,
        node: Arc<dyn Node<S>>,
        state: &S,
        ctx: &RunContext<S>,
    ) -> Result<S::Update, AgentError> {
        match &self.middleware {
            Some(middleware) => {
                let node_id = node.id().to_string();
                let ctx_owned = ctx.clone();
                middleware
                    .around_run(
                        &node_id,
                        state.clone(),
                        Box::new(move |s: S| {
                            let fut: NodeFuture<S::Update> = Box::pin(async move {
                                node.run_with_context(&s, &ctx_owned).await
                            });
                            fut
                        }),
                    )
                    .await
            }
            None => node.run_with_context(state, ctx).await,
        }
    }

    /// Resolves the node that follows `current_id`; END when there is no outgoing edge.
    fn next_node_id(&self, current_id: &str, state: &S) -> String {
        match self.next_map.get(current_id) {
            Some(NextEntry::Unconditional(to)) => to.clone(),
            Some(NextEntry::Conditional(router)) => router.resolve_next(state),
            None => END.to_string(),
        }
    }

    /// Runs the graph on `state` in place.
    ///
    /// On error the state keeps every update applied before the failing step, so
    /// callers can report partial progress (e.g. a turn limit or cancellation).
    ///
    /// - Before each step: fails with `Cancelled` if the token fired, or with
    ///   `RecursionLimit` if `ctx.recursion_limit` steps already ran.
    /// - During a step: the node future is raced against the token, so an in-flight
    ///   model or tool call is dropped when the run is cancelled.
    pub async fn run_in_place(&self, state: &mut S, ctx: &RunContext<S>) -> Result<(), AgentError> {
        if !self.nodes.contains_key(&self.first_node_id) {
            return Err(AgentError::ExecutionFailed("empty graph".into()));
        }
        log_graph_start(ctx.recursion_limit);

        let mut current_id = self.first_node_id.clone();
        let mut steps = 0usize;
        loop {
            if ctx.is_cancelled() {
                let e = AgentError::Cancelled;
                log_graph_error(&e);
                return Err(e);
            }
            if steps >= ctx.recursion_limit {
                let e = AgentError::RecursionLimit {
                    limit: ctx.recursion_limit,
                };
                log_graph_error(&e);
                return Err(e);
            }
            steps += 1;

            let node = self.nodes.get(&current_id).cloned().ok_or_else(|| {
                AgentError::ExecutionFailed(format!("node not found: {}", current_id))
            })?;

            log_node_start(&current_id, steps);
            log_node_state(&current_id, &*state);
            ctx.emit(
                StreamMode::Tasks,
                StreamEvent::TaskStart {
                    node_id: current_id.clone(),
                },
            )
            .await;

            let result = tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => Err(AgentError::Cancelled),
                r = self.execute_node(node, &*state, ctx) => r,
            };

            let update = match result {
                Ok(update) => update,
                Err(e) => {
                    ctx.emit(
                        StreamMode::Tasks,
                        StreamEvent::TaskEnd {
                            node_id: current_id.clone(),
                            result: Err(e.to_string()),
                        },
                    )
                    .await;
                    log_graph_error(&e);
                    return Err(e);
                }
            };

            ctx.emit(
                StreamMode::Tasks,
                StreamEvent::TaskEnd {
                    node_id: current_id.clone(),
                    result: Ok(()),
                },
            )
            .await;
            log_node_complete(&current_id, &update);

            ctx.emit(
                StreamMode::Updates,
                StreamEvent::Updates {
                    node_id: current_id.clone(),
                    update: update.clone(),
                },
            )
            .await;
            state.apply_update(update);
            log_state_update(&current_id);
            ctx.emit(StreamMode::Values, StreamEvent::Values(state.clone()))
                .await;

            let next_id = self.next_node_id(&current_id, state);
            log_route(&current_id, &next_id);
            if next_id == END {
                log_graph_complete(steps);
                return Ok(());
            }
            current_id = next_id;
        }
    }

    /// Runs the graph to completion and returns the final state.
    ///
    /// The state is lost on error; use `run_in_place` to keep partial progress.
    pub async fn invoke(&self, state: S, ctx: &RunContext<S>) -> Result<S, AgentError> {
        let mut state = state;
        self.run_in_place(&mut state, ctx).await?;
        Ok(state)
    }

    /// Streams graph execution, emitting events via a channel-backed Stream.
    ///
    /// The run is spawned on the current runtime; the stream ends when the run ends
    /// (successfully or not). `ctx`'s own stream sender, if any, is replaced.
    pub fn stream(
        &self,
        state: S,
        ctx: RunContext<S>,
        stream_mode: impl IntoIterator<Item = StreamMode>,
    ) -> ReceiverStream<StreamEvent<S>> {
        let (tx, rx) = mpsc::channel(128);
        let graph = self.clone();
        let ctx = ctx.with_stream(tx, stream_mode);

        tokio::spawn(async move {
            let mut state = state;
            let _ = graph.run_in_place(&mut state, &ctx).await;
        });

        ReceiverStream::new(rx)
    }

    /// Ids of all nodes in the graph (unordered).
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }
}
