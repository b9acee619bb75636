//! Minimal state graph: nodes, edges, conditional routing, cycles.
//!
//! Build a [`StateGraph`] with `add_node`, `add_edge` (`START` / `END`) and
//! `add_conditional_edges`, then `compile` to a [`CompiledStateGraph`] and run it
//! with a [`RunContext`]. Nodes return deltas ([`GraphState::Update`]); the run loop
//! applies them, so state is only ever changed by the loop.

mod compile_error;
mod compiled;
mod conditional;
mod graph_state;
mod logging;
mod logging_middleware;
mod node;
mod node_middleware;
mod run_context;
mod state_graph;

pub use compile_error::CompilationError;
pub use compiled::CompiledStateGraph;
pub use conditional::{ConditionalRouter, ConditionalRouterFn, NextEntry};
pub use graph_state::GraphState;
pub use logging_middleware::LoggingNodeMiddleware;
pub use node::Node;
pub use node_middleware::{NodeFuture, NodeMiddleware, NodeRunFn};
pub use run_context::{RunContext, DEFAULT_RECURSION_LIMIT};
pub use state_graph::{StateGraph, END, START};
