//! Streaming types for graph runs.
//!
//! Defines stream modes and events emitted by `CompiledStateGraph` while it runs.
//! `ReactRunner::stream_with_callback` uses `Updates` to hand each appended delta
//! to the caller in order.

use crate::graph::GraphState;

/// Which events a run emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamMode {
    /// Emit full state after each node completes.
    Values,
    /// Emit each node's update (the delta appended to state) with the node id.
    Updates,
    /// Emit task start/end events for each node execution.
    Tasks,
}

/// Streamed event emitted while running a graph.
#[derive(Clone, Debug)]
pub enum StreamEvent<S>
where
    S: GraphState,
{
    /// Full state snapshot after a node finishes.
    Values(S),
    /// The delta a node produced, emitted right before it is applied.
    Updates { node_id: String, update: S::Update },
    /// A node began execution.
    TaskStart { node_id: String },
    /// A node finished execution: Ok(()) on success, Err(message) on failure.
    TaskEnd {
        node_id: String,
        result: Result<(), String>,
    },
}
