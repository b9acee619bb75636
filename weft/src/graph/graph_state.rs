//! State contract for graphs: nodes return deltas, the state merges them.

use std::fmt::Debug;

/// State that flows through a [`StateGraph`](super::StateGraph).
///
/// Nodes never return a whole new state; they return an `Update` (delta) and the
/// run loop merges it with `apply_update`. This keeps append-only states (like
/// `AgentState`) append-only no matter what a node does.
pub trait GraphState: Clone + Send + Sync + Debug + 'static {
    /// Delta produced by one node step. Also streamed as `StreamEvent::Updates`.
    type Update: Clone + Send + Sync + Debug + 'static;

    /// Merges one node's delta into the state.
    fn apply_update(&mut self, update: Self::Update);
}
