//! Tool-augmented agent loop.
//!
//! Fixed topology:
//!
//! ```text
//! START → agent ──(continue)──→ tools ──→ agent
//!           └────(end)──→ END
//! ```
//!
//! [`ModelNode`] (`agent`) appends one assistant message; [`route`] looks at it and
//! sends the run to [`ToolNode`] (`tools`) when it carries tool calls, otherwise to
//! END. [`ReactRunner`] compiles the graph once and drives independent runs over it.

mod config;
mod model_node;
mod runner;
mod tool_node;

pub use config::ReactConfig;
pub use model_node::{ModelNode, EMPTY_RESPONSE_FALLBACK};
pub use runner::{ReactRunner, RunError};
pub use tool_node::ToolNode;

use crate::state::AgentState;

/// Node id of the model step.
pub const AGENT_NODE: &str = "agent";
/// Node id of the tool step.
pub const TOOLS_NODE: &str = "tools";

/// Default system instruction; `REACT_SYSTEM_PROMPT` overrides it.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant, please respond to the user's query to the best of your ability!";

/// Router decision after a model step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Last message is an assistant message with tool calls: run them.
    Continue,
    /// Anything else: the run is done.
    End,
}

impl Route {
    /// Routing key used in the graph's path map.
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Continue => "continue",
            Route::End => "end",
        }
    }
}

/// Decides whether the loop continues: `Continue` iff the last message is an
/// assistant message carrying at least one tool call.
pub fn route(state: &AgentState) -> Route {
    match state.last_message() {
        Some(m) if m.has_tool_calls() => Route::Continue,
        _ => Route::End,
    }
}
