//! Agent patterns built on the state graph.
//!
//! - [`react`]: model → tools → model loop until the model answers without tool calls.

pub mod react;

pub use react::{
    route, ModelNode, ReactConfig, ReactRunner, Route, RunError, ToolNode, DEFAULT_SYSTEM_PROMPT,
};
