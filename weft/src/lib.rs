//! # Weft
//!
//! A tool-augmented conversational agent loop: the model is called, any tools it
//! asks for are executed, their results go back to the model, and so on until the
//! model answers without tool calls.
//!
//! ## Design principles
//!
//! - **Append-only state**: one [`AgentState`] per run holds the ordered message
//!   history; nodes return deltas ([`AgentDelta`]) and only the run loop appends them.
//! - **Failures are messages**: provider errors, unknown tools, tool errors and
//!   timeouts become assistant or tool messages, so a run always ends with a
//!   well-formed conversation. Only a turn ceiling, cancellation or a broken graph
//!   end a run early ([`RunError`]), and those still hand back the partial state.
//! - **Explicit dependencies**: the model ([`LlmClient`]) and the tool catalog
//!   ([`ToolRegistry`]) are built once at startup and passed to [`ReactRunner`];
//!   there are no globals.
//!
//! ## Main modules
//!
//! - [`message`]: [`Message`] (System / User / Assistant / Tool), [`ToolCall`].
//! - [`state`]: [`AgentState`], [`AgentDelta`], [`StateError`].
//! - [`tools`]: [`Tool`] trait, [`ToolRegistry`], [`ToolSpec`], [`ToolError`]; demo tools in [`tools::builtin`].
//! - [`llm`]: [`LlmClient`] trait, [`MockLlm`], [`ScriptedLlm`], [`ChatOpenAI`], backend selection.
//! - [`graph`]: [`StateGraph`], [`CompiledStateGraph`], [`Node`], [`RunContext`], middleware.
//! - [`agent`]: [`agent::react`]: [`ModelNode`], [`ToolNode`], [`route`], [`ReactRunner`].
//! - [`stream`]: [`StreamEvent`], [`StreamMode`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use weft::tools::builtin::default_registry;
//! use weft::{LlmClient, MockLlm, ReactConfig, ReactRunner};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let llm: Arc<dyn LlmClient> = Arc::new(MockLlm::new());
//! let runner = ReactRunner::new(llm, Arc::new(default_registry().unwrap()), ReactConfig::from_env())
//!     .unwrap();
//! match runner.invoke_text("what is the weather in sf?").await {
//!     Ok(state) => println!("{}", state.last_assistant_reply().unwrap_or_default()),
//!     Err(e) => eprintln!("error: {}", e),
//! }
//! # }
//! ```

pub mod agent;
pub mod error;
pub mod graph;
pub mod llm;
pub mod message;
pub mod state;
pub mod stream;
pub mod tools;

pub use agent::react::{
    route, ModelNode, ReactConfig, ReactRunner, Route, RunError, ToolNode, AGENT_NODE,
    DEFAULT_SYSTEM_PROMPT, EMPTY_RESPONSE_FALLBACK, TOOLS_NODE,
};
pub use error::AgentError;
pub use graph::{
    CompilationError, CompiledStateGraph, GraphState, LoggingNodeMiddleware, Node,
    NodeMiddleware, RunContext, StateGraph, END, START,
};
pub use llm::{
    build_llm, ChatOpenAI, LlmBackend, LlmClient, LlmConfig, LlmError, LlmResponse, LlmUsage,
    MockLlm, ScriptedLlm, ScriptedTurn, ToolChoiceMode,
};
pub use message::{Message, Role, ToolCall};
pub use state::{AgentDelta, AgentState, StateError};
pub use stream::{StreamEvent, StreamMode};
pub use tools::{RegistryError, Tool, ToolError, ToolRegistry, ToolSpec};
