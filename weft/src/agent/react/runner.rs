//! Agent loop runner: compiles the agent/tools graph once and drives runs over it.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};

use crate::error::AgentError;
use crate::graph::{
    CompilationError, CompiledStateGraph, LoggingNodeMiddleware, RunContext, StateGraph, END,
    START,
};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::state::{AgentState, StateError};
use crate::stream::{StreamEvent, StreamMode};
use crate::tools::ToolRegistry;

use super::{route, ModelNode, ReactConfig, Route, ToolNode, AGENT_NODE, TOOLS_NODE};

/// Why a run did not reach a final answer.
///
/// Every variant raised after the run started carries the state accumulated so far.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The model kept requesting tools past `max_turns` round trips.
    #[error("turn limit exceeded: more than {max_turns} model/tool round trips")]
    TurnLimitExceeded {
        max_turns: usize,
        state: Box<AgentState>,
    },
    /// The run's cancellation token fired.
    #[error("run cancelled")]
    Cancelled { state: Box<AgentState> },
    /// The caller's history is not well formed.
    #[error("invalid history: {0}")]
    InvalidHistory(#[from] StateError),
    /// The graph failed for an internal reason.
    #[error("execution failed: {source}")]
    Execution {
        source: AgentError,
        state: Box<AgentState>,
    },
}

impl RunError {
    /// Best-effort state at the point the run stopped.
    pub fn partial_state(&self) -> Option<&AgentState> {
        match self {
            RunError::TurnLimitExceeded { state, .. }
            | RunError::Cancelled { state }
            | RunError::Execution { state, .. } => Some(state),
            RunError::InvalidHistory(_) => None,
        }
    }

    pub fn into_partial_state(self) -> Option<AgentState> {
        match self {
            RunError::TurnLimitExceeded { state, .. }
            | RunError::Cancelled { state }
            | RunError::Execution { state, .. } => Some(*state),
            RunError::InvalidHistory(_) => None,
        }
    }
}

/// Runs the agent loop.
///
/// Holds the compiled graph, the tool-bound model and the loop config; all are
/// read-only, so one runner can serve many concurrent runs (wrap it in `Arc`).
/// Each run owns its `AgentState`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use weft::tools::builtin::default_registry;
/// use weft::{MockLlm, ReactConfig, ReactRunner};
///
/// # #[tokio::main]
/// # async fn main() {
/// let registry = Arc::new(default_registry().unwrap());
/// let runner = ReactRunner::new(Arc::new(MockLlm::new()), registry, ReactConfig::default()).unwrap();
/// let state = runner.invoke_text("what is the weather in sf?").await.unwrap();
/// assert!(state.last_assistant_reply().unwrap().contains("sunny"));
/// # }
/// ```
pub struct ReactRunner {
    compiled: CompiledStateGraph<AgentState>,
    config: ReactConfig,
}

impl ReactRunner {
    /// Binds the registry's tools to `llm` and compiles the graph.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        registry: Arc<ToolRegistry>,
        config: ReactConfig,
    ) -> Result<Self, CompilationError> {
        let bound = llm.bind_tools(registry.specs());
        let model = ModelNode::new(bound, config.system_prompt.clone())
            .with_timeout(config.model_timeout);
        let tools = ToolNode::new(registry)
            .with_timeout(config.tool_timeout)
            .with_concurrency(config.tool_concurrency);

        let path_map: HashMap<String, String> = [
            (Route::Continue.as_str().to_string(), TOOLS_NODE.to_string()),
            (Route::End.as_str().to_string(), END.to_string()),
        ]
        .into_iter()
        .collect();

        let mut graph = StateGraph::<AgentState>::new();
        graph
            .add_node(AGENT_NODE, Arc::new(model))
            .add_node(TOOLS_NODE, Arc::new(tools))
            .add_edge(START, AGENT_NODE)
            .add_conditional_edges(
                AGENT_NODE,
                Arc::new(|state: &AgentState| route(state).as_str().to_string()),
                Some(path_map),
            )
            .add_edge(TOOLS_NODE, AGENT_NODE);

        let graph = if config.verbose {
            graph.with_middleware(Arc::new(LoggingNodeMiddleware::<AgentState>::default()))
        } else {
            graph
        };
        let compiled = graph.compile()?;

        Ok(Self { compiled, config })
    }

    pub fn config(&self) -> &ReactConfig {
        &self.config
    }

    /// Runs from a single user message.
    pub async fn invoke_text(&self, user_message: &str) -> Result<AgentState, RunError> {
        self.invoke(vec![Message::user(user_message)]).await
    }

    /// Runs the loop over `messages` until the model answers without tool calls.
    pub async fn invoke(&self, messages: Vec<Message>) -> Result<AgentState, RunError> {
        self.invoke_with_cancel(messages, CancellationToken::new())
            .await
    }

    /// Like `invoke`; cancelling `cancel` stops the run before the next step and
    /// abandons the step in flight.
    pub async fn invoke_with_cancel(
        &self,
        messages: Vec<Message>,
        cancel: CancellationToken,
    ) -> Result<AgentState, RunError> {
        let state = AgentState::from_history(messages)?;
        let ctx = self.run_context().with_cancel(cancel);
        self.run(state, ctx).await
    }

    /// Runs the loop and hands every appended delta to `on_event`, in append order.
    ///
    /// Events arrive as `StreamEvent::Updates { node_id, update }`; the last one
    /// carries the final assistant message.
    pub async fn stream_with_callback<F>(
        &self,
        messages: Vec<Message>,
        on_event: F,
    ) -> Result<AgentState, RunError>
    where
        F: FnMut(StreamEvent<AgentState>),
    {
        self.stream_with_config(messages, CancellationToken::new(), [StreamMode::Updates], on_event)
            .await
    }

    /// Streaming run with explicit cancellation and stream modes.
    pub async fn stream_with_config<F>(
        &self,
        messages: Vec<Message>,
        cancel: CancellationToken,
        modes: impl IntoIterator<Item = StreamMode>,
        mut on_event: F,
    ) -> Result<AgentState, RunError>
    where
        F: FnMut(StreamEvent<AgentState>),
    {
        let state = AgentState::from_history(messages)?;
        let (tx, mut rx) = mpsc::channel(128);
        let ctx = self
            .run_context()
            .with_cancel(cancel)
            .with_stream(tx, modes);

        let drain = async {
            while let Some(event) = rx.recv().await {
                on_event(event);
            }
        };
        let (result, ()) = tokio::join!(self.run(state, ctx), drain);
        result
    }

    fn run_context(&self) -> RunContext<AgentState> {
        RunContext::new().with_recursion_limit(self.config.recursion_limit())
    }

    /// Drives one run; `ctx` is consumed so its stream sender closes when the run ends.
    async fn run(
        &self,
        mut state: AgentState,
        ctx: RunContext<AgentState>,
    ) -> Result<AgentState, RunError> {
        let run_id = uuid::Uuid::new_v4();
        let span = info_span!("run", run_id = %run_id);
        async move {
            info!(
                messages = state.messages().len(),
                max_turns = self.config.max_turns,
                "agent run start"
            );
            let result = self.compiled.run_in_place(&mut state, &ctx).await;
            drop(ctx);
            match result {
                Ok(()) => {
                    info!(
                        messages = state.messages().len(),
                        tool_rounds = state.tool_rounds(),
                        "agent run complete"
                    );
                    Ok(state)
                }
                Err(AgentError::RecursionLimit { .. }) => Err(RunError::TurnLimitExceeded {
                    max_turns: self.config.max_turns,
                    state: Box::new(state),
                }),
                Err(AgentError::Cancelled) => Err(RunError::Cancelled {
                    state: Box::new(state),
                }),
                Err(source) => Err(RunError::Execution {
                    source,
                    state: Box::new(state),
                }),
            }
        }
        .instrument(span)
        .await
    }
}
