//! Builds the runner from the environment and drives one agent run for the CLI.
//!
//! **Interaction**: called from the `weft` binary; output goes to any `Write` so the
//! transcript can be captured in tests.

use std::io::Write;
use std::sync::Arc;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use weft::tools::builtin::{default_registry, WebSearch};
use weft::{
    build_llm, AgentState, CompilationError, LlmBackend, LlmConfig, LlmError, Message,
    ReactConfig, ReactRunner, RegistryError, RunError, StreamEvent, StreamMode, Tool,
};

use crate::display::{format_message, format_web_hits};

/// Prompt used by `--simulate-tool` and when no message is given.
pub const DEMO_PROMPT: &str = "what is the weather in sf?";

/// Query used by the web search demos.
pub const DEMO_WEB_QUERY: &str = "alan turing";

/// CLI failure. Run errors keep the partial state for reporting.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("graph compilation failed: {0}")]
    Compile(#[from] CompilationError),
    #[error(transparent)]
    Run(#[from] RunError),
    #[error("tool not found: {0}")]
    ToolNotFound(String),
    #[error("serialize output: {0}")]
    Serialize(String),
    #[error("write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Options for one `weft` run.
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    pub message: String,
    /// Log node enter/exit to stderr.
    pub verbose: bool,
    /// One JSON object per line instead of the text transcript.
    pub json: bool,
    /// Overrides `LLM_BACKEND`.
    pub backend: Option<LlmBackend>,
    /// Truncate printed contents to this many chars; 0 prints everything.
    pub max_display_len: usize,
}

/// Model from `LLM_BACKEND` and friends, the default tool catalog and `ReactConfig::from_env`.
pub fn build_runner(opts: &RunOptions) -> Result<ReactRunner, CliError> {
    let mut llm_config = LlmConfig::from_env().map_err(CliError::Config)?;
    if let Some(backend) = opts.backend {
        llm_config = llm_config.with_backend(backend);
    }
    tracing::info!(backend = ?llm_config.backend, model = %llm_config.model_name(), "building runner");
    let llm = build_llm(&llm_config)?;
    let registry = Arc::new(default_registry()?);
    let config = ReactConfig::from_env();
    let verbose = opts.verbose || config.verbose;
    Ok(ReactRunner::new(llm, registry, config.with_verbose(verbose))?)
}

fn write_line(out: &mut dyn Write, json: bool, node: &str, m: &Message, max: usize) -> std::io::Result<()> {
    if json {
        let line = json!({"type": "message", "node": node, "message": m});
        writeln!(out, "{}", line)
    } else {
        writeln!(out, "{}", format_message(m, max))
    }
}

/// Runs `opts.message`, writing each message to `out` as it is appended.
///
/// The final JSON line (with `--json`) is `{"type":"reply", ...}`. Cancelling `cancel`
/// ends the run with `RunError::Cancelled`.
pub async fn run_agent(
    runner: &ReactRunner,
    opts: &RunOptions,
    cancel: CancellationToken,
    out: &mut dyn Write,
) -> Result<AgentState, CliError> {
    let input = Message::user(opts.message.as_str());
    write_line(out, opts.json, "input", &input, opts.max_display_len)?;

    let mut write_error = None;
    let result = runner
        .stream_with_config(vec![input], cancel, [StreamMode::Updates], |event| {
            if let StreamEvent::Updates { node_id, update } = event {
                for m in &update.messages {
                    if let Err(e) = write_line(out, opts.json, &node_id, m, opts.max_display_len) {
                        write_error.get_or_insert(e);
                    }
                }
            }
        })
        .await;
    if let Some(e) = write_error {
        return Err(CliError::Io(e));
    }
    let state = result?;

    if opts.json {
        let reply = json!({
            "type": "reply",
            "content": state.last_assistant_reply().unwrap_or_default(),
            "tool_rounds": state.tool_rounds(),
            "total_usage": state.total_usage(),
        });
        writeln!(out, "{}", reply)?;
    }
    Ok(state)
}

/// Calls `web_search` directly (no model) and prints the hits; failures are printed, not returned.
pub async fn web_search_demo(query: &str, max_results: usize, out: &mut dyn Write) -> Result<(), CliError> {
    let tool = WebSearch::new();
    let args = json!({"query": query, "engine": "duckduckgo", "max_results": max_results});
    match tool.call(args).await {
        Ok(hits) => {
            writeln!(out, "Results:")?;
            write!(out, "{}", format_web_hits(&hits))?;
        }
        Err(e) => writeln!(out, "web_search demo failed: {}", e)?,
    }
    Ok(())
}
