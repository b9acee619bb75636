//! LLM client abstraction for the agent's model node.
//!
//! The model node depends on one callable, [`LlmClient::invoke`], that turns the
//! conversation into the next assistant turn (text and optional tool calls). Tools
//! are advertised with [`LlmClient::bind_tools`], which returns a new client and
//! leaves the original untouched.
//!
//! Implementations: [`MockLlm`] (deterministic rules, offline), [`ScriptedLlm`]
//! (fixed per-turn responses for tests) and [`ChatOpenAI`] (OpenAI-compatible
//! Chat Completions, also used for Ollama). [`build_llm`] picks one from [`LlmConfig`].

mod backend;
mod mock;
mod openai;
mod scripted;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::message::{Message, ToolCall};
use crate::tools::ToolSpec;

pub use backend::{build_llm, LlmBackend, LlmConfig};
pub use mock::MockLlm;
pub use openai::ChatOpenAI;
pub use scripted::{ScriptedLlm, ScriptedTurn};

/// Tool choice mode for chat completions: when tools are present, controls whether
/// the model may choose (auto), must not use (none), or must use (required).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ToolChoiceMode {
    /// Model can pick between message or tool calls. Default when tools are present.
    #[default]
    Auto,
    /// Model will not call any tool.
    None,
    /// Model must call one or more tools.
    Required,
}

impl std::str::FromStr for ToolChoiceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "none" => Ok(Self::None),
            "required" => Ok(Self::Required),
            _ => Err(format!(
                "unknown tool_choice: {} (use auto, none, or required)",
                s
            )),
        }
    }
}

/// Token usage for one LLM call (prompt + completion).
///
/// **Interaction**: Optional part of `LlmResponse`; carried on the model node's
/// delta and summed into `AgentState::total_usage`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmUsage {
    /// Tokens in the prompt (input).
    pub prompt_tokens: u32,
    /// Tokens in the completion (output).
    pub completion_tokens: u32,
    /// Total tokens (prompt + completion).
    pub total_tokens: u32,
}

impl LlmUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }

    /// Adds `other` into `self` (saturating).
    pub fn accumulate(&mut self, other: &LlmUsage) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(other.prompt_tokens);
        self.completion_tokens = self
            .completion_tokens
            .saturating_add(other.completion_tokens);
        self.total_tokens = self.total_tokens.saturating_add(other.total_tokens);
    }
}

/// Response from an LLM completion: assistant message text and optional tool calls.
///
/// **Interaction**: Returned by `LlmClient::invoke()`; the model node turns it into
/// exactly one assistant message via [`LlmResponse::into_message`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LlmResponse {
    /// Assistant message content (plain text).
    pub content: String,
    /// Tool calls from this turn; empty means the run ends after this message.
    pub tool_calls: Vec<ToolCall>,
    /// Token usage for this call, when the provider reports it.
    pub usage: Option<LlmUsage>,
}

impl LlmResponse {
    /// Plain text reply without tool calls.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Reply that requests tools.
    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
            usage: None,
        }
    }

    /// The assistant message for this turn.
    pub fn into_message(self) -> Message {
        Message::assistant_with_tool_calls(self.content, self.tool_calls)
    }
}

/// Failure of one model call.
///
/// Never ends a run: the model node converts it into an explanatory assistant message.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The request could not be built (bad model name, bad tool schema, ...).
    #[error("invalid request: {0}")]
    Request(String),
    /// The provider returned an error (HTTP, auth, malformed body, connection).
    #[error("provider error: {0}")]
    Provider(String),
    /// The call did not finish within the model timeout.
    #[error("model call timed out after {0:?}")]
    Timeout(Duration),
    /// The provider answered with no choices.
    #[error("provider returned no choices")]
    EmptyResponse,
}

/// LLM client: given messages, returns assistant text and optional tool_calls.
///
/// The model node calls this once per AGENT step with the call-scoped system prompt
/// prepended. Implementations must not keep per-call mutable state: one client is
/// shared read-only by every concurrent run.
///
/// **Interaction**: Used by `ModelNode`; built by `build_llm` or directly.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Invoke one turn: read messages, return assistant content and optional tool_calls.
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, LlmError>;

    /// Returns a client that advertises `tools` to the model. `self` is unchanged.
    fn bind_tools(&self, tools: Vec<ToolSpec>) -> Arc<dyn LlmClient>;
}
