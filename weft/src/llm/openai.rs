//! OpenAI Chat Completions client implementing `LlmClient` (ChatOpenAI).
//!
//! Uses the OpenAI Chat Completions API or any compatible endpoint (Ollama serves one
//! at `/v1`). Requires `OPENAI_API_KEY` unless a config is supplied. Tools bound with
//! `bind_tools` are sent as function tools; the response's `tool_calls` come back as
//! [`ToolCall`]s with their arguments decoded from the provider's JSON string.
//!
//! **Interaction**: Implements `LlmClient`; used by `ModelNode` like `MockLlm`.
//! Depends on `async_openai`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::llm::{LlmClient, LlmError, LlmResponse, LlmUsage, ToolChoiceMode};
use crate::message::{Message, ToolCall};
use crate::tools::ToolSpec;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionMessageToolCall, ChatCompletionMessageToolCalls,
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestToolMessageArgs,
        ChatCompletionRequestUserMessage, ChatCompletionTool, ChatCompletionToolChoiceOption,
        ChatCompletionTools, CreateChatCompletionRequestArgs, FunctionCall, FunctionObject,
        ToolChoiceOptions,
    },
    Client,
};

/// OpenAI Chat Completions client implementing `LlmClient`.
///
/// Uses `OPENAI_API_KEY` from the environment by default; or provide config via
/// `ChatOpenAI::with_config`. Cloning is cheap and shares the HTTP client.
///
/// **Interaction**: Implements `LlmClient`; built by `build_llm` for the `openai`
/// and `ollama` backends.
#[derive(Clone)]
pub struct ChatOpenAI {
    client: Client<OpenAIConfig>,
    model: String,
    tools: Vec<ToolSpec>,
    temperature: Option<f32>,
    tool_choice: ToolChoiceMode,
    api_base: Option<String>,
}

impl ChatOpenAI {
    /// Build client with default config (API key from `OPENAI_API_KEY` env).
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
            tools: Vec::new(),
            temperature: None,
            tool_choice: ToolChoiceMode::default(),
            api_base: None,
        }
    }

    /// Build client with custom config (e.g. custom API key or base URL).
    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config),
            model: model.into(),
            tools: Vec::new(),
            temperature: None,
            tool_choice: ToolChoiceMode::default(),
            api_base: None,
        }
    }

    /// Records the base URL for request logging. Does not change where requests go;
    /// set the base on `OpenAIConfig` for that.
    pub fn with_logged_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }

    /// Set tools for this completion (enables tool_calls in response).
    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    /// Set temperature (0–2). Lower values are more deterministic.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set tool choice mode (auto, none, required). Only sent when tools are bound.
    pub fn with_tool_choice(mut self, mode: ToolChoiceMode) -> Self {
        self.tool_choice = mode;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the chat completions URL used for logging (explicit base, else
    /// OPENAI_BASE_URL / OPENAI_API_BASE env, else default). Does not append /v1 when
    /// base already ends with /v1.
    fn chat_completions_url(&self) -> String {
        let base = self
            .api_base
            .clone()
            .or_else(|| std::env::var("OPENAI_BASE_URL").ok())
            .or_else(|| std::env::var("OPENAI_API_BASE").ok())
            .unwrap_or_else(|| "https://api.openai.com".to_string());
        let base = base.trim_end_matches('/');
        if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }

    /// Convert our `Message` list to OpenAI request messages (all four roles).
    fn messages_to_request(
        messages: &[Message],
    ) -> Result<Vec<ChatCompletionRequestMessage>, LlmError> {
        messages
            .iter()
            .map(|m| {
                let converted = match m {
                    Message::System { content } => ChatCompletionRequestMessage::System(
                        ChatCompletionRequestSystemMessage::from(content.as_str()),
                    ),
                    Message::User { content } => ChatCompletionRequestMessage::User(
                        ChatCompletionRequestUserMessage::from(content.as_str()),
                    ),
                    Message::Assistant {
                        content,
                        tool_calls,
                    } => {
                        let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
                        builder.content(content.as_str());
                        if !tool_calls.is_empty() {
                            builder.tool_calls(
                                tool_calls
                                    .iter()
                                    .map(Self::tool_call_to_request)
                                    .collect::<Vec<_>>(),
                            );
                        }
                        builder
                            .build()
                            .map_err(|e| LlmError::Request(e.to_string()))?
                            .into()
                    }
                    Message::Tool {
                        content,
                        tool_call_id,
                        ..
                    } => ChatCompletionRequestToolMessageArgs::default()
                        .content(content.as_str())
                        .tool_call_id(tool_call_id.as_str())
                        .build()
                        .map_err(|e| LlmError::Request(e.to_string()))?
                        .into(),
                };
                Ok(converted)
            })
            .collect()
    }

    fn tool_call_to_request(call: &ToolCall) -> ChatCompletionMessageToolCalls {
        let arguments = match &call.arguments {
            Value::String(raw) => raw.clone(),
            other => other.to_string(),
        };
        ChatCompletionMessageToolCalls::Function(ChatCompletionMessageToolCall {
            id: call.id.clone(),
            function: FunctionCall {
                name: call.name.clone(),
                arguments,
            },
        })
    }

    fn tools_to_request(&self) -> Vec<ChatCompletionTools> {
        self.tools
            .iter()
            .map(|t| {
                ChatCompletionTools::Function(ChatCompletionTool {
                    function: FunctionObject {
                        name: t.name.clone(),
                        description: t.description.clone(),
                        parameters: Some(t.input_schema.clone()),
                        ..Default::default()
                    },
                })
            })
            .collect()
    }
}

/// Decodes a provider argument string. Empty means no arguments; text that is not
/// JSON is passed through as a string so the tool reports the schema mismatch.
pub(crate) fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(Default::default());
    }
    match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "tool call arguments are not valid JSON");
            Value::String(raw.to_string())
        }
    }
}

/// Converts the response's function tool calls. Other call kinds have no tool behind
/// them here, so they are logged and dropped.
pub(crate) fn response_tool_calls(calls: Vec<ChatCompletionMessageToolCalls>) -> Vec<ToolCall> {
    calls
        .into_iter()
        .filter_map(|tc| match tc {
            ChatCompletionMessageToolCalls::Function(f) => {
                let id = if f.id.is_empty() {
                    uuid::Uuid::new_v4().to_string()
                } else {
                    f.id
                };
                Some(ToolCall::new(
                    id,
                    f.function.name,
                    parse_arguments(&f.function.arguments),
                ))
            }
            other => {
                warn!(tool_call = ?other, "dropping non-function tool call from provider");
                None
            }
        })
        .collect()
}

#[async_trait]
impl LlmClient for ChatOpenAI {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, LlmError> {
        let trace_id = uuid::Uuid::new_v4().to_string();
        let openai_messages = Self::messages_to_request(messages)?;
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(openai_messages);

        if !self.tools.is_empty() {
            args.tools(self.tools_to_request());
            let opt = match self.tool_choice {
                ToolChoiceMode::Auto => ToolChoiceOptions::Auto,
                ToolChoiceMode::None => ToolChoiceOptions::None,
                ToolChoiceMode::Required => ToolChoiceOptions::Required,
            };
            args.tool_choice(ChatCompletionToolChoiceOption::Mode(opt));
        }

        if let Some(t) = self.temperature {
            args.temperature(t);
        }

        let request = args
            .build()
            .map_err(|e| LlmError::Request(format!("OpenAI request build failed: {}", e)))?;

        let url = self.chat_completions_url();
        debug!(
            trace_id = %trace_id,
            url = %url,
            model = %self.model,
            message_count = messages.len(),
            tools_count = self.tools.len(),
            temperature = ?self.temperature,
            tool_choice = ?self.tool_choice,
            "OpenAI chat create"
        );
        if let Ok(js) = serde_json::to_string_pretty(&request) {
            trace!(trace_id = %trace_id, url = %url, request = %js, "OpenAI request body");
        }

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| LlmError::Provider(format!("OpenAI API error: {}", e)))?;

        if let Ok(js) = serde_json::to_string_pretty(&response) {
            trace!(trace_id = %trace_id, url = %url, response = %js, "OpenAI response body");
        }

        let usage = response.usage.as_ref().map(|u| LlmUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse)?;

        let msg = choice.message;
        let content = msg.content.unwrap_or_default();
        let tool_calls = response_tool_calls(msg.tool_calls.unwrap_or_default());

        debug!(
            trace_id = %trace_id,
            content_len = content.len(),
            tool_calls = tool_calls.len(),
            "OpenAI chat response"
        );
        Ok(LlmResponse {
            content,
            tool_calls,
            usage,
        })
    }

    fn bind_tools(&self, tools: Vec<ToolSpec>) -> Arc<dyn LlmClient> {
        Arc::new(self.clone().with_tools(tools))
    }
}
