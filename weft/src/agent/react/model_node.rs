//! Model node: prepend the system prompt, call the LLM, append one assistant message.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::graph::Node;
use crate::llm::{LlmClient, LlmError, LlmResponse};
use crate::message::Message;
use crate::state::{AgentDelta, AgentState};

use super::AGENT_NODE;

/// Content used when the model returns neither text nor tool calls.
pub const EMPTY_RESPONSE_FALLBACK: &str =
    "No text response from the model. Please try again or check the API.";

/// The `agent` step.
///
/// Provider failures and timeouts never fail the step: they become an assistant
/// message starting with `Error calling language model:`, which carries no tool
/// calls, so the router ends the run.
pub struct ModelNode {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
    timeout: Option<Duration>,
}

impl ModelNode {
    /// `llm` should already have the registry's tools bound.
    pub fn new(llm: Arc<dyn LlmClient>, system_prompt: impl Into<String>) -> Self {
        Self {
            llm,
            system_prompt: system_prompt.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    async fn call_model(&self, messages: &[Message]) -> Result<LlmResponse, LlmError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.llm.invoke(messages))
                .await
                .map_err(|_| LlmError::Timeout(limit))?,
            None => self.llm.invoke(messages).await,
        }
    }
}

#[async_trait]
impl Node<AgentState> for ModelNode {
    fn id(&self) -> &str {
        AGENT_NODE
    }

    async fn run(&self, state: &AgentState) -> Result<AgentDelta, AgentError> {
        let mut prompt = Vec::with_capacity(state.messages().len() + 1);
        prompt.push(Message::system(self.system_prompt.as_str()));
        prompt.extend_from_slice(state.messages());

        let response = match self.call_model(&prompt).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "model call failed; answering with error message");
                return Ok(AgentDelta::message(Message::assistant(format!(
                    "Error calling language model: {}",
                    e
                ))));
            }
        };

        let LlmResponse {
            content,
            tool_calls,
            usage,
        } = response;
        let content = if content.is_empty() && tool_calls.is_empty() {
            debug!("model returned empty response; using fallback text");
            EMPTY_RESPONSE_FALLBACK.to_string()
        } else {
            content
        };
        debug!(
            content_len = content.len(),
            tool_calls = tool_calls.len(),
            "model step complete"
        );
        Ok(
            AgentDelta::message(Message::assistant_with_tool_calls(content, tool_calls))
                .with_usage(usage),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmUsage, MockLlm, ScriptedLlm, ScriptedTurn};
    use crate::tools::ToolSpec;
    use std::sync::Mutex;

    /// Records the messages it receives.
    struct Recording {
        seen: Mutex<Vec<Vec<Message>>>,
    }

    #[async_trait]
    impl LlmClient for Recording {
        async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, LlmError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            Ok(LlmResponse::text("ok"))
        }

        fn bind_tools(&self, _tools: Vec<ToolSpec>) -> Arc<dyn LlmClient> {
            Arc::new(Recording {
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    /// **Scenario**: the system prompt is sent to the model but never written to state.
    #[tokio::test]
    async fn system_prompt_is_call_scoped() {
        let llm = Arc::new(Recording {
            seen: Mutex::new(Vec::new()),
        });
        let node = ModelNode::new(llm.clone(), "SYS");
        let state = AgentState::from_history(vec![Message::user("hi")]).unwrap();

        let delta = node.run(&state).await.unwrap();

        let seen = llm.seen.lock().unwrap();
        assert_eq!(seen[0], vec![Message::system("SYS"), Message::user("hi")]);
        assert_eq!(delta.messages, vec![Message::assistant("ok")]);
        assert_eq!(state.messages().len(), 1);
    }

    /// **Scenario**: a provider failure becomes an explanatory assistant message.
    #[tokio::test]
    async fn provider_failure_becomes_assistant_message() {
        let node = ModelNode::new(Arc::new(ScriptedLlm::failing("401 unauthorized")), "SYS");
        let state = AgentState::from_history(vec![Message::user("hi")]).unwrap();
        let delta = node.run(&state).await.unwrap();
        assert_eq!(delta.messages.len(), 1);
        let msg = &delta.messages[0];
        assert!(msg.content().starts_with("Error calling language model:"));
        assert!(msg.content().contains("401 unauthorized"));
        assert!(!msg.has_tool_calls());
    }

    /// **Scenario**: a slow model is cut off by the timeout and reported like any failure.
    #[tokio::test]
    async fn timeout_becomes_assistant_message() {
        let llm = ScriptedLlm::new(vec![ScriptedTurn::Reply("late".into())])
            .with_delay(Duration::from_secs(5));
        let node = ModelNode::new(Arc::new(llm), "SYS").with_timeout(Some(Duration::from_millis(20)));
        let state = AgentState::from_history(vec![Message::user("hi")]).unwrap();
        let delta = node.run(&state).await.unwrap();
        assert!(delta.messages[0].content().contains("timed out"));
    }

    #[tokio::test]
    async fn empty_response_uses_fallback_and_usage_is_carried() {
        let llm = ScriptedLlm::new(vec![ScriptedTurn::Reply(String::new())])
            .with_usage(LlmUsage::new(7, 0));
        let node = ModelNode::new(Arc::new(llm), "SYS");
        let delta = node.run(&AgentState::new()).await.unwrap();
        assert_eq!(delta.messages[0].content(), EMPTY_RESPONSE_FALLBACK);
        assert_eq!(delta.usage, Some(LlmUsage::new(7, 0)));
    }

    #[tokio::test]
    async fn tool_calls_pass_through() {
        let node = ModelNode::new(Arc::new(MockLlm::new()), "SYS");
        let state = AgentState::from_history(vec![Message::user("what is the weather in sf?")]).unwrap();
        let delta = node.run(&state).await.unwrap();
        assert_eq!(delta.messages[0].tool_calls()[0].name, "get_weather");
    }
}
