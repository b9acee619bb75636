//! Scripted model double: fixed responses per turn.
//!
//! The turn number is the count of assistant messages already in the input, so the
//! client holds no counters and can be shared by concurrent runs. Turns past the end
//! of the script repeat the last entry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::llm::{LlmClient, LlmError, LlmResponse, LlmUsage};
use crate::message::{Message, ToolCall};
use crate::tools::ToolSpec;

/// One scripted model turn.
#[derive(Clone, Debug)]
pub enum ScriptedTurn {
    /// Plain assistant text; ends the run.
    Reply(String),
    /// Assistant text plus tool calls `(name, arguments)`; ids are `call_{turn}_{index}`.
    Calls {
        content: String,
        calls: Vec<(String, Value)>,
    },
    /// Provider failure with this message.
    Fail(String),
}

/// Model double returning scripted turns, optionally after a delay.
///
/// **Interaction**: Implements `LlmClient`; used by integration tests for
/// always-tool-call, unknown-tool, failing-provider, timeout and cancellation runs.
#[derive(Clone, Debug)]
pub struct ScriptedLlm {
    turns: Vec<ScriptedTurn>,
    usage: Option<LlmUsage>,
    delay: Option<Duration>,
    tools: Vec<ToolSpec>,
}

impl ScriptedLlm {
    /// Script with the given turns. An empty script replies with empty text.
    pub fn new(turns: Vec<ScriptedTurn>) -> Self {
        Self {
            turns,
            usage: None,
            delay: None,
            tools: Vec::new(),
        }
    }

    /// Every turn requests `tool` with `arguments`.
    pub fn always_tool_call(tool: impl Into<String>, arguments: Value) -> Self {
        Self::new(vec![ScriptedTurn::Calls {
            content: String::new(),
            calls: vec![(tool.into(), arguments)],
        }])
    }

    /// First turn requests `calls`, every later turn answers `answer`.
    pub fn tool_then_answer(calls: Vec<(String, Value)>, answer: impl Into<String>) -> Self {
        Self::new(vec![
            ScriptedTurn::Calls {
                content: String::new(),
                calls,
            },
            ScriptedTurn::Reply(answer.into()),
        ])
    }

    /// Every turn fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(vec![ScriptedTurn::Fail(message.into())])
    }

    /// Reports `usage` on every successful turn.
    pub fn with_usage(mut self, usage: LlmUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Sleeps before answering (timeouts, cancellation).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Tools advertised by the last `bind_tools`.
    pub fn bound_tools(&self) -> &[ToolSpec] {
        &self.tools
    }

    fn turn_of(messages: &[Message]) -> usize {
        messages
            .iter()
            .filter(|m| matches!(m, Message::Assistant { .. }))
            .count()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, LlmError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let turn = Self::turn_of(messages);
        let Some(step) = self.turns.get(turn).or_else(|| self.turns.last()) else {
            return Ok(LlmResponse::default());
        };
        let mut response = match step {
            ScriptedTurn::Reply(text) => LlmResponse::text(text.clone()),
            ScriptedTurn::Calls { content, calls } => LlmResponse::with_tool_calls(
                content.clone(),
                calls
                    .iter()
                    .enumerate()
                    .map(|(i, (name, args))| {
                        ToolCall::new(format!("call_{}_{}", turn, i), name.clone(), args.clone())
                    })
                    .collect(),
            ),
            ScriptedTurn::Fail(msg) => return Err(LlmError::Provider(msg.clone())),
        };
        response.usage = self.usage.clone();
        Ok(response)
    }

    fn bind_tools(&self, tools: Vec<ToolSpec>) -> Arc<dyn LlmClient> {
        let mut bound = self.clone();
        bound.tools = tools;
        Arc::new(bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn turns_follow_assistant_count_and_repeat_last() {
        let llm = ScriptedLlm::tool_then_answer(vec![("calc".into(), json!({"expression": "1+1"}))], "2");
        let first = llm.invoke(&[Message::user("1+1?")]).await.unwrap();
        assert_eq!(first.tool_calls[0].id, "call_0_0");
        assert_eq!(first.tool_calls[0].name, "calc");

        let history = vec![
            Message::user("1+1?"),
            first.clone().into_message(),
            Message::tool("call_0_0", "calc", "2"),
        ];
        let second = llm.invoke(&history).await.unwrap();
        assert_eq!(second.content, "2");
        assert!(second.tool_calls.is_empty());

        let mut longer = history.clone();
        longer.push(Message::assistant("2"));
        assert_eq!(llm.invoke(&longer).await.unwrap().content, "2");
    }

    #[tokio::test]
    async fn failing_and_usage() {
        let err = ScriptedLlm::failing("boom").invoke(&[]).await.unwrap_err();
        assert!(matches!(err, LlmError::Provider(m) if m == "boom"));

        let r = ScriptedLlm::new(vec![ScriptedTurn::Reply("ok".into())])
            .with_usage(LlmUsage::new(4, 1))
            .invoke(&[])
            .await
            .unwrap();
        assert_eq!(r.usage, Some(LlmUsage::new(4, 1)));
        assert_eq!(ScriptedLlm::new(vec![]).invoke(&[]).await.unwrap(), LlmResponse::default());
    }
}
