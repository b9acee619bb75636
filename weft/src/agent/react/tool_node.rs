//! Tool node: execute the tool calls of the last assistant message.
//!
//! Calls may run concurrently (bounded by `concurrency`), but the resulting tool
//! messages are appended in call order. Every failure mode (unknown tool, bad
//! arguments, tool error, timeout, panic) becomes an error-shaped tool message:
//!
//! ```json
//! {"error": "UnknownTool", "tool": "nonexistent_tool", "message": "unknown tool: nonexistent_tool"}
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{FutureExt, StreamExt};
use serde_json::json;
use tracing::{debug, trace, warn};

use crate::error::AgentError;
use crate::graph::Node;
use crate::message::{Message, ToolCall};
use crate::state::{AgentDelta, AgentState};
use crate::tools::{ToolError, ToolRegistry};

use super::TOOLS_NODE;

/// Truncates a string for logging, appending "..." if longer than max_len.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}

/// The `tools` step.
pub struct ToolNode {
    registry: Arc<ToolRegistry>,
    timeout: Option<Duration>,
    concurrency: usize,
}

impl ToolNode {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            timeout: None,
            concurrency: 1,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Maximum calls in flight at once; 1 runs them one after another.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    async fn invoke(&self, call: &ToolCall) -> Result<serde_json::Value, ToolError> {
        let tool = self.registry.lookup(&call.name)?;
        let fut = AssertUnwindSafe(tool.call(call.arguments.clone())).catch_unwind();
        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| ToolError::Timeout(limit))?,
            None => fut.await,
        };
        outcome.unwrap_or_else(|_| Err(ToolError::Failed("tool panicked".to_string())))
    }

    /// Runs one call and wraps the outcome as a tool message.
    async fn execute(&self, call: ToolCall) -> Message {
        debug!(tool = %call.name, call_id = %call.id, "tool call start");
        match self.invoke(&call).await {
            Ok(value) => {
                let content = value.to_string();
                trace!(
                    tool = %call.name,
                    call_id = %call.id,
                    result = %truncate_for_log(&content, 200),
                    "tool call ok"
                );
                Message::tool(call.id, call.name, content)
            }
            Err(e) => {
                warn!(tool = %call.name, call_id = %call.id, error = %e, "tool call failed");
                let content = json!({
                    "error": e.kind(),
                    "tool": call.name,
                    "message": e.to_string(),
                })
                .to_string();
                Message::tool_error(call.id, call.name, content)
            }
        }
    }
}

#[async_trait]
impl Node<AgentState> for ToolNode {
    fn id(&self) -> &str {
        TOOLS_NODE
    }

    async fn run(&self, state: &AgentState) -> Result<AgentDelta, AgentError> {
        let calls = state.pending_tool_calls().to_vec();
        if calls.is_empty() {
            return Ok(AgentDelta::default());
        }
        debug!(count = calls.len(), concurrency = self.concurrency, "running tool calls");
        let messages: Vec<Message> = futures::stream::iter(calls.into_iter().map(|c| self.execute(c)))
            .buffered(self.concurrency)
            .collect()
            .await;
        Ok(AgentDelta::new(messages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtin::{Calc, GetWeather};
    use crate::tools::{Tool, ToolSpec};
    use serde_json::Value;

    struct Panics;

    #[async_trait]
    impl Tool for Panics {
        fn name(&self) -> &str {
            "panics"
        }

        fn spec(&self) -> ToolSpec {
            ToolSpec::new("panics", "always panics", json!({"type": "object"}))
        }

        async fn call(&self, _args: Value) -> Result<Value, ToolError> {
            panic!("boom");
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut r = ToolRegistry::new();
        r.register(GetWeather).unwrap().register(Calc).unwrap().register(Panics).unwrap();
        Arc::new(r)
    }

    fn state_with_calls(calls: Vec<ToolCall>) -> AgentState {
        AgentState::from_history(vec![
            Message::user("go"),
            Message::assistant_with_tool_calls("", calls),
        ])
        .unwrap()
    }

    /// **Scenario**: a successful call yields a tool message whose content is the JSON result.
    #[tokio::test]
    async fn success_is_json_encoded() {
        let node = ToolNode::new(registry());
        let state = state_with_calls(vec![ToolCall::new("a", "calc", json!({"expression": "6*7"}))]);
        let delta = node.run(&state).await.unwrap();
        assert_eq!(delta.messages, vec![Message::tool("a", "calc", "\"42\"")]);
    }

    /// **Scenario**: unknown tools and failing tools become error-shaped messages; the node never fails.
    #[tokio::test]
    async fn failures_become_error_messages() {
        let node = ToolNode::new(registry());
        let state = state_with_calls(vec![
            ToolCall::new("a", "nonexistent_tool", json!({})),
            ToolCall::new("b", "calc", json!({"expression": "1/0"})),
            ToolCall::new("c", "get_weather", json!({"city": "sf"})),
            ToolCall::new("d", "panics", json!({})),
        ]);
        let delta = node.run(&state).await.unwrap();
        assert_eq!(delta.messages.len(), 4);

        let payloads: Vec<Value> = delta
            .messages
            .iter()
            .map(|m| serde_json::from_str(m.content()).unwrap())
            .collect();
        assert_eq!(payloads[0]["error"], "UnknownTool");
        assert_eq!(payloads[0]["tool"], "nonexistent_tool");
        assert_eq!(payloads[1]["error"], "ToolInvocationFailure");
        assert!(payloads[1]["message"].as_str().unwrap().contains("division by zero"));
        assert_eq!(payloads[2]["error"], "ToolInvocationFailure");
        assert!(payloads[3]["message"].as_str().unwrap().contains("panicked"));
        assert!(delta
            .messages
            .iter()
            .all(|m| matches!(m, Message::Tool { is_error: true, .. })));
    }

    #[tokio::test]
    async fn no_pending_calls_yields_empty_delta() {
        let node = ToolNode::new(registry());
        let state = AgentState::from_history(vec![Message::user("hi")]).unwrap();
        assert!(node.run(&state).await.unwrap().is_empty());
    }
}
