//! Deterministic offline model for tests, demos and the default CLI backend.
//!
//! Rules, first match wins:
//! 1. The conversation ends with tool results → final answer echoing them
//!    (`Final answer using tool output: ...`), each result JSON-decoded.
//! 2. The last user message asks for the weather → one `get_weather` tool call.
//! 3. The last user message mentions space → a canned space fact.
//! 4. Otherwise → `[mock reply] <prompt>`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::llm::{LlmClient, LlmError, LlmResponse};
use crate::message::{Message, ToolCall};
use crate::tools::ToolSpec;

/// Tool call id used by the weather rule.
pub const MOCK_TOOL_CALL_ID: &str = "tc1";

const SPACE_REPLY: &str =
    "A fun fact: space is not completely empty; it contains sparse gas, dust, and cosmic rays.";

/// Rule-based model double. Stateless: the same input always yields the same reply.
///
/// **Interaction**: Implements `LlmClient`; the default `LLM_BACKEND`.
#[derive(Clone, Debug, Default)]
pub struct MockLlm {
    tools: Vec<ToolSpec>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tools advertised by the last `bind_tools`. The rules do not depend on them.
    pub fn bound_tools(&self) -> &[ToolSpec] {
        &self.tools
    }

    /// Computes the reply for `messages` without the async wrapper.
    pub fn respond(messages: &[Message]) -> LlmResponse {
        let trailing = trailing_tool_results(messages);
        if !trailing.is_empty() {
            let rendered: Vec<String> = trailing.iter().map(|c| render_tool_output(c)).collect();
            return LlmResponse::text(format!(
                "Final answer using tool output: {}",
                rendered.join("; ")
            ));
        }

        let prompt = messages
            .iter()
            .rev()
            .find_map(|m| match m {
                Message::User { content } => Some(content.as_str()),
                _ => None,
            })
            .unwrap_or("");
        let lower = prompt.to_lowercase();

        if asks_for_weather(&lower) {
            let location = extract_location(prompt);
            return LlmResponse::with_tool_calls(
                format!("I will call the get_weather tool for {}.", location),
                vec![ToolCall::new(
                    MOCK_TOOL_CALL_ID,
                    "get_weather",
                    json!({ "location": location }),
                )],
            );
        }

        if lower.contains("space") {
            return LlmResponse::text(SPACE_REPLY);
        }
        LlmResponse::text(format!("[mock reply] {}", prompt))
    }
}

/// Contents of the tool messages at the end of the conversation, in order.
fn trailing_tool_results(messages: &[Message]) -> Vec<&str> {
    let start = messages
        .iter()
        .rposition(|m| !matches!(m, Message::Tool { .. }))
        .map_or(0, |i| i + 1);
    messages[start..].iter().map(Message::content).collect()
}

/// JSON-decodes a tool result; strings print bare, other values as compact JSON,
/// undecodable content verbatim.
fn render_tool_output(content: &str) -> String {
    match serde_json::from_str::<Value>(content) {
        Ok(Value::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(_) => content.to_string(),
    }
}

fn asks_for_weather(lower: &str) -> bool {
    lower.contains("weather in")
        || (lower.contains("weather")
            && (lower.contains("sf") || lower.contains("san francisco")))
}

/// The word after "in", stripped of trailing punctuation; "sf" when there is none.
fn extract_location(prompt: &str) -> String {
    let words: Vec<&str> = prompt.split_whitespace().collect();
    words
        .windows(2)
        .find(|w| w[0].eq_ignore_ascii_case("in"))
        .map(|w| w[1].trim_matches(|c| matches!(c, '?' | '.' | ',')).to_string())
        .filter(|loc| !loc.is_empty())
        .unwrap_or_else(|| "sf".to_string())
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, LlmError> {
        Ok(Self::respond(messages))
    }

    fn bind_tools(&self, tools: Vec<ToolSpec>) -> Arc<dyn LlmClient> {
        Arc::new(Self { tools })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: a weather question yields exactly one get_weather call for the parsed location.
    #[test]
    fn weather_question_requests_tool() {
        let r = MockLlm::respond(&[Message::user("what is the weather in sf?")]);
        assert_eq!(r.content, "I will call the get_weather tool for sf.");
        assert_eq!(r.tool_calls.len(), 1);
        assert_eq!(r.tool_calls[0].id, MOCK_TOOL_CALL_ID);
        assert_eq!(r.tool_calls[0].name, "get_weather");
        assert_eq!(r.tool_calls[0].arguments, json!({"location": "sf"}));
    }

    #[test]
    fn weather_in_other_city_and_default_location() {
        let r = MockLlm::respond(&[Message::user("Weather in Paris, please")]);
        assert_eq!(r.tool_calls[0].arguments, json!({"location": "Paris"}));
        let r = MockLlm::respond(&[Message::user("sf weather today")]);
        assert_eq!(r.tool_calls[0].arguments, json!({"location": "sf"}));
    }

    /// **Scenario**: trailing tool messages produce a final answer that decodes their JSON.
    #[test]
    fn trailing_tool_results_become_final_answer() {
        let call = ToolCall::new("tc1", "get_weather", json!({"location": "sf"}));
        let messages = vec![
            Message::user("what is the weather in sf?"),
            Message::assistant_with_tool_calls("", vec![call]),
            Message::tool("tc1", "get_weather", "\"sunny\""),
        ];
        let r = MockLlm::respond(&messages);
        assert_eq!(r.content, "Final answer using tool output: sunny");
        assert!(r.tool_calls.is_empty());
    }

    #[test]
    fn several_trailing_results_are_joined_in_order() {
        let messages = vec![
            Message::user("q"),
            Message::tool("a", "calc", "3"),
            Message::tool("b", "calc", "{\"x\":1}"),
            Message::tool("c", "calc", "not json"),
        ];
        assert_eq!(
            MockLlm::respond(&messages).content,
            "Final answer using tool output: 3; {\"x\":1}; not json"
        );
    }

    /// **Scenario**: old tool results do not hijack a new question.
    #[test]
    fn earlier_tool_results_are_ignored_after_new_user_message() {
        let messages = vec![
            Message::tool("a", "calc", "3"),
            Message::assistant("Final answer using tool output: 3"),
            Message::user("tell me about space"),
        ];
        assert_eq!(MockLlm::respond(&messages).content, SPACE_REPLY);
    }

    #[test]
    fn fallback_echoes_prompt() {
        let r = MockLlm::respond(&[Message::system("sys"), Message::user("hello")]);
        assert_eq!(r.content, "[mock reply] hello");
        assert_eq!(MockLlm::respond(&[]).content, "[mock reply] ");
    }

    #[tokio::test]
    async fn bind_tools_returns_new_client_and_keeps_original() {
        let mock = MockLlm::new();
        let spec = ToolSpec::new("get_weather", "w", json!({"type": "object"}));
        let bound = mock.bind_tools(vec![spec]);
        assert!(mock.bound_tools().is_empty());
        let r = bound.invoke(&[Message::user("weather in sf")]).await.unwrap();
        assert_eq!(r.tool_calls[0].name, "get_weather");
    }
}
