//! State for the agent loop.
//!
//! [`AgentState`] is the ordered, append-only conversation of one run. It flows
//! through the [`StateGraph`](crate::graph::StateGraph) and only changes when the run
//! loop applies an [`AgentDelta`] returned by `ModelNode` or `ToolNode`.
//!
//! # Example
//!
//! ```rust
//! use weft::{AgentState, Message};
//!
//! let state = AgentState::from_history(vec![Message::user("What is 2+2?")]).unwrap();
//! assert_eq!(state.messages().len(), 1);
//! ```

use serde::Serialize;
use thiserror::Error;

use crate::graph::GraphState;
use crate::llm::LlmUsage;
use crate::message::{Message, ToolCall};

/// History that violates tool-call pairing.
#[derive(Debug, Error, PartialEq)]
pub enum StateError {
    /// A tool message at `index` answers a call id no earlier assistant message issued.
    #[error("tool message at index {index} has tool_call_id {tool_call_id:?} with no earlier matching assistant tool call")]
    UnmatchedToolCallId { index: usize, tool_call_id: String },
}

/// Messages appended by one node step, plus the model usage for that step if any.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgentDelta {
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<LlmUsage>,
}

impl AgentDelta {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            usage: None,
        }
    }

    /// One message, e.g. the assistant reply from `ModelNode`.
    pub fn message(message: Message) -> Self {
        Self::new(vec![message])
    }

    pub fn with_usage(mut self, usage: Option<LlmUsage>) -> Self {
        self.usage = usage;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Conversation state for one agent run.
///
/// Messages are private so that the only mutations are appends through
/// [`GraphState::apply_update`]; nothing can remove or reorder history.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AgentState {
    messages: Vec<Message>,
    /// Token usage of the most recent model call, when the provider reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    usage: Option<LlmUsage>,
    /// Usage summed over every model call of the run.
    #[serde(skip_serializing_if = "Option::is_none")]
    total_usage: Option<LlmUsage>,
}

impl AgentState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a run with caller-supplied history, validating tool-call pairing.
    pub fn from_history(messages: Vec<Message>) -> Result<Self, StateError> {
        validate_tool_pairing(&messages)?;
        Ok(Self {
            messages,
            usage: None,
            total_usage: None,
        })
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn usage(&self) -> Option<&LlmUsage> {
        self.usage.as_ref()
    }

    pub fn total_usage(&self) -> Option<&LlmUsage> {
        self.total_usage.as_ref()
    }

    /// Content of the chronologically last assistant message, if any.
    ///
    /// An assistant turn that only requested tools yields `Some("")`.
    pub fn last_assistant_reply(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::Assistant { content, .. } => Some(content.as_str()),
            _ => None,
        })
    }

    /// Completed model→tools round trips: assistant tool-call messages that are
    /// followed by their tool results.
    pub fn tool_rounds(&self) -> usize {
        self.messages
            .windows(2)
            .filter(|w| w[0].has_tool_calls() && matches!(w[1], Message::Tool { .. }))
            .count()
    }

    /// Tool calls of the last message, i.e. requests the tools node has not answered yet.
    pub fn pending_tool_calls(&self) -> &[ToolCall] {
        match self.messages.last() {
            Some(m) => m.tool_calls(),
            None => &[],
        }
    }
}

impl GraphState for AgentState {
    type Update = AgentDelta;

    fn apply_update(&mut self, update: AgentDelta) {
        for message in update.messages {
            if let Message::Tool { tool_call_id, .. } = &message {
                if !has_matching_call(&self.messages, tool_call_id) {
                    tracing::warn!(
                        tool_call_id = %tool_call_id,
                        "appending tool message without a matching assistant tool call"
                    );
                }
            }
            self.messages.push(message);
        }
        if let Some(usage) = update.usage {
            let total = self.total_usage.get_or_insert_with(LlmUsage::default);
            total.accumulate(&usage);
            self.usage = Some(usage);
        }
    }
}

fn has_matching_call(earlier: &[Message], tool_call_id: &str) -> bool {
    earlier
        .iter()
        .rev()
        .flat_map(|m| m.tool_calls())
        .any(|c| c.id == tool_call_id)
}

fn validate_tool_pairing(messages: &[Message]) -> Result<(), StateError> {
    for (index, message) in messages.iter().enumerate() {
        if let Message::Tool { tool_call_id, .. } = message {
            if !has_matching_call(&messages[..index], tool_call_id) {
                return Err(StateError::UnmatchedToolCallId {
                    index,
                    tool_call_id: tool_call_id.clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn weather_call(id: &str) -> Message {
        Message::assistant_with_tool_calls(
            "",
            vec![ToolCall::new(id, "get_weather", json!({"location": "sf"}))],
        )
    }

    /// **Scenario**: history with a tool result that answers an earlier call is accepted.
    #[test]
    fn from_history_accepts_paired_tool_message() {
        let state = AgentState::from_history(vec![
            Message::user("weather?"),
            weather_call("tc1"),
            Message::tool("tc1", "get_weather", "\"sunny\""),
        ])
        .unwrap();
        assert_eq!(state.messages().len(), 3);
        assert_eq!(state.tool_rounds(), 1);
    }

    /// **Scenario**: a tool result with no earlier matching call is rejected with its index.
    #[test]
    fn from_history_rejects_unmatched_tool_message() {
        let err = AgentState::from_history(vec![
            Message::user("hi"),
            Message::tool("nope", "get_weather", "x"),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            StateError::UnmatchedToolCallId {
                index: 1,
                tool_call_id: "nope".into()
            }
        );
    }

    /// **Scenario**: a tool result that precedes its call is rejected (pairing is by order).
    #[test]
    fn from_history_rejects_result_before_call() {
        let err = AgentState::from_history(vec![
            Message::tool("tc1", "get_weather", "x"),
            weather_call("tc1"),
        ]);
        assert!(err.is_err());
    }

    /// **Scenario**: apply_update appends in order and accumulates usage.
    #[test]
    fn apply_update_appends_and_accumulates_usage() {
        let mut state = AgentState::from_history(vec![Message::user("hi")]).unwrap();
        let usage = LlmUsage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        };
        state.apply_update(AgentDelta::message(weather_call("tc1")).with_usage(Some(usage.clone())));
        state.apply_update(AgentDelta::new(vec![Message::tool("tc1", "get_weather", "1")]));
        state.apply_update(AgentDelta::message(Message::assistant("done")).with_usage(Some(usage)));

        let roles: Vec<_> = state.messages().iter().map(|m| m.role().as_str()).collect();
        assert_eq!(roles, ["user", "assistant", "tool", "assistant"]);
        assert_eq!(state.total_usage().unwrap().total_tokens, 30);
        assert_eq!(state.usage().unwrap().total_tokens, 15);
        assert_eq!(state.last_assistant_reply(), Some("done"));
        assert!(state.pending_tool_calls().is_empty());
    }

    /// **Scenario**: a trailing tool-call request is pending and not counted as a round.
    #[test]
    fn trailing_request_is_pending_not_a_round() {
        let mut state = AgentState::new();
        state.apply_update(AgentDelta::message(weather_call("a")));
        assert_eq!(state.tool_rounds(), 0);
        assert_eq!(state.pending_tool_calls().len(), 1);
        assert_eq!(state.last_assistant_reply(), Some(""));
    }
}
