//! Tools the model can call, and the registry that indexes them.
//!
//! - [`Tool`]: one callable capability (`name`, `spec`, `call`).
//! - [`ToolRegistry`]: name → tool, built at startup, read-only during runs.
//! - [`builtin`]: the demo tools shipped with the CLI (`default_registry()`).
//!
//! Tool failures are values ([`ToolError`]); `ToolNode` turns them into
//! error-shaped tool messages so a failing tool never aborts a run.

pub mod builtin;
mod registry;
mod r#trait;

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use registry::{RegistryError, ToolRegistry};
pub use r#trait::Tool;

/// Tool descriptor advertised to the model.
///
/// Same shape as an OpenAI function definition / MCP `tools/list` item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Tool name (the key used in tool calls).
    pub name: String,
    /// Human-readable description for the model.
    pub description: Option<String>,
    /// JSON Schema for the argument object.
    pub input_schema: Value,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            input_schema,
        }
    }
}

/// Failure of one tool call.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool is not registered.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    /// The argument payload does not match the tool's schema.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    /// The tool's own logic failed.
    #[error("{0}")]
    Failed(String),
    /// The call did not finish within the per-tool timeout.
    #[error("tool call timed out after {0:?}")]
    Timeout(Duration),
}

impl ToolError {
    /// Error class written into error-shaped tool messages:
    /// `UnknownTool` or `ToolInvocationFailure`.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::UnknownTool(_) => "UnknownTool",
            ToolError::InvalidArguments(_) | ToolError::Failed(_) | ToolError::Timeout(_) => {
                "ToolInvocationFailure"
            }
        }
    }
}

impl From<RegistryError> for ToolError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::UnknownTool(name) => ToolError::UnknownTool(name),
            RegistryError::DuplicateToolName(name) => {
                ToolError::Failed(format!("duplicate tool name: {}", name))
            }
        }
    }
}

/// Deserializes a tool's argument payload into its typed argument struct.
pub fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// **Scenario**: kind() maps the taxonomy; Display carries the cause.
    #[test]
    fn tool_error_kind_and_display() {
        let e = ToolError::UnknownTool("nonexistent_tool".into());
        assert_eq!(e.kind(), "UnknownTool");
        assert!(e.to_string().contains("nonexistent_tool"));

        let e = ToolError::Failed("division by zero".into());
        assert_eq!(e.kind(), "ToolInvocationFailure");
        assert_eq!(e.to_string(), "division by zero");

        assert_eq!(
            ToolError::Timeout(Duration::from_secs(1)).kind(),
            "ToolInvocationFailure"
        );
    }

    #[derive(Debug, Deserialize)]
    struct Args {
        location: String,
    }

    #[test]
    fn parse_args_reports_schema_mismatch() {
        let ok: Args = parse_args(json!({"location": "sf"})).unwrap();
        assert_eq!(ok.location, "sf");
        let err = parse_args::<Args>(json!({"city": "sf"})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(m) if m.contains("location")));
    }
}
