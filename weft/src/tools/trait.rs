use async_trait::async_trait;
use serde_json::Value;

use super::{ToolError, ToolSpec};

/// A single tool that the model can call.
///
/// Each tool has a unique name, a descriptor (description and JSON schema)
/// advertised to the model, and the call logic. Tools are registered once in a
/// [`ToolRegistry`](super::ToolRegistry) and must not keep per-call mutable state:
/// the same instance serves every run and every lookup.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use serde_json::{json, Value};
/// use weft::tools::{Tool, ToolError, ToolSpec};
///
/// struct Echo;
///
/// #[async_trait]
/// impl Tool for Echo {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     fn spec(&self) -> ToolSpec {
///         ToolSpec::new("echo", "Echo the input back", json!({"type": "object"}))
///     }
///
///     async fn call(&self, args: Value) -> Result<Value, ToolError> {
///         Ok(args)
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name; the key the model uses in tool calls.
    fn name(&self) -> &str;

    /// Name, description and JSON schema for the arguments.
    ///
    /// Listed by `ToolRegistry::specs` and bound to the model with `LlmClient::bind_tools`.
    fn spec(&self) -> ToolSpec;

    /// Executes the tool with the model-supplied argument payload.
    ///
    /// The returned value is serialized to JSON text for the tool message.
    ///
    /// # Errors
    ///
    /// - `ToolError::InvalidArguments` when `args` does not match the schema
    /// - `ToolError::Failed` for the tool's own failures (I/O, HTTP, evaluation)
    async fn call(&self, args: Value) -> Result<Value, ToolError>;
}
