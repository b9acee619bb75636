use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::tools::r#trait::Tool;
use crate::tools::ToolSpec;

/// Registration or lookup failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A tool with this name is already registered. A startup configuration defect.
    #[error("duplicate tool name: {0}")]
    DuplicateToolName(String),
    /// No tool with this name is registered.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

/// Name-indexed catalog of tools.
///
/// Built once at startup (`register`), then shared read-only behind `Arc` by every
/// run. Keeps registration order for `list` / `specs` so the model sees tools in a
/// stable order.
///
/// # Examples
///
/// ```
/// use weft::tools::{builtin::GetWeather, ToolRegistry};
///
/// let mut registry = ToolRegistry::new();
/// registry.register(GetWeather).unwrap();
/// assert!(registry.register(GetWeather).is_err());
/// assert_eq!(registry.specs()[0].name, "get_weather");
/// ```
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool; fails with `DuplicateToolName` if the name is taken.
    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<&mut Self, RegistryError> {
        self.register_arc(Arc::new(tool))
    }

    /// Registers an already shared tool.
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> Result<&mut Self, RegistryError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateToolName(name));
        }
        tracing::debug!(tool = %name, "registered tool");
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(self)
    }

    /// Returns the tool registered under `name`.
    ///
    /// Every lookup returns the same shared instance.
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Tool>, RegistryError> {
        self.index
            .get(name)
            .map(|&i| Arc::clone(&self.tools[i]))
            .ok_or_else(|| RegistryError::UnknownTool(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Tools in registration order.
    pub fn list(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    /// Specs in registration order (what the model is told about).
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>())
            .finish()
    }
}
