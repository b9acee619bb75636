//! Tool subcommand: list tools and show one tool definition.
//!
//! Reads the same `ToolRegistry` the runner binds to the model, so the output matches
//! what the model is offered.

use serde::Serialize;
use weft::{ToolRegistry, ToolSpec};

use crate::run::CliError;

/// Maximum length for description in the list table. Longer descriptions are truncated with "...".
const LIST_DESC_MAX_LEN: usize = 60;

/// Output format for `tool show`: YAML (human-readable) or JSON (machine-readable).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToolShowFormat {
    #[default]
    Yaml,
    Json,
}

impl ToolShowFormat {
    /// `json` (any case) selects JSON; anything else YAML.
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Yaml
        }
    }
}

/// Tool spec as printed: `input_schema` stays a JSON object in both formats.
#[derive(Serialize)]
struct ToolSpecOutput<'a> {
    name: &'a str,
    description: Option<&'a str>,
    input_schema: &'a serde_json::Value,
}

impl<'a> From<&'a ToolSpec> for ToolSpecOutput<'a> {
    fn from(spec: &'a ToolSpec) -> Self {
        Self {
            name: &spec.name,
            description: spec.description.as_deref(),
            input_schema: &spec.input_schema,
        }
    }
}

/// `NAME<TAB>DESCRIPTION` table (first description line, truncated), or a JSON array.
pub fn list_tools(registry: &ToolRegistry, json: bool) -> Result<String, CliError> {
    let specs = registry.specs();
    if json {
        let out: Vec<ToolSpecOutput<'_>> = specs.iter().map(ToolSpecOutput::from).collect();
        return serde_json::to_string_pretty(&out).map_err(|e| CliError::Serialize(e.to_string()));
    }

    let name_width = specs.iter().map(|t| t.name.len()).max().unwrap_or(4).max(4);
    let mut lines = vec![format!("{:<width$}\t{}", "NAME", "DESCRIPTION", width = name_width)];
    for spec in &specs {
        let desc = spec
            .description
            .as_deref()
            .unwrap_or("")
            .lines()
            .next()
            .unwrap_or("");
        let desc = if desc.chars().count() > LIST_DESC_MAX_LEN {
            format!("{}...", desc.chars().take(LIST_DESC_MAX_LEN).collect::<String>())
        } else {
            desc.to_string()
        };
        lines.push(format!("{:<width$}\t{}", spec.name, desc, width = name_width));
    }
    Ok(lines.join("\n"))
}

/// Full spec of one tool. Fails with `CliError::ToolNotFound` for unknown names.
pub fn show_tool(registry: &ToolRegistry, name: &str, format: ToolShowFormat) -> Result<String, CliError> {
    let tool = registry
        .lookup(name)
        .map_err(|_| CliError::ToolNotFound(name.to_string()))?;
    let spec = tool.spec();
    let out = ToolSpecOutput::from(&spec);
    match format {
        ToolShowFormat::Yaml => serde_yaml::to_string(&out).map_err(|e| CliError::Serialize(e.to_string())),
        ToolShowFormat::Json => {
            serde_json::to_string_pretty(&out).map_err(|e| CliError::Serialize(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft::tools::builtin::default_registry;

    #[test]
    fn list_table_has_header_and_every_tool() {
        let registry = default_registry().unwrap();
        let out = list_tools(&registry, false).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("NAME"));
        assert_eq!(lines.len(), registry.len() + 1);
        assert!(lines[1].starts_with("get_weather"));
        assert!(lines.iter().all(|l| l.split('\t').nth(1).map_or(true, |d| d.chars().count() <= LIST_DESC_MAX_LEN + 3)));
    }

    #[test]
    fn list_json_is_array_of_specs() {
        let registry = default_registry().unwrap();
        let value: serde_json::Value = serde_json::from_str(&list_tools(&registry, true).unwrap()).unwrap();
        let arr = value.as_array().unwrap();
        assert_eq!(arr.len(), registry.len());
        assert_eq!(arr[0]["name"], "get_weather");
        assert_eq!(arr[0]["input_schema"]["required"][0], "location");
    }

    #[test]
    fn show_yaml_and_json() {
        let registry = default_registry().unwrap();
        let yaml = show_tool(&registry, "calc", ToolShowFormat::Yaml).unwrap();
        assert!(yaml.contains("name: calc"));
        assert!(yaml.contains("input_schema:"));
        let json = show_tool(&registry, "calc", ToolShowFormat::parse("JSON")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "calc");
    }

    #[test]
    fn show_unknown_tool_fails() {
        let registry = default_registry().unwrap();
        let err = show_tool(&registry, "no_such_tool", ToolShowFormat::Json).unwrap_err();
        assert_eq!(err.to_string(), "tool not found: no_such_tool");
    }
}
