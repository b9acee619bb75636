//! Backend selection: which `LlmClient` a process uses.
//!
//! `LLM_BACKEND` picks `mock` (default, offline), `openai` or `ollama` (OpenAI-compatible
//! endpoint of a local Ollama daemon). Settings are read once at startup into
//! [`LlmConfig`]; [`build_llm`] turns them into a shared client.

use std::str::FromStr;
use std::sync::Arc;

use async_openai::config::OpenAIConfig;

use crate::llm::{ChatOpenAI, LlmClient, LlmError, MockLlm, ToolChoiceMode};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OLLAMA_MODEL: &str = "mistral-7b-instruct";
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

/// Model provider family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LlmBackend {
    #[default]
    Mock,
    OpenAi,
    Ollama,
}

impl FromStr for LlmBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mock" | "" => Ok(Self::Mock),
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(format!(
                "unknown LLM_BACKEND: {} (use mock, openai, or ollama)",
                other
            )),
        }
    }
}

/// Model settings, usually from the environment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    /// Model name; backend default when `None`.
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub tool_choice: ToolChoiceMode,
}

impl LlmConfig {
    /// Reads `LLM_BACKEND`, `MODEL` / `OPENAI_MODEL` / `OLLAMA_MODEL`, `OPENAI_API_KEY`,
    /// `OPENAI_BASE_URL` / `OLLAMA_BASE_URL`, `OPENAI_TEMP` and `TOOL_CHOICE`.
    ///
    /// Unknown backend or tool choice values are an error; an unparsable temperature
    /// is ignored.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with a custom variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let get = |key: &str| var(key).filter(|v| !v.trim().is_empty());
        let backend = match get("LLM_BACKEND") {
            Some(v) => v.parse()?,
            None => LlmBackend::Mock,
        };
        let (model, base_url) = match backend {
            LlmBackend::Ollama => (
                get("OLLAMA_MODEL").or_else(|| get("MODEL")),
                get("OLLAMA_BASE_URL"),
            ),
            _ => (
                get("MODEL").or_else(|| get("OPENAI_MODEL")),
                get("OPENAI_BASE_URL"),
            ),
        };
        let tool_choice = match get("TOOL_CHOICE") {
            Some(v) => v.parse()?,
            None => ToolChoiceMode::default(),
        };
        Ok(Self {
            backend,
            model,
            api_key: get("OPENAI_API_KEY"),
            base_url,
            temperature: get("OPENAI_TEMP").and_then(|v| v.parse().ok()),
            tool_choice,
        })
    }

    pub fn with_backend(mut self, backend: LlmBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Model name actually used (explicit or backend default).
    pub fn model_name(&self) -> &str {
        match (&self.model, self.backend) {
            (Some(m), _) => m.as_str(),
            (None, LlmBackend::Mock) => "mock",
            (None, LlmBackend::OpenAi) => DEFAULT_OPENAI_MODEL,
            (None, LlmBackend::Ollama) => DEFAULT_OLLAMA_MODEL,
        }
    }
}

/// Builds the client for `config`.
///
/// Fails for `openai` without an API key, so a misconfigured process stops at
/// startup rather than answering every turn with an error message.
pub fn build_llm(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    match config.backend {
        LlmBackend::Mock => Ok(Arc::new(MockLlm::new())),
        LlmBackend::OpenAi => {
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| LlmError::Request("OPENAI_API_KEY is not set".to_string()))?;
            let mut openai = OpenAIConfig::new().with_api_key(api_key);
            if let Some(base) = &config.base_url {
                openai = openai.with_api_base(base.clone());
            }
            let mut client = ChatOpenAI::with_config(openai, config.model_name())
                .with_tool_choice(config.tool_choice);
            if let Some(base) = &config.base_url {
                client = client.with_logged_base(base.clone());
            }
            if let Some(t) = config.temperature {
                client = client.with_temperature(t);
            }
            Ok(Arc::new(client))
        }
        LlmBackend::Ollama => {
            let base = config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_OLLAMA_BASE_URL.to_string());
            // Ollama ignores the key but the client requires one.
            let openai = OpenAIConfig::new()
                .with_api_key(config.api_key.clone().unwrap_or_else(|| "ollama".to_string()))
                .with_api_base(base.clone());
            let mut client = ChatOpenAI::with_config(openai, config.model_name())
                .with_tool_choice(config.tool_choice)
                .with_logged_base(base);
            if let Some(t) = config.temperature {
                client = client.with_temperature(t);
            }
            Ok(Arc::new(client))
        }
    }
}
