//! Configuration for the agent loop.

use std::time::Duration;

use super::DEFAULT_SYSTEM_PROMPT;

/// Loop settings shared by every run of one `ReactRunner`.
#[derive(Clone, Debug, PartialEq)]
pub struct ReactConfig {
    /// Call-scoped system instruction prepended to every model call.
    pub system_prompt: String,
    /// Maximum model→tools round trips per run.
    pub max_turns: usize,
    /// Per model call; `None` disables the timeout.
    pub model_timeout: Option<Duration>,
    /// Per tool call; `None` disables the timeout.
    pub tool_timeout: Option<Duration>,
    /// Tool calls of one assistant message that may run at once (at least 1).
    pub tool_concurrency: usize,
    /// Log node enter/exit lines to stderr.
    pub verbose: bool,
}

impl Default for ReactConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_turns: 10,
            model_timeout: Some(Duration::from_secs(60)),
            tool_timeout: Some(Duration::from_secs(30)),
            tool_concurrency: 4,
            verbose: false,
        }
    }
}

fn parse_secs(v: Option<String>, default: Option<Duration>) -> Option<Duration> {
    match v.and_then(|s| s.trim().parse::<u64>().ok()) {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => default,
    }
}

impl ReactConfig {
    /// Builds config from environment variables: `REACT_SYSTEM_PROMPT`, `MAX_TURNS`,
    /// `MODEL_TIMEOUT_SECS`, `TOOL_TIMEOUT_SECS` (0 disables), `TOOL_CONCURRENCY`, `VERBOSE`.
    /// Missing or unparsable values keep the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with a custom variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        Self {
            system_prompt: var("REACT_SYSTEM_PROMPT")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(d.system_prompt),
            max_turns: var("MAX_TURNS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(d.max_turns),
            model_timeout: parse_secs(var("MODEL_TIMEOUT_SECS"), d.model_timeout),
            tool_timeout: parse_secs(var("TOOL_TIMEOUT_SECS"), d.tool_timeout),
            tool_concurrency: var("TOOL_CONCURRENCY")
                .and_then(|s| s.trim().parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(d.tool_concurrency),
            verbose: var("VERBOSE")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(d.verbose),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_model_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.model_timeout = timeout;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_tool_concurrency(mut self, n: usize) -> Self {
        self.tool_concurrency = n.max(1);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Node executions allowed per run: `max_turns` full round trips plus the final
    /// model step that answers without tools.
    pub fn recursion_limit(&self) -> usize {
        self.max_turns.saturating_mul(2).saturating_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults() {
        let c = ReactConfig::from_lookup(lookup(&[]));
        assert_eq!(c, ReactConfig::default());
        assert_eq!(c.max_turns, 10);
        assert_eq!(c.recursion_limit(), 21);
        assert_eq!(c.system_prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn env_overrides_and_zero_disables_timeouts() {
        let c = ReactConfig::from_lookup(lookup(&[
            ("REACT_SYSTEM_PROMPT", "Be terse."),
            ("MAX_TURNS", "3"),
            ("MODEL_TIMEOUT_SECS", "0"),
            ("TOOL_TIMEOUT_SECS", "5"),
            ("TOOL_CONCURRENCY", "0"),
            ("VERBOSE", "true"),
        ]));
        assert_eq!(c.system_prompt, "Be terse.");
        assert_eq!(c.max_turns, 3);
        assert_eq!(c.recursion_limit(), 7);
        assert_eq!(c.model_timeout, None);
        assert_eq!(c.tool_timeout, Some(Duration::from_secs(5)));
        assert_eq!(c.tool_concurrency, 4);
        assert!(c.verbose);
    }

    #[test]
    fn garbage_values_keep_defaults() {
        let c = ReactConfig::from_lookup(lookup(&[("MAX_TURNS", "many"), ("TOOL_TIMEOUT_SECS", "x")]));
        assert_eq!(c.max_turns, 10);
        assert_eq!(c.tool_timeout, Some(Duration::from_secs(30)));
    }
}
