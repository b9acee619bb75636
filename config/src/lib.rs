//! Load configuration from XDG `config.toml` and a project `.env`, then apply it to the
//! process environment with priority: **existing env > .env > XDG**.
//!
//! Everything the agent reads at startup (`LLM_BACKEND`, `OPENAI_API_KEY`, `MAX_TURNS`,
//! ...) is an environment variable, so this crate only has to decide which source wins
//! for keys the process does not already have.

mod dotenv;
mod xdg_toml;

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use thiserror::Error;

pub use xdg_toml::config_path;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    DotenvRead(std::io::Error),
}

/// Values to set for keys that `is_set` reports missing: `.env` first, then XDG.
///
/// Sorted by key so application order is deterministic.
pub fn resolve(
    dotenv: &HashMap<String, String>,
    xdg: &HashMap<String, String>,
    is_set: impl Fn(&str) -> bool,
) -> BTreeMap<String, String> {
    xdg.iter()
        .chain(dotenv.iter())
        .filter(|(key, _)| !is_set(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Loads XDG `config.toml` and the optional project `.env`, then sets environment
/// variables only for keys that are **not** already set. Returns the keys it set.
///
/// Order of precedence when a key is missing in the process environment:
/// 1. Value from project `.env` (current directory, or `override_dir` if given)
/// 2. Value from `$XDG_CONFIG_HOME/<app_name>/config.toml` `[env]` table
///
/// * `app_name`: e.g. `"weft"`, giving `~/.config/weft/config.toml`.
/// * `override_dir`: if `Some`, look for `.env` there instead of the current directory.
///
/// Call this before spawning threads: it mutates the process environment.
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<Vec<String>, LoadError> {
    let xdg_map = xdg_toml::load_env_map(app_name)?;
    let dotenv_map = dotenv::load_env_map(override_dir).map_err(LoadError::DotenvRead)?;

    let resolved = resolve(&dotenv_map, &xdg_map, |key| std::env::var_os(key).is_some());
    let mut applied = Vec::with_capacity(resolved.len());
    for (key, value) in resolved {
        std::env::set_var(&key, value);
        applied.push(key);
    }
    tracing::debug!(applied = applied.len(), "config applied to environment");
    Ok(applied)
}

/// Serializes tests that touch `XDG_CONFIG_HOME` or other process-wide env vars.
#[cfg(test)]
pub(crate) mod test_env {
    use std::path::Path;
    use std::sync::Mutex;

    pub static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Runs `f` with `XDG_CONFIG_HOME` pointed at `dir`, restoring it afterwards.
    pub fn with_xdg_home<T>(dir: &Path, f: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let prev = std::env::var_os("XDG_CONFIG_HOME");
        std::env::set_var("XDG_CONFIG_HOME", dir);
        let out = f();
        match prev {
            Some(p) => std::env::set_var("XDG_CONFIG_HOME", p),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
        out
    }
}
