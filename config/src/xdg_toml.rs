//! Load the `[env]` table from `$XDG_CONFIG_HOME/<app>/config.toml`.
//!
//! ```toml
//! [env]
//! LLM_BACKEND = "openai"
//! MAX_TURNS = "5"
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use crate::LoadError;

/// `$XDG_CONFIG_HOME` when set and non-empty, else the platform config dir.
fn config_home() -> Result<PathBuf, LoadError> {
    match std::env::var_os("XDG_CONFIG_HOME") {
        Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
        _ => dirs::config_dir()
            .ok_or_else(|| LoadError::XdgPath("no config directory for this platform".into())),
    }
}

/// Path of the app's `config.toml`, whether or not it exists.
pub fn config_path(app_name: &str) -> Result<PathBuf, LoadError> {
    Ok(config_home()?.join(app_name).join("config.toml"))
}

#[derive(serde::Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    env: HashMap<String, String>,
}

/// Key-value pairs from the `[env]` table. Missing file or section is an empty map.
pub fn load_env_map(app_name: &str) -> Result<HashMap<String, String>, LoadError> {
    let path = config_path(app_name)?;
    if !path.is_file() {
        return Ok(HashMap::new());
    }
    let content = std::fs::read_to_string(&path).map_err(LoadError::XdgRead)?;
    let config: ConfigFile = toml::from_str(&content)?;
    tracing::debug!(path = %path.display(), keys = config.env.len(), "read xdg config");
    Ok(config.env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_env::with_xdg_home;

    fn write_config(root: &std::path::Path, app: &str, body: &str) {
        let app_dir = root.join(app);
        std::fs::create_dir_all(&app_dir).unwrap();
        std::fs::write(app_dir.join("config.toml"), body).unwrap();
    }

    #[test]
    fn missing_config_returns_empty_map() {
        let dir = tempfile::tempdir().unwrap();
        let map = with_xdg_home(dir.path(), || load_env_map("weft")).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn reads_env_table() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), "weft", "[env]\nFOO = \"from_toml\"\nBAR = \"baz\"\n");
        let map = with_xdg_home(dir.path(), || load_env_map("weft")).unwrap();
        assert_eq!(map["FOO"], "from_toml");
        assert_eq!(map["BAR"], "baz");
    }

    #[test]
    fn config_without_env_section_returns_empty_map() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), "weft", "[other]\nkey = \"ignored\"\n");
        let map = with_xdg_home(dir.path(), || load_env_map("weft")).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), "weft", "not valid toml [[[\n");
        let result = with_xdg_home(dir.path(), || load_env_map("weft"));
        assert!(matches!(result, Err(LoadError::XdgParse(_))));
    }

    #[test]
    fn config_path_uses_xdg_home() {
        let dir = tempfile::tempdir().unwrap();
        let path = with_xdg_home(dir.path(), || config_path("weft")).unwrap();
        assert_eq!(path, dir.path().join("weft").join("config.toml"));
    }
}
