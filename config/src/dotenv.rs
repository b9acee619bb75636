//! Parse a project `.env` file into a key-value map (applied in lib, never overwriting).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// `.env` in `override_dir` if given, else in the current directory.
fn dotenv_path(override_dir: Option<&Path>) -> Option<PathBuf> {
    let dir = override_dir
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())?;
    let path = dir.join(".env");
    path.is_file().then_some(path)
}

/// Removes one pair of surrounding quotes; double quotes also unescape `\"`.
fn unquote(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        return value[1..value.len() - 1].replace("\\\"", "\"");
    }
    if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        return value[1..value.len() - 1].to_string();
    }
    value.to_string()
}

/// Minimal .env parser: `KEY=VALUE` lines, optionally prefixed with `export`.
///
/// * Blank lines and lines starting with `#` are skipped; `#` inside a value is kept.
/// * Lines without `=` or with an empty key are skipped.
/// * Later duplicates win.
/// * No multiline values or line continuation.
pub(crate) fn parse_dotenv(content: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line
            .strip_prefix("export ")
            .map(str::trim_start)
            .unwrap_or(line);
        let Some((k, v)) = line.split_once('=') else {
            continue;
        };
        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        out.insert(key.to_string(), unquote(v.trim()));
    }
    out
}

/// Loads `.env` from `override_dir` or the current directory. A missing file is an empty map.
pub fn load_env_map(override_dir: Option<&Path>) -> std::io::Result<HashMap<String, String>> {
    let Some(path) = dotenv_path(override_dir) else {
        return Ok(HashMap::new());
    };
    let content = std::fs::read_to_string(&path)?;
    tracing::debug!(path = %path.display(), "read .env");
    Ok(parse_dotenv(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple() {
        let m = parse_dotenv("LLM_BACKEND=openai\nMAX_TURNS=3\n");
        assert_eq!(m.get("LLM_BACKEND").map(String::as_str), Some("openai"));
        assert_eq!(m.get("MAX_TURNS").map(String::as_str), Some("3"));
    }

    #[test]
    fn skip_comments_blank_and_malformed() {
        let m = parse_dotenv("\n# comment\nKEY=val\n  \nNOT_A_PAIR\n=orphan\n");
        assert_eq!(m.len(), 1);
        assert_eq!(m.get("KEY").map(String::as_str), Some("val"));
    }

    #[test]
    fn quotes_are_stripped() {
        let m = parse_dotenv(
            "A=\"hello world\"\nB='single quoted'\nC=\"say \\\"hi\\\"\"\nD=\"\"\nE=\n",
        );
        assert_eq!(m["A"], "hello world");
        assert_eq!(m["B"], "single quoted");
        assert_eq!(m["C"], "say \"hi\"");
        assert_eq!(m["D"], "");
        assert_eq!(m["E"], "");
    }

    /// **Scenario**: shell-style `export KEY=VALUE` lines are accepted.
    #[test]
    fn export_prefix_is_ignored() {
        let m = parse_dotenv("export OPENAI_API_KEY=sk-test\nexport   MODEL = gpt-4o\n");
        assert_eq!(m["OPENAI_API_KEY"], "sk-test");
        assert_eq!(m["MODEL"], "gpt-4o");
    }

    #[test]
    fn hash_inside_value_is_kept() {
        let m = parse_dotenv("REACT_SYSTEM_PROMPT=Answer #1 only\n");
        assert_eq!(m["REACT_SYSTEM_PROMPT"], "Answer #1 only");
    }

    #[test]
    fn later_duplicate_wins() {
        let m = parse_dotenv("K=1\nK=2\n");
        assert_eq!(m["K"], "2");
    }

    #[test]
    fn load_env_map_missing_file_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_env_map(Some(dir.path())).unwrap().is_empty());
    }

    #[test]
    fn load_env_map_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "A=1\nB=2\n").unwrap();
        let m = load_env_map(Some(dir.path())).unwrap();
        assert_eq!(m["A"], "1");
        assert_eq!(m["B"], "2");
    }
}
