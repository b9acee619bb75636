//! Case-insensitive line search over text files under a directory.
//!
//! Walks `path` with `walkdir` on the blocking pool and returns the first
//! `max_results` matching lines as `{file, line, snippet}` objects.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use walkdir::WalkDir;

use crate::tools::{parse_args, Tool, ToolError, ToolSpec};

/// Tool name for local file search.
pub const TOOL_LOCAL_SEARCH: &str = "local_search";

const SEARCHED_EXTENSIONS: &[&str] = &["py", "md", "txt", "rst", "rs"];

/// One matching line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub file: String,
    pub line: usize,
    pub snippet: String,
}

/// Searches project files for a query string.
pub struct LocalSearch;

#[derive(Deserialize)]
struct LocalSearchArgs {
    query: String,
    #[serde(default = "default_path")]
    path: String,
    #[serde(default = "default_max_results")]
    max_results: usize,
}

fn default_path() -> String {
    ".".to_string()
}

fn default_max_results() -> usize {
    5
}

fn is_searched(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SEARCHED_EXTENSIONS.contains(&e))
}

/// Blocking search; files that cannot be opened are skipped, non-UTF-8 lines are decoded lossily.
pub fn search(root: &Path, query: &str, max_results: usize) -> Vec<SearchHit> {
    let needle = query.to_lowercase();
    let mut hits = Vec::new();
    if max_results == 0 {
        return hits;
    }
    let files = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && is_searched(e.path()));
    for entry in files {
        let Ok(file) = std::fs::File::open(entry.path()) else {
            continue;
        };
        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();
        let mut line_no = 0;
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            line_no += 1;
            let line = String::from_utf8_lossy(&buf);
            if line.to_lowercase().contains(&needle) {
                hits.push(SearchHit {
                    file: entry.path().display().to_string(),
                    line: line_no,
                    snippet: line.trim().to_string(),
                });
                if hits.len() >= max_results {
                    return hits;
                }
            }
        }
    }
    hits
}

#[async_trait]
impl Tool for LocalSearch {
    fn name(&self) -> &str {
        TOOL_LOCAL_SEARCH
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            TOOL_LOCAL_SEARCH,
            "Search project files (.py, .md, .txt, .rst, .rs) for a query and return matching \
             lines as {file, line, snippet}.",
            json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Text to look for (case-insensitive)." },
                    "path": { "type": "string", "description": "Directory to search. Default '.'." },
                    "max_results": { "type": "integer", "minimum": 1, "description": "Maximum matches. Default 5." }
                },
                "required": ["query"]
            }),
        )
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let args: LocalSearchArgs = parse_args(args)?;
        if args.query.trim().is_empty() {
            return Err(ToolError::InvalidArguments(
                "query cannot be empty".to_string(),
            ));
        }
        let root = PathBuf::from(&args.path);
        if !root.is_dir() {
            return Err(ToolError::Failed(format!(
                "not a directory: {}",
                args.path
            )));
        }
        let hits = tokio::task::spawn_blocking(move || search(&root, &args.query, args.max_results))
            .await
            .map_err(|e| ToolError::Failed(format!("search task failed: {}", e)))?;
        serde_json::to_value(hits).map_err(|e| ToolError::Failed(e.to_string()))
    }
}
