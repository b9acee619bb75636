//! Web search via the DuckDuckGo Instant Answer API or Google Custom Search.
//!
//! Uses [`reqwest::Client`] for HTTP. Google requires `GOOGLE_CSE_API_KEY` and
//! `GOOGLE_CSE_ID` in the environment. Results are `{title, link, snippet}` objects.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::tools::{parse_args, Tool, ToolError, ToolSpec};

/// Tool name for web search.
pub const TOOL_WEB_SEARCH: &str = "web_search";

const DUCKDUCKGO_API: &str = "https://api.duckduckgo.com/";
const GOOGLE_CSE_API: &str = "https://www.googleapis.com/customsearch/v1";

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

/// Searches the web with a pluggable engine (`duckduckgo` or `google`).
pub struct WebSearch {
    client: reqwest::Client,
}

impl WebSearch {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Creates the tool with a custom HTTP client (timeouts, proxies).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn get_json(&self, req: reqwest::RequestBuilder) -> Result<Value, ToolError> {
        let response = req
            .send()
            .await
            .map_err(|e| ToolError::Failed(format!("request failed: {}", e)))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::Failed(format!("API error {}: {}", status, body)));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| ToolError::Failed(format!("failed to read response: {}", e)))
    }

    async fn duckduckgo(&self, query: &str, max_results: usize) -> Result<Vec<WebHit>, ToolError> {
        let req = self.client.get(DUCKDUCKGO_API).query(&[
            ("q", query),
            ("format", "json"),
            ("no_html", "1"),
            ("skip_disambig", "1"),
        ]);
        let body = self.get_json(req).await?;
        Ok(parse_duckduckgo(&body, query, max_results))
    }

    async fn google(&self, query: &str, max_results: usize) -> Result<Vec<WebHit>, ToolError> {
        let key = std::env::var("GOOGLE_CSE_API_KEY").ok();
        let cx = std::env::var("GOOGLE_CSE_ID").ok();
        let (Some(key), Some(cx)) = (key, cx) else {
            return Err(ToolError::Failed(
                "Google CSE not configured: set GOOGLE_CSE_API_KEY and GOOGLE_CSE_ID".to_string(),
            ));
        };
        // The API caps `num` at 10.
        let num = max_results.clamp(1, 10).to_string();
        let req = self.client.get(GOOGLE_CSE_API).query(&[
            ("key", key.as_str()),
            ("cx", cx.as_str()),
            ("q", query),
            ("num", num.as_str()),
        ]);
        let body = self.get_json(req).await?;
        Ok(parse_google(&body, max_results))
    }
}

impl Default for WebSearch {
    fn default() -> Self {
        Self::new()
    }
}

fn str_field<'a>(v: &'a Value, key: &str) -> &'a str {
    v.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Extracts hits from a DuckDuckGo Instant Answer body: the abstract first,
/// then related topics that carry a URL.
pub fn parse_duckduckgo(body: &Value, query: &str, max_results: usize) -> Vec<WebHit> {
    let mut hits = Vec::new();
    let abstract_url = str_field(body, "AbstractURL");
    if !abstract_url.is_empty() {
        let heading = str_field(body, "Heading");
        hits.push(WebHit {
            title: if heading.is_empty() { query } else { heading }.to_string(),
            link: abstract_url.to_string(),
            snippet: str_field(body, "AbstractText").to_string(),
        });
    }
    let topics = body
        .get("RelatedTopics")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for topic in topics.iter().take(max_results.saturating_mul(2)) {
        let link = str_field(topic, "FirstURL");
        if link.is_empty() {
            continue;
        }
        let text = str_field(topic, "Text");
        let result = str_field(topic, "Result");
        hits.push(WebHit {
            title: text.to_string(),
            link: link.to_string(),
            snippet: if result.is_empty() { text } else { result }.to_string(),
        });
    }
    hits.truncate(max_results);
    hits
}

/// Extracts hits from a Google Custom Search body (`items[]`).
pub fn parse_google(body: &Value, max_results: usize) -> Vec<WebHit> {
    body.get("items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .take(max_results)
                .map(|item| WebHit {
                    title: str_field(item, "title").to_string(),
                    link: str_field(item, "link").to_string(),
                    snippet: str_field(item, "snippet").to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Deserialize)]
struct WebSearchArgs {
    query: String,
    #[serde(default = "default_engine")]
    engine: String,
    #[serde(default = "default_max_results")]
    max_results: usize,
}

fn default_engine() -> String {
    "duckduckgo".to_string()
}

fn default_max_results() -> usize {
    5
}

#[async_trait]
impl Tool for WebSearch {
    fn name(&self) -> &str {
        TOOL_WEB_SEARCH
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            TOOL_WEB_SEARCH,
            "Search the web. Returns a list of {title, link, snippet}. Engines: 'duckduckgo' \
             (default, no key) or 'google' (needs GOOGLE_CSE_API_KEY and GOOGLE_CSE_ID).",
            json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search query." },
                    "engine": {
                        "type": "string",
                        "enum": ["duckduckgo", "google"],
                        "description": "Search engine. Default duckduckgo."
                    },
                    "max_results": { "type": "integer", "minimum": 1, "description": "Maximum results. Default 5." }
                },
                "required": ["query"]
            }),
        )
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let args: WebSearchArgs = parse_args(args)?;
        if args.query.trim().is_empty() {
            return Err(ToolError::InvalidArguments(
                "query cannot be empty".to_string(),
            ));
        }
        let hits = match args.engine.to_lowercase().as_str() {
            "duckduckgo" | "ddg" => self.duckduckgo(&args.query, args.max_results).await?,
            "google" => self.google(&args.query, args.max_results).await?,
            other => {
                return Err(ToolError::InvalidArguments(format!(
                    "unsupported engine '{}': use duckduckgo or google",
                    other
                )))
            }
        };
        serde_json::to_value(hits).map_err(|e| ToolError::Failed(e.to_string()))
    }
}
