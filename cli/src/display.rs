//! Text formatting for the transcript and the web search demo.

use serde_json::Value;
use weft::Message;

/// Truncates a string to at most `max` chars; appends "..." when truncated. UTF-8 safe.
/// `max == 0` means no truncation.
pub fn truncate_display(s: &str, max: usize) -> String {
    const SUFFIX: &str = "...";
    if max == 0 || s.chars().count() <= max {
        return s.to_string();
    }
    if max <= SUFFIX.len() {
        return s.chars().take(max).collect();
    }
    format!(
        "{}{}",
        s.chars().take(max - SUFFIX.len()).collect::<String>(),
        SUFFIX
    )
}

/// One transcript line per message, e.g. `[tool get_weather] It's sunny ...`.
///
/// Assistant tool calls are listed after the text as `-> name(args)`.
pub fn format_message(m: &Message, max: usize) -> String {
    match m {
        Message::System { content } => format!("[system] {}", truncate_display(content, max)),
        Message::User { content } => format!("[user] {}", truncate_display(content, max)),
        Message::Assistant {
            content,
            tool_calls,
        } => {
            let mut line = format!("[assistant] {}", truncate_display(content, max));
            for call in tool_calls {
                line.push_str(&format!(
                    "\n  -> {}({})",
                    call.name,
                    truncate_display(&call.arguments.to_string(), max)
                ));
            }
            line
        }
        Message::Tool {
            content,
            name,
            is_error,
            ..
        } => {
            let tag = if *is_error { "tool error" } else { "tool" };
            format!("[{} {}] {}", tag, name, truncate_display(&render_tool_content(content), max))
        }
    }
}

/// Tool results are JSON; a JSON string prints bare, anything else as-is.
fn render_tool_content(content: &str) -> String {
    match serde_json::from_str::<Value>(content) {
        Ok(Value::String(s)) => s,
        _ => content.to_string(),
    }
}

/// Numbered list of `web_search` hits: title (or snippet), link, snippet.
pub fn format_web_hits(hits: &Value) -> String {
    let Some(items) = hits.as_array().filter(|a| !a.is_empty()) else {
        return "No results returned from web_search".to_string();
    };
    let field = |hit: &Value, key: &str| hit.get(key).and_then(Value::as_str).unwrap_or("").to_string();
    items
        .iter()
        .enumerate()
        .map(|(i, hit)| {
            let snippet = field(hit, "snippet");
            let title = Some(field(hit, "title"))
                .filter(|t| !t.is_empty())
                .or_else(|| Some(snippet.clone()).filter(|s| !s.is_empty()))
                .unwrap_or_else(|| "(no title)".to_string());
            format!(" {}. {}\n    {}\n    {}\n", i + 1, title, field(hit, "link"), snippet)
        })
        .collect()
}
