//! Current time as an ISO-8601 string.

use async_trait::async_trait;
use chrono::{Local, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::tools::{parse_args, Tool, ToolError, ToolSpec};

/// Tool name for the clock.
pub const TOOL_CURRENT_TIME: &str = "current_time";

/// Returns the current time; `tz = "utc"` for UTC, anything else for local time.
pub struct CurrentTime;

#[derive(Deserialize)]
struct TimeArgs {
    #[serde(default = "default_tz")]
    tz: String,
}

fn default_tz() -> String {
    "local".to_string()
}

pub fn now_iso(tz: &str) -> String {
    if tz.eq_ignore_ascii_case("utc") {
        Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
    } else {
        Local::now().to_rfc3339_opts(SecondsFormat::Micros, false)
    }
}

#[async_trait]
impl Tool for CurrentTime {
    fn name(&self) -> &str {
        TOOL_CURRENT_TIME
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            TOOL_CURRENT_TIME,
            "Return the current time as ISO-8601. tz='utc' returns UTC time.",
            json!({
                "type": "object",
                "properties": {
                    "tz": {
                        "type": "string",
                        "description": "'local' (default) or 'utc'.",
                        "enum": ["local", "utc"]
                    }
                }
            }),
        )
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let args: TimeArgs = if args.is_null() {
            TimeArgs { tz: default_tz() }
        } else {
            parse_args(args)?
        };
        Ok(Value::String(now_iso(&args.tz)))
    }
}
