//! Toy weather lookup used by the demo conversation and the mock model.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::tools::{parse_args, Tool, ToolError, ToolSpec};

/// Tool name for the weather lookup.
pub const TOOL_GET_WEATHER: &str = "get_weather";

/// Returns a canned forecast: sunny for San Francisco, "not sure" elsewhere.
pub struct GetWeather;

#[derive(Deserialize)]
struct WeatherArgs {
    location: String,
}

/// Forecast text for `location` (case-insensitive match on "sf" / "san francisco").
pub fn forecast(location: &str) -> String {
    let lower = location.to_lowercase();
    if lower.contains("sf") || lower.contains("san francisco") {
        "It's sunny in San Francisco, but you better look out if you're a Gemini .".to_string()
    } else {
        format!("I am not sure what the weather is in {}.", location)
    }
}

#[async_trait]
impl Tool for GetWeather {
    fn name(&self) -> &str {
        TOOL_GET_WEATHER
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            TOOL_GET_WEATHER,
            "Get the current weather for a location.",
            json!({
                "type": "object",
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "City or place name, e.g. 'sf' or 'San Francisco'."
                    }
                },
                "required": ["location"]
            }),
        )
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let args: WeatherArgs = parse_args(args)?;
        Ok(Value::String(forecast(&args.location)))
    }
}
