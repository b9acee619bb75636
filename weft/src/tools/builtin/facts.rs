//! Random fact from a small local set, for demos.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::tools::{parse_args, Tool, ToolError, ToolSpec};

/// Tool name for random facts.
pub const TOOL_RANDOM_FACT: &str = "random_fact";

const SPACE: &[&str] = &[
    "A day on Venus is longer than its year.",
    "There are more stars in the universe than grains of sand on Earth.",
    "Neutron stars can spin at hundreds of times per second.",
];

const ANIMALS: &[&str] = &[
    "Octopuses have three hearts.",
    "Cows have best friends and get stressed when separated.",
];

/// Facts for `category`; unknown categories draw from every category.
pub fn facts_for(category: &str) -> Vec<&'static str> {
    match category.to_lowercase().as_str() {
        "space" => SPACE.to_vec(),
        "animals" => ANIMALS.to_vec(),
        _ => SPACE.iter().chain(ANIMALS).copied().collect(),
    }
}

/// Returns one random fact for a category (`space`, `animals`).
pub struct RandomFact;

#[derive(Deserialize)]
struct FactArgs {
    #[serde(default = "default_category")]
    category: String,
}

fn default_category() -> String {
    "space".to_string()
}

#[async_trait]
impl Tool for RandomFact {
    fn name(&self) -> &str {
        TOOL_RANDOM_FACT
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            TOOL_RANDOM_FACT,
            "Return a random fact from a small local set of facts.",
            json!({
                "type": "object",
                "properties": {
                    "category": {
                        "type": "string",
                        "description": "Fact category: 'space' (default) or 'animals'."
                    }
                }
            }),
        )
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let args: FactArgs = if args.is_null() {
            FactArgs {
                category: default_category(),
            }
        } else {
            parse_args(args)?
        };
        let pool = facts_for(&args.category);
        let fact = pool
            .choose(&mut rand::thread_rng())
            .ok_or_else(|| ToolError::Failed("no facts available".to_string()))?;
        Ok(Value::String((*fact).to_string()))
    }
}
