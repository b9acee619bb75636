//! Demo tools shipped with the CLI.
//!
//! [`default_registry`] registers all six in a fixed order: `get_weather`,
//! `local_search`, `calc`, `current_time`, `random_fact`, `web_search`.

mod calc;
mod clock;
mod facts;
mod local_search;
mod weather;
mod web_search;

pub use calc::{evaluate, Calc, Number, TOOL_CALC};
pub use clock::{now_iso, CurrentTime, TOOL_CURRENT_TIME};
pub use facts::{facts_for, RandomFact, TOOL_RANDOM_FACT};
pub use local_search::{search as search_files, LocalSearch, SearchHit, TOOL_LOCAL_SEARCH};
pub use weather::{forecast, GetWeather, TOOL_GET_WEATHER};
pub use web_search::{parse_duckduckgo, parse_google, WebHit, WebSearch, TOOL_WEB_SEARCH};

use crate::tools::{RegistryError, ToolRegistry};

/// Registry with every builtin tool.
///
/// # Examples
///
/// ```
/// let registry = weft::tools::builtin::default_registry().unwrap();
/// let names: Vec<_> = registry.specs().into_iter().map(|s| s.name).collect();
/// assert_eq!(
///     names,
///     ["get_weather", "local_search", "calc", "current_time", "random_fact", "web_search"]
/// );
/// ```
pub fn default_registry() -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();
    registry
        .register(GetWeather)?
        .register(LocalSearch)?
        .register(Calc)?
        .register(CurrentTime)?
        .register(RandomFact)?
        .register(WebSearch::new())?;
    Ok(registry)
}
