//! Library side of the `weft` binary: runner construction, transcript output and the
//! `tool` subcommand, kept here so they can be tested without spawning the binary.

pub mod display;
pub mod run;
pub mod tool_cmd;

pub use display::{format_message, format_web_hits, truncate_display};
pub use run::{
    build_runner, run_agent, web_search_demo, CliError, RunOptions, DEMO_PROMPT, DEMO_WEB_QUERY,
};
pub use tool_cmd::{list_tools, show_tool, ToolShowFormat};
