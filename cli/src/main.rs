//! weft CLI binary: run the tool-augmented agent loop from the command line.
//!
//! `weft "question"` runs one conversation with the backend chosen by `LLM_BACKEND`
//! (mock by default). `--simulate-tool` and `--web` run the offline weather demo and the
//! web search demo; `weft tool list|show` prints the tool catalog.

mod logging;

use std::io::Write;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use weft::tools::builtin::default_registry;
use weft::{LlmBackend, RunError};
use weft_cli::{
    build_runner, list_tools, run_agent, show_tool, web_search_demo, CliError, RunOptions,
    ToolShowFormat, DEMO_PROMPT, DEMO_WEB_QUERY,
};

#[derive(Parser, Debug)]
#[command(name = "weft")]
#[command(about = "weft: tool-augmented agent loop (model -> tools -> model)")]
struct Args {
    #[command(subcommand)]
    cmd: Option<Command>,

    /// User message (or pass as positional arguments)
    #[arg(short, long, value_name = "TEXT")]
    message: Option<String>,

    /// Positional args: user message when -m/--message is not used
    #[arg(trailing_var_arg = true)]
    rest: Vec<String>,

    /// Run the weather demo with the mock model, then call web_search directly
    #[arg(long)]
    simulate_tool: bool,

    /// Run the web_search demo only (DuckDuckGo, needs network)
    #[arg(long)]
    web: bool,

    /// Model backend: mock, openai or ollama (default: LLM_BACKEND or mock)
    #[arg(long, value_name = "NAME", env = "LLM_BACKEND")]
    backend: Option<String>,

    /// Log node enter/exit to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Output JSON: one object per message plus a reply line; JSON for tool list/show
    #[arg(long)]
    json: bool,

    /// Truncate printed message contents to this many chars (0 = no limit)
    #[arg(long, value_name = "N", default_value_t = 0)]
    max_len: usize,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// List or show tool definitions (the tools bound to the model)
    Tool(ToolArgs),
}

#[derive(clap::Args, Debug, Clone)]
struct ToolArgs {
    #[command(subcommand)]
    sub: ToolCommand,
}

#[derive(Subcommand, Debug, Clone)]
enum ToolCommand {
    /// List all tools (name and description)
    List,
    /// Show full definition of one tool (name, description, input_schema)
    Show(ShowToolArgs),
}

#[derive(clap::Args, Debug, Clone)]
struct ShowToolArgs {
    /// Tool name (e.g. calc, web_search)
    name: String,
    /// Output format: yaml (default) or json
    #[arg(long, value_name = "FORMAT", default_value = "yaml")]
    output: String,
}

impl Args {
    fn user_message(&self) -> String {
        self.message
            .clone()
            .or_else(|| (!self.rest.is_empty()).then(|| self.rest.join(" ")))
            .unwrap_or_else(|| DEMO_PROMPT.to_string())
    }

    fn run_options(&self) -> Result<RunOptions, CliError> {
        let backend = self
            .backend
            .as_deref()
            .map(str::parse::<LlmBackend>)
            .transpose()
            .map_err(CliError::Config)?;
        Ok(RunOptions {
            message: self.user_message(),
            verbose: self.verbose,
            json: self.json,
            backend,
            max_display_len: self.max_len,
        })
    }
}

fn tool_command(args: &Args, ta: &ToolArgs) -> Result<(), CliError> {
    let registry = default_registry()?;
    let text = match &ta.sub {
        ToolCommand::List => list_tools(&registry, args.json)?,
        ToolCommand::Show(show) => {
            let format = if args.json {
                ToolShowFormat::Json
            } else {
                ToolShowFormat::parse(&show.output)
            };
            show_tool(&registry, &show.name, format)?
        }
    };
    println!("{}", text.trim_end());
    Ok(())
}

/// Cancels `cancel` on the first Ctrl-C.
fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("ctrl-c received; cancelling run");
            cancel.cancel();
        }
    });
}

async fn run(args: &Args) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();

    if args.web {
        writeln!(stdout, "Running web_search demo (DuckDuckGo)...")?;
        return web_search_demo(DEMO_WEB_QUERY, 5, &mut stdout).await;
    }

    let mut opts = args.run_options()?;
    if args.simulate_tool {
        opts.backend = Some(LlmBackend::Mock);
        opts.message = DEMO_PROMPT.to_string();
        writeln!(stdout, "--- Running simulated tool-call demo ---")?;
    }

    let runner = build_runner(&opts)?;
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());
    run_agent(&runner, &opts, cancel, &mut stdout).await?;

    if args.simulate_tool {
        writeln!(stdout, "--- Running web_search demo (direct tool call) ---")?;
        web_search_demo(DEMO_WEB_QUERY, 10, &mut stdout).await?;
    }
    stdout.flush()?;
    Ok(())
}

/// Prints the error and, for a run that stopped early, what it had so far.
fn report(e: &CliError) -> ExitCode {
    eprintln!("weft: {}", e);
    if let CliError::Run(run_error) = e {
        if let Some(state) = run_error.partial_state() {
            eprintln!(
                "partial run: {} messages, {} tool round trips",
                state.messages().len(),
                state.tool_rounds()
            );
        }
        if matches!(run_error, RunError::Cancelled { .. }) {
            return ExitCode::from(130);
        }
    }
    ExitCode::FAILURE
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = weft_config::load_and_apply("weft", None) {
        eprintln!("weft: config: {}", e);
    }
    if let Err(e) = logging::init() {
        eprintln!("weft: logging: {}", e);
    }

    let args = Args::parse();
    let result = match &args.cmd {
        Some(Command::Tool(ta)) => tool_command(&args, ta),
        None => run(&args).await,
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}
