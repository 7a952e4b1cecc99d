//! DevQuest AI orchestration CLI entry point.
//!
//! Binary name: `dq`
//!
//! Parses CLI arguments, installs tracing, builds the provider registry and
//! executor from `config.toml` plus environment credentials, then dispatches
//! to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use devquest_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need tracing or app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "dq", &mut std::io::stdout());
        return Ok(());
    }

    let tracing_options = TracingOptions {
        json: cli.log_json,
        enable_otel: cli.otel,
        ..TracingOptions::from_verbosity(cli.verbose, cli.quiet)
    };
    init_tracing(&tracing_options).map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init().await?;

    match cli.command {
        Commands::Providers => cli::provider::list_providers(&state, cli.json),
        Commands::Select { task, prefer } => {
            cli::provider::preview_selection(&state, task, prefer.as_deref(), cli.json)
        }
        Commands::Check { provider } => {
            cli::provider::check_providers(&state, provider.as_deref(), cli.json).await
        }
        Commands::Compose(args) => cli::project::compose(&args, cli.json).await,
        Commands::Ask(args) => cli::ask::ask(&state, args, cli.json).await,
        Commands::Analyze(args) => cli::ask::analyze(&state, args, cli.json).await,
        Commands::Chat(args) => cli::chat::run_chat_loop(&state, args).await,
        Commands::Completions { .. } => unreachable!("handled above"),
    }
}
