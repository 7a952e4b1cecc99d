//! CLI command definitions for the `dq` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod ask;
pub mod chat;
pub mod project;
pub mod provider;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use devquest_types::project::GddField;
use devquest_types::provider::TaskType;

/// AI provider orchestration for DevQuest game projects.
#[derive(Parser)]
#[command(name = "dq", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all log output.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true, env = "DEVQUEST_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the provider catalog with availability.
    #[command(alias = "ls")]
    Providers,

    /// Show which provider and model a task would use.
    Select {
        /// Task type: oracle, scope, kanban, assets, chat.
        #[arg(long, default_value = "chat")]
        task: TaskType,

        /// Preferred provider id.
        #[arg(long)]
        prefer: Option<String>,
    },

    /// Send a tiny request to available providers to verify credentials.
    Check {
        /// Only check this provider.
        #[arg(long)]
        provider: Option<String>,
    },

    /// Print the project context block that would be sent with prompts.
    Compose(ProjectArgs),

    /// Send one request.
    Ask(AskArgs),

    /// Run a structured analysis of a project.
    Analyze(AnalyzeArgs),

    /// Interactive conversation.
    Chat(ChatArgs),

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Where the project context comes from.
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Project file (TOML, or JSON by extension) shaped like a project context.
    #[arg(long, short = 'p')]
    pub project: Option<PathBuf>,

    /// Patch one GDD field, e.g. `--set genre=roguelite`. Repeatable; an
    /// empty value clears the field.
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = project::parse_field_assignment)]
    pub set: Vec<(GddField, String)>,
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// The request text.
    pub message: String,

    /// Task type: oracle, scope, kanban, assets, chat.
    #[arg(long, short = 't', default_value = "chat")]
    pub task: TaskType,

    #[command(flatten)]
    pub project: ProjectArgs,

    /// Preferred provider id (overrides `preferred_provider` in config).
    #[arg(long)]
    pub prefer: Option<String>,

    /// Replace the task's default system prompt.
    #[arg(long)]
    pub system: Option<String>,

    /// Print text as it arrives.
    #[arg(long)]
    pub stream: bool,

    /// Try every available provider in priority order until one succeeds.
    #[arg(long)]
    pub fallback: bool,
}

/// Structured analyses with a fixed result shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AnalysisKind {
    /// Viability score, risk level and critical path.
    Scope,
    /// Task breakdown for a kanban board.
    Kanban,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    pub kind: AnalysisKind,

    #[command(flatten)]
    pub project: ProjectArgs,

    /// Extra instructions appended to the default request.
    #[arg(long)]
    pub note: Option<String>,

    #[arg(long)]
    pub prefer: Option<String>,

    #[arg(long)]
    pub fallback: bool,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    #[arg(long, short = 't', default_value = "chat")]
    pub task: TaskType,

    #[command(flatten)]
    pub project: ProjectArgs,

    #[arg(long)]
    pub prefer: Option<String>,

    /// Use fallback across providers for every message (no streaming).
    #[arg(long)]
    pub fallback: bool,
}
