//! Main chat loop.
//!
//! Reads lines from stdin, routes slash commands, and sends everything else
//! through one orchestrator session so history and project context carry
//! across turns.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use devquest_core::orchestrator::session::OrchestratorSession;
use devquest_core::prompt::composer::compose as compose_context;
use devquest_infra::project::{load_project, project_id};
use devquest_types::llm::MessageRole;

use super::commands::{self, ChatCommand};
use crate::cli::ChatArgs;
use crate::cli::ask::{print_failover_warning, print_stream};
use crate::cli::project::load_context;
use crate::cli::provider::spinner;
use crate::state::AppState;

/// Run the interactive chat loop until `/exit` or end of input.
pub async fn run_chat_loop(state: &AppState, args: ChatArgs) -> Result<()> {
    let mut session = state.session(args.task, args.prefer.as_deref());
    if let Some((id, context)) = load_context(&args.project).await? {
        session.set_current_project(id, context);
    }

    print_banner(&session, args.fallback);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", style("you>").green().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(command) = commands::parse(input) {
            if handle_command(&mut session, command).await {
                break;
            }
            continue;
        }

        if let Err(e) = send(&mut session, input, args.fallback).await {
            eprintln!("  {} {e:#}", style("✗").red().bold());
        }
    }

    debug!(session_id = %session.id(), turns = session.history().len(), "Chat ended");
    println!("  {}", style("Session ended.").dim());
    Ok(())
}

async fn send(session: &mut OrchestratorSession, input: &str, fallback: bool) -> Result<()> {
    let stream = if fallback {
        let s = spinner("Thinking...".to_string());
        let outcome = session.ask_stream_with_fallback(input).await;
        s.finish_and_clear();
        let outcome = outcome?;
        print_failover_warning(outcome.failover_warning.as_deref());
        outcome.value
    } else {
        session.ask_stream(input)?
    };

    let label = format!("{}>", stream.provider_id());
    print!("{} ", style(label).cyan().bold());
    let mut reply = String::new();
    match print_stream(stream, &mut reply).await {
        Ok(()) => {
            session.record_reply(reply);
            Ok(())
        }
        Err(e) => {
            println!();
            session.record_interrupted_reply(&reply);
            Err(e)
        }
    }
}

/// Returns `true` when the loop should end.
async fn handle_command(session: &mut OrchestratorSession, command: ChatCommand) -> bool {
    match command {
        ChatCommand::Help => commands::print_help(),
        ChatCommand::Clear => {
            session.clear_history();
            println!("  {}", style("History cleared.").dim());
        }
        ChatCommand::History => print_history(session),
        ChatCommand::Provider => match session.select() {
            Ok(selection) => println!(
                "  {} {} ({})",
                style("Using").dim(),
                style(&selection.provider.display_name).bold(),
                selection.model
            ),
            Err(e) => eprintln!("  {} {e}", style("✗").red().bold()),
        },
        ChatCommand::Project(path) => load_project_file(session, &path).await,
        ChatCommand::Set(field, value) => {
            let cleared = value.is_none();
            session.context_mut().set_field(field, value);
            if cleared {
                println!("  {} cleared", style(field.label()).bold());
            } else {
                println!("  {} updated", style(field.label()).bold());
            }
        }
        ChatCommand::Context => {
            let block = compose_context(session.context());
            if block.is_empty() {
                println!("  {}", style("No project context.").dim());
            } else {
                println!();
                println!("{block}");
                println!();
            }
        }
        ChatCommand::Exit => return true,
        ChatCommand::Unknown(what) => {
            eprintln!(
                "  {} Unknown command: {what}. Type /help for commands.",
                style("?").yellow().bold()
            );
        }
    }
    false
}

async fn load_project_file(session: &mut OrchestratorSession, path: &Path) {
    match load_project(path).await {
        Ok(context) => {
            let id = project_id(path);
            println!("  {} Loaded project {}", style("✓").green().bold(), style(&id).bold());
            session.set_current_project(id, context);
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to load project");
            eprintln!("  {} {e}", style("✗").red().bold());
        }
    }
}

fn print_history(session: &OrchestratorSession) {
    let entries = session.history().entries();
    if entries.is_empty() {
        println!("  {}", style("No messages yet.").dim());
        return;
    }

    println!();
    for entry in entries {
        let who = match entry.role {
            MessageRole::User => style("you").green(),
            MessageRole::Assistant => style("ai").cyan(),
            MessageRole::System => style("system").dim(),
        };
        println!(
            "  {} {} {}",
            style(entry.timestamp.format("%H:%M:%S")).dim(),
            who.bold(),
            entry.content
        );
    }
    println!();
}

fn print_banner(session: &OrchestratorSession, fallback: bool) {
    println!();
    println!(
        "  {} {}",
        style("DevQuest chat").bold(),
        style(format!("({} task)", session.task())).dim()
    );
    match session.select() {
        Ok(selection) => println!(
            "  {} {} ({}){}",
            style("Provider:").dim(),
            selection.provider.display_name,
            selection.model,
            if fallback { ", with fallback" } else { "" }
        ),
        Err(e) => println!("  {} {e}", style("!").yellow().bold()),
    }
    if let Some(id) = session.project_id() {
        println!("  {} {id}", style("Project:").dim());
    }
    println!("  {}", style("Type /help for commands, Ctrl+D to exit.").dim());
    println!();
}
