//! One-shot requests: `dq ask` (text) and `dq analyze` (structured).

use std::io::Write;

use anyhow::{Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use futures_util::StreamExt;

use devquest_core::llm::structured::StructuredOutput;
use devquest_core::orchestrator::executor::Generation;
use devquest_core::orchestrator::session::OrchestratorSession;
use devquest_core::orchestrator::stream::TextStream;
use devquest_types::project::{KanbanBoard, RiskLevel, ScopeReport};
use devquest_types::provider::TaskType;

use super::provider::spinner;
use super::{AnalysisKind, AnalyzeArgs, AskArgs, project};
use crate::state::AppState;

/// Send one request in the mode the flags ask for.
pub async fn ask(state: &AppState, args: AskArgs, json: bool) -> Result<()> {
    let mut session = state.session(args.task, args.prefer.as_deref());
    if let Some(system) = args.system {
        session = session.with_system_prompt(system);
    }
    if let Some((id, context)) = project::load_context(&args.project).await? {
        session.set_current_project(id, context);
    }

    // JSON output needs the finished text, so it never streams.
    if args.stream && !json {
        let (stream, warning) = if args.fallback {
            let outcome = session.ask_stream_with_fallback(&args.message).await?;
            (outcome.value, outcome.failover_warning)
        } else {
            (session.ask_stream(&args.message)?, None)
        };
        print_failover_warning(warning.as_deref());
        let provider = format!("{} ({})", stream.provider_id(), stream.model());
        println!();
        print_stream(stream, &mut String::new()).await?;
        println!();
        println!("  {}", style(format!("via {provider}")).dim());
        return Ok(());
    }

    let s = spinner("Thinking...".to_string());
    let result = if args.fallback {
        session
            .ask_with_fallback(&args.message)
            .await
            .map(|o| (o.value, o.attempts, o.failover_warning))
    } else {
        session.ask(&args.message).await.map(|g| (g, 1, None))
    };
    s.finish_and_clear();
    let (generation, attempts, warning) = result?;

    if json {
        let out = serde_json::json!({
            "provider": generation.provider_id,
            "model": generation.model,
            "text": generation.text,
            "stop_reason": generation.stop_reason,
            "usage": generation.usage,
            "attempts": attempts,
            "failover_warning": warning,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_failover_warning(warning.as_deref());
    print_generation(&generation);
    Ok(())
}

/// Run a structured scope or kanban analysis of a project.
pub async fn analyze(state: &AppState, args: AnalyzeArgs, json: bool) -> Result<()> {
    let task = match args.kind {
        AnalysisKind::Scope => TaskType::Scope,
        AnalysisKind::Kanban => TaskType::Kanban,
    };

    let Some((id, context)) = project::load_context(&args.project).await? else {
        bail!("analysis needs a project: pass --project FILE or --set FIELD=VALUE");
    };
    if context.is_empty() {
        bail!("project '{id}' has no GDD fields or scope report to analyze");
    }

    let mut session = state.session(task, args.prefer.as_deref());
    session.set_current_project(id, context);

    let mut message = match args.kind {
        AnalysisKind::Scope => {
            "Assess the scope and viability of this project for a small indie team.".to_string()
        }
        AnalysisKind::Kanban => {
            "Break this project down into the tasks needed to reach a playable build.".to_string()
        }
    };
    if let Some(note) = args.note.as_deref().filter(|n| !n.trim().is_empty()) {
        message.push(' ');
        message.push_str(note.trim());
    }

    match args.kind {
        AnalysisKind::Scope => {
            let (report, warning) =
                run_structured::<ScopeReport>(&mut session, &message, args.fallback).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_failover_warning(warning.as_deref());
                print_scope_report(&report);
            }
        }
        AnalysisKind::Kanban => {
            let (board, warning) =
                run_structured::<KanbanBoard>(&mut session, &message, args.fallback).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&board)?);
            } else {
                print_failover_warning(warning.as_deref());
                print_kanban_board(&board);
            }
        }
    }

    Ok(())
}

async fn run_structured<T: StructuredOutput>(
    session: &mut OrchestratorSession,
    message: &str,
    fallback: bool,
) -> Result<(T, Option<String>)> {
    let s = spinner("Analyzing...".to_string());
    let result = if fallback {
        session
            .ask_structured_with_fallback::<T>(message)
            .await
            .map(|o| (o.value, o.failover_warning))
    } else {
        session.ask_structured::<T>(message).await.map(|v| (v, None))
    };
    s.finish_and_clear();
    Ok(result?)
}

/// Print chunks as they arrive, appending them to `text`.
///
/// On error `text` holds whatever arrived before the failure.
pub(crate) async fn print_stream(mut stream: TextStream, text: &mut String) -> Result<()> {
    let mut stdout = std::io::stdout();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        print!("{chunk}");
        stdout.flush()?;
        text.push_str(&chunk);
    }
    println!();
    Ok(())
}

pub(crate) fn print_failover_warning(warning: Option<&str>) {
    if let Some(warning) = warning {
        eprintln!("  {} {warning}", style("!").yellow().bold());
    }
}

fn print_generation(generation: &Generation) {
    println!();
    println!("{}", generation.text);
    println!();
    println!(
        "  {}",
        style(format!(
            "via {} ({}), {} in / {} out tokens",
            generation.provider_id,
            generation.model,
            generation.usage.input_tokens,
            generation.usage.output_tokens
        ))
        .dim()
    );
}

fn print_scope_report(report: &ScopeReport) {
    let risk = match report.risk_level {
        RiskLevel::Green => style(report.risk_level.to_string()).green(),
        RiskLevel::Yellow => style(report.risk_level.to_string()).yellow(),
        RiskLevel::Red => style(report.risk_level.to_string()).red(),
    };

    println!();
    println!("  {}", style("Scope Analysis").bold());
    println!();
    println!("  Viability: {}/100", style(report.score).bold());
    println!("  Risk:      {}", risk.bold());
    if !report.critical_path.is_empty() {
        println!();
        println!("  Critical path:");
        for (i, step) in report.critical_path.iter().enumerate() {
            println!("    {}. {step}", i + 1);
        }
    }
    println!();
}

fn print_kanban_board(board: &KanbanBoard) {
    if board.tasks.is_empty() {
        println!();
        println!("  {} No tasks were generated.", style("i").blue().bold());
        println!();
        return;
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("#").fg(Color::White),
        Cell::new("Task").fg(Color::White),
        Cell::new("Priority").fg(Color::White),
        Cell::new("Estimate").fg(Color::White),
    ]);

    for (i, task) in board.tasks.iter().enumerate() {
        let estimate = task
            .estimate_hours
            .map(|h| format!("{h:.1}h"))
            .unwrap_or_else(|| "-".to_string());
        let title = match task.description.as_deref() {
            Some(description) => format!("{}\n{description}", task.title),
            None => task.title.clone(),
        };
        table.add_row(vec![
            Cell::new(i + 1).fg(Color::Cyan),
            Cell::new(title),
            Cell::new(task.priority.to_string()),
            Cell::new(estimate).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    let total: f32 = board.tasks.iter().filter_map(|t| t.estimate_hours).sum();
    println!(
        "  {} task{}, {:.1}h estimated",
        style(board.tasks.len()).bold(),
        if board.tasks.len() == 1 { "" } else { "s" },
        total
    );
    println!();
}
