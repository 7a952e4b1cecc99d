//! Provider CLI commands: catalog listing, selection preview, connectivity check.

use std::time::Duration;

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use devquest_infra::llm::test_provider_connection;
use devquest_types::provider::TaskType;

use crate::state::AppState;

/// Show every provider in the catalog, in priority order.
pub fn list_providers(state: &AppState, json: bool) -> Result<()> {
    let registry = state.executor.registry();
    let mut providers: Vec<_> = registry.list().iter().collect();
    providers.sort_by_key(|p| p.priority);

    if json {
        println!("{}", serde_json::to_string_pretty(&providers)?);
        return Ok(());
    }

    println!();
    println!("  {}", style("Provider Catalog").bold());
    println!();

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Priority").fg(Color::White),
        Cell::new("Id").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Default Model").fg(Color::White),
        Cell::new("Capabilities").fg(Color::White),
        Cell::new("Available").fg(Color::White),
    ]);

    for provider in &providers {
        let available_cell = if provider.available {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("no").fg(Color::Red)
        };

        table.add_row(vec![
            Cell::new(provider.priority).fg(Color::Cyan),
            Cell::new(&provider.id).fg(Color::White),
            Cell::new(&provider.display_name).fg(Color::DarkGrey),
            Cell::new(provider.default_model().unwrap_or("-")).fg(Color::DarkGrey),
            Cell::new(provider.capabilities.enabled_names().join(", ")).fg(Color::DarkGrey),
            available_cell,
        ]);
    }

    println!("{table}");
    println!();

    let available = registry.available().len();
    if available == 0 {
        println!(
            "  {} No provider is available. Set an API key such as {} and retry.",
            style("!").yellow().bold(),
            style("ANTHROPIC_API_KEY").cyan()
        );
    } else {
        println!(
            "  {} of {} provider{} available",
            style(available).bold(),
            providers.len(),
            if providers.len() == 1 { "" } else { "s" }
        );
    }
    if let Some(preferred) = state.config.preferred_provider.as_deref() {
        println!("  Preferred: {}", style(preferred).cyan());
    }
    println!(
        "  Config: {}",
        style(state.data_dir.join("config.toml").display()).dim()
    );
    println!();

    Ok(())
}

/// Print the provider and model `task` would run on.
pub fn preview_selection(
    state: &AppState,
    task: TaskType,
    prefer: Option<&str>,
    json: bool,
) -> Result<()> {
    let selection = state.executor.select(task, state.preferred(prefer))?;

    if json {
        let out = serde_json::json!({
            "task": task,
            "provider": selection.provider_id(),
            "model": selection.model,
            "required_capabilities": task.required_capabilities().enabled_names(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let required = task.required_capabilities().enabled_names();
    println!();
    println!(
        "  {} {} -> {} ({})",
        style("→").cyan().bold(),
        style(task).bold(),
        style(&selection.provider.display_name).cyan(),
        selection.model
    );
    println!(
        "  Requires: {}",
        if required.is_empty() {
            "nothing".to_string()
        } else {
            required.join(", ")
        }
    );
    let satisfies = selection
        .provider
        .capabilities
        .satisfies(&task.required_capabilities());
    if !satisfies {
        println!(
            "  {} No available provider meets every requirement; using the highest priority one.",
            style("!").yellow().bold()
        );
    }
    println!();

    Ok(())
}

/// Send a minimal request to each available provider (or just `only`).
pub async fn check_providers(state: &AppState, only: Option<&str>, json: bool) -> Result<()> {
    let registry = state.executor.registry();
    let targets: Vec<_> = match only {
        Some(id) => vec![registry.get(id)?],
        None => registry.available(),
    };

    let mut results = Vec::with_capacity(targets.len());
    for descriptor in targets {
        let model = descriptor.default_model().unwrap_or_default();
        let outcome = match state.executor.clients().get(&descriptor.id) {
            None => Err("unavailable (no credential or client)".to_string()),
            Some(client) => {
                let spinner = (!json).then(|| spinner(format!("Checking {}...", descriptor.display_name)));
                let started = std::time::Instant::now();
                let result = tokio::time::timeout(
                    Duration::from_secs(30),
                    test_provider_connection(client, model),
                )
                .await;
                if let Some(spinner) = spinner {
                    spinner.finish_and_clear();
                }
                match result {
                    Ok(Ok(())) => Ok(started.elapsed().as_millis()),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(_) => Err("timed out after 30s".to_string()),
                }
            }
        };
        results.push((descriptor.id.clone(), model.to_string(), outcome));
    }

    if json {
        let out: Vec<_> = results
            .iter()
            .map(|(id, model, outcome)| match outcome {
                Ok(ms) => serde_json::json!({"provider": id, "model": model, "ok": true, "latency_ms": ms}),
                Err(e) => serde_json::json!({"provider": id, "model": model, "ok": false, "error": e}),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    if results.is_empty() {
        println!("  {} No available providers to check.", style("i").blue().bold());
    }
    for (id, model, outcome) in &results {
        match outcome {
            Ok(ms) => println!(
                "  {} {} ({model}) responded in {ms}ms",
                style("✓").green(),
                style(id).bold()
            ),
            Err(e) => println!("  {} {} ({model}): {e}", style("✗").red(), style(id).bold()),
        }
    }
    println!();

    Ok(())
}

pub(crate) fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(template);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}
