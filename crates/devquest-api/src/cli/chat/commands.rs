//! Slash command parsing for the chat loop.
//!
//! Commands start with `/` and control the session: history, the active
//! project, and single GDD field patches.

use std::path::PathBuf;

use console::style;

use devquest_types::project::GddField;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Forget the conversation so far.
    Clear,
    /// Show conversation history for this session.
    History,
    /// Show the provider and model the next message would use.
    Provider,
    /// Load a project file as the active project.
    Project(PathBuf),
    /// Patch one GDD field of the active project. `None` clears it.
    Set(GddField, Option<String>),
    /// Show the composed project context.
    Context,
    /// Exit the chat session.
    Exit,
    /// Unknown command or bad arguments.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let parts: Vec<&str> = trimmed.splitn(2, ' ').collect();
    let cmd = parts[0].to_lowercase();
    let arg = parts
        .get(1)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty());

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/clear" | "/reset" => Some(ChatCommand::Clear),
        "/history" => Some(ChatCommand::History),
        "/provider" | "/model" => Some(ChatCommand::Provider),
        "/context" | "/ctx" => Some(ChatCommand::Context),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        "/project" => match arg {
            Some(path) => Some(ChatCommand::Project(PathBuf::from(path))),
            None => Some(ChatCommand::Unknown("/project requires a file path".to_string())),
        },
        "/set" => Some(parse_set(arg)),
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

fn parse_set(arg: Option<&str>) -> ChatCommand {
    let Some(arg) = arg else {
        return ChatCommand::Unknown("/set requires FIELD=VALUE".to_string());
    };
    let Some((field, value)) = arg.split_once('=') else {
        return ChatCommand::Unknown("/set requires FIELD=VALUE".to_string());
    };
    match field.trim().parse::<GddField>() {
        Ok(field) => {
            let value = value.trim();
            let value = (!value.is_empty()).then(|| value.to_string());
            ChatCommand::Set(field, value)
        }
        Err(e) => ChatCommand::Unknown(e),
    }
}

/// Print the help text listing all available commands.
pub fn print_help() {
    let rows = [
        ("/help", "Show this help message"),
        ("/clear", "Forget the conversation so far"),
        ("/history", "Show conversation history"),
        ("/provider", "Show the provider and model in use"),
        ("/project FILE", "Load a project file"),
        ("/set FIELD=VALUE", "Patch a GDD field (empty value clears it)"),
        ("/context", "Show the project context sent with each message"),
        ("/exit", "End the chat session"),
    ];

    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    for (command, description) in rows {
        println!("  {:<18} {description}", style(command).cyan());
    }
    println!();
    println!(
        "  {}",
        style("GDD fields: name, genre, theme, core_mechanic, art_style, elevator_pitch").dim()
    );
    println!("  {}", style("Ctrl+D to exit").dim());
    println!();
}
