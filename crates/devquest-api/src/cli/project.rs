//! Project context loading and the `dq compose` command.

use anyhow::Result;
use console::style;

use devquest_core::prompt::composer::compose as compose_context;
use devquest_infra::project::{load_project, project_id};
use devquest_types::project::{GddField, ProjectContext};

use super::ProjectArgs;

/// Parse `field=value` for `--set`.
pub fn parse_field_assignment(raw: &str) -> Result<(GddField, String), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{raw}'"))?;
    let field = field.trim().parse::<GddField>()?;
    Ok((field, value.trim().to_string()))
}

/// Resolve the project given on the command line.
///
/// Returns the project id (file stem, or `"adhoc"` when only `--set` was
/// used) and the patched context; `None` when neither was given.
pub async fn load_context(args: &ProjectArgs) -> Result<Option<(String, ProjectContext)>> {
    let (id, mut context) = match &args.project {
        Some(path) => (project_id(path), load_project(path).await?),
        None if args.set.is_empty() => return Ok(None),
        None => ("adhoc".to_string(), ProjectContext::default()),
    };

    for (field, value) in &args.set {
        context.set_field(*field, Some(value.clone()));
    }

    Ok(Some((id, context)))
}

/// Print the composed project context block.
pub async fn compose(args: &ProjectArgs, json: bool) -> Result<()> {
    let context = load_context(args)
        .await?
        .map(|(_, context)| context)
        .unwrap_or_default();
    let block = compose_context(&context);

    if json {
        let out = serde_json::json!({
            "context": context,
            "composed": block,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if block.is_empty() {
        println!();
        println!(
            "  {} Project context is empty; prompts will carry only the request.",
            style("i").blue().bold()
        );
        println!();
        return Ok(());
    }

    println!("{block}");
    Ok(())
}
