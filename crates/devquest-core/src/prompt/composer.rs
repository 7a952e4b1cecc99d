//! Context composer.
//!
//! Projects a `ProjectContext` into a deterministic markdown fragment:
//!
//! ```text
//! ## Project Context (GDD)
//! - Name: Starfall
//! - Genre: Roguelike
//!
//! ## Scope Analysis
//! - Viability Score: 72/100
//! - Risk Level: yellow
//! - Critical Path: prototype, vertical slice
//! ```
//!
//! Absent fields produce no line. An empty context composes to `""`, which
//! callers treat as "omit this section".

use devquest_types::project::{GddField, ProjectContext, ScopeReport};

const GDD_HEADING: &str = "## Project Context (GDD)";
const SCOPE_HEADING: &str = "## Scope Analysis";

/// Compose the prompt fragment for `context`. Never mutates its input.
pub fn compose(context: &ProjectContext) -> String {
    let mut sections = Vec::with_capacity(2);

    let gdd_lines: Vec<String> = GddField::ORDER
        .iter()
        .filter_map(|field| {
            context
                .gdd
                .get(*field)
                .map(|value| format!("- {}: {value}", field.label()))
        })
        .collect();
    if !gdd_lines.is_empty() {
        sections.push(format!("{GDD_HEADING}\n{}", gdd_lines.join("\n")));
    }

    if let Some(report) = &context.scope_report {
        sections.push(scope_section(report));
    }

    sections.join("\n\n")
}

fn scope_section(report: &ScopeReport) -> String {
    let mut lines = vec![
        SCOPE_HEADING.to_string(),
        format!("- Viability Score: {}/100", report.score),
        format!("- Risk Level: {}", report.risk_level),
    ];
    let path: Vec<&str> = report
        .critical_path
        .iter()
        .map(|step| step.trim())
        .filter(|step| !step.is_empty())
        .collect();
    if !path.is_empty() {
        lines.push(format!("- Critical Path: {}", path.join(", ")));
    }
    lines.join("\n")
}

/// Assemble the final prompt sent for one request:
/// system prompt, composed context, then the user request.
///
/// Empty parts are skipped together with their separators.
pub fn assemble_prompt(system_prompt: &str, context: &str, user_message: &str) -> String {
    let mut prompt = String::new();

    let system_prompt = system_prompt.trim();
    if !system_prompt.is_empty() {
        prompt.push_str(system_prompt);
    }

    if !context.is_empty() {
        if !prompt.is_empty() {
            prompt.push_str("\n\n");
        }
        prompt.push_str(context);
    }

    if !prompt.is_empty() {
        prompt.push_str("\n\n");
    }
    prompt.push_str("User Request:\n");
    prompt.push_str(user_message);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use devquest_types::project::{GameDesignDoc, RiskLevel};

    fn named(name: &str) -> ProjectContext {
        ProjectContext::new(GameDesignDoc {
            name: Some(name.to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_compose_omits_absent_fields() {
        assert_eq!(compose(&named("Foo")), "## Project Context (GDD)\n- Name: Foo");
    }

    #[test]
    fn test_compose_empty_context() {
        assert_eq!(compose(&ProjectContext::default()), "");

        let blank = ProjectContext::new(GameDesignDoc {
            genre: Some("   ".to_string()),
            ..Default::default()
        });
        assert_eq!(compose(&blank), "");
    }

    #[test]
    fn test_compose_fixed_field_order() {
        let context = ProjectContext::new(GameDesignDoc {
            elevator_pitch: Some("Bees, but angry".to_string()),
            name: Some("Hive".to_string()),
            core_mechanic: Some("swarm control".to_string()),
            ..Default::default()
        });
        assert_eq!(
            compose(&context),
            "## Project Context (GDD)\n\
             - Name: Hive\n\
             - Core Mechanic: swarm control\n\
             - Elevator Pitch: Bees, but angry"
        );
    }

    #[test]
    fn test_compose_with_scope_report() {
        let mut context = named("Starfall");
        context.set_scope_report(Some(ScopeReport {
            score: 72,
            risk_level: RiskLevel::Yellow,
            critical_path: vec!["prototype".to_string(), "vertical slice".to_string()],
        }));
        assert_eq!(
            compose(&context),
            "## Project Context (GDD)\n- Name: Starfall\n\n\
             ## Scope Analysis\n\
             - Viability Score: 72/100\n\
             - Risk Level: yellow\n\
             - Critical Path: prototype, vertical slice"
        );
    }

    #[test]
    fn test_compose_scope_without_path_or_gdd() {
        let mut context = ProjectContext::default();
        context.set_scope_report(Some(ScopeReport {
            score: 15,
            risk_level: RiskLevel::Red,
            critical_path: vec![],
        }));
        assert_eq!(
            compose(&context),
            "## Scope Analysis\n- Viability Score: 15/100\n- Risk Level: red"
        );
    }

    #[test]
    fn test_compose_does_not_mutate() {
        let context = named("Foo");
        let before = context.clone();
        let _ = compose(&context);
        assert_eq!(context, before);
    }

    #[test]
    fn test_assemble_prompt_with_context() {
        let prompt = assemble_prompt("You are helpful.", "## Project Context (GDD)\n- Name: Foo", "Ideas?");
        assert_eq!(
            prompt,
            "You are helpful.\n\n## Project Context (GDD)\n- Name: Foo\n\nUser Request:\nIdeas?"
        );
    }

    #[test]
    fn test_assemble_prompt_omits_empty_context() {
        assert_eq!(
            assemble_prompt("You are helpful.", "", "Ideas?"),
            "You are helpful.\n\nUser Request:\nIdeas?"
        );
        assert_eq!(assemble_prompt("", "", "Ideas?"), "User Request:\nIdeas?");
    }
}
