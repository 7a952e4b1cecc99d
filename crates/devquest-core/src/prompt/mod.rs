//! Prompt construction: project-context composition and per-task system prompts.

pub mod composer;
pub mod templates;
