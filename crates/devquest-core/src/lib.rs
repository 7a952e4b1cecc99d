//! Provider orchestration for DevQuest AI.
//!
//! Selects a provider for each AI-assisted task, composes prompts from the
//! active project context, and executes requests with optional fallback
//! across providers. Depends only on `devquest-types`; concrete provider
//! backends live in `devquest-infra`.

pub mod llm;
pub mod orchestrator;
pub mod prompt;
