//! Shared domain types for DevQuest AI.
//!
//! This crate contains the data model used across the AI orchestration layer:
//! provider descriptors and capabilities, task types, project context,
//! conversation entries, LLM request/response shapes, configuration, and
//! the error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror, schemars.

pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod project;
pub mod provider;
