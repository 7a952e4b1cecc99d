//! Infrastructure for DevQuest AI: concrete provider backends, the
//! `config.toml` loader, environment credentials, and project files.

pub mod config;
pub mod credentials;
pub mod llm;
pub mod project;
