//! Observability setup for DevQuest AI.

pub mod tracing_setup;
