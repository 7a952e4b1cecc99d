//! Interactive chat against the orchestrator.
//!
//! Entry point: `loop_runner::run_chat_loop`.

pub mod commands;
pub mod loop_runner;

pub use loop_runner::run_chat_loop;
