//! Request execution and per-session conversation state.

pub mod executor;
pub mod history;
pub mod session;
pub mod stream;
