//! Provider abstractions and selection policy.
//!
//! - `LlmProvider`: RPITIT trait implemented once per backend
//! - `BoxLlmProvider`: object-safe wrapper for dynamic dispatch
//! - `ProviderRegistry`: immutable catalog with availability computed once
//! - `select`: task-aware provider + model choice
//! - `execute_with_fallback`: priority-ordered retry across providers

pub mod box_provider;
pub mod clients;
pub mod credentials;
pub mod fallback;
pub mod provider;
pub mod registry;
pub mod selector;
pub mod structured;

#[cfg(test)]
pub(crate) mod testing;
