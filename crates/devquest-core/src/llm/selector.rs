//! Provider selection for a single request.

use devquest_types::error::OrchestratorError;
use devquest_types::provider::{ModelSelection, ProviderDescriptor, TaskType};

use super::registry::ProviderRegistry;

/// Choose provider and model for one request.
///
/// 1. No available providers: `NoProvidersConfigured`.
/// 2. A preferred id that is not registered: `UnknownProvider`. An available
///    preferred provider wins outright, without capability checks; a
///    registered but unavailable one falls through to step 3.
/// 3. Otherwise the first available provider (priority order) satisfying every
///    capability the task requires.
/// 4. If none qualifies, the highest-priority available provider.
///
/// Pure with respect to the registry snapshot and inputs.
pub fn select(
    registry: &ProviderRegistry,
    task: TaskType,
    preferred: Option<&str>,
) -> Result<ModelSelection, OrchestratorError> {
    let available = registry.available();
    let Some(first) = available.first() else {
        return Err(OrchestratorError::NoProvidersConfigured);
    };

    if let Some(preferred) = preferred {
        registry.get(preferred)?;
        match available.iter().find(|p| p.id == preferred) {
            Some(provider) => return selection(provider),
            None => tracing::debug!(
                provider = %preferred,
                task = %task,
                "Preferred provider is not available, selecting by capability"
            ),
        }
    }

    let required = task.required_capabilities();
    if let Some(provider) = available
        .iter()
        .find(|p| p.capabilities.satisfies(&required))
    {
        return selection(provider);
    }

    tracing::debug!(
        task = %task,
        provider = %first.id,
        "No provider satisfies task requirements, using highest priority"
    );
    selection(first)
}

fn selection(provider: &ProviderDescriptor) -> Result<ModelSelection, OrchestratorError> {
    let model = provider.default_model().ok_or_else(|| {
        OrchestratorError::InvalidRegistry(format!("provider '{}' declares no models", provider.id))
    })?;
    Ok(ModelSelection::new(provider.clone(), model))
}
