//! Fallback execution across providers.
//!
//! Runs an operation against each available provider in priority order.
//! The first success wins; each failure is logged and the next provider is
//! tried immediately (no retry of the same provider, no backoff). Fatal
//! selection errors abort the loop.

use std::future::Future;
use std::time::Duration;

use devquest_types::error::OrchestratorError;
use devquest_types::llm::LlmError;
use devquest_types::provider::ProviderDescriptor;

use super::registry::ProviderRegistry;

/// Result of a successful operation through the fallback loop.
#[derive(Debug)]
pub struct FallbackOutcome<T> {
    pub value: T,
    /// Id of the provider that produced `value`.
    pub provider_id: String,
    pub model: String,
    /// Number of providers tried, including the successful one.
    pub attempts: usize,
    /// Set when a provider other than the first available one handled the request.
    pub failover_warning: Option<String>,
}

/// Run `fut` under an optional per-attempt timeout.
///
/// Expiry is reported as `ProviderRequestFailed` wrapping `LlmError::Timeout`,
/// so it is handled like any other provider failure.
pub async fn with_timeout<T, Fut>(
    provider_id: &str,
    limit: Option<Duration>,
    fut: Fut,
) -> Result<T, OrchestratorError>
where
    Fut: Future<Output = Result<T, OrchestratorError>>,
{
    let Some(limit) = limit else {
        return fut.await;
    };
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(OrchestratorError::provider(
            provider_id,
            LlmError::Timeout {
                timeout_ms: limit.as_millis() as u64,
            },
        )),
    }
}

/// Invoke `operation(provider, model)` for each available provider until one
/// succeeds.
///
/// Returns `NoProvidersConfigured` when nothing is available and
/// `AllProvidersFailed` (boxing the last provider's error) when every
/// attempt fails.
pub async fn execute_with_fallback<T, F, Fut>(
    registry: &ProviderRegistry,
    attempt_timeout: Option<Duration>,
    mut operation: F,
) -> Result<FallbackOutcome<T>, OrchestratorError>
where
    F: FnMut(ProviderDescriptor, String) -> Fut,
    Fut: Future<Output = Result<T, OrchestratorError>>,
{
    let candidates = registry.available();
    let Some(primary) = candidates.first().map(|p| p.id.clone()) else {
        return Err(OrchestratorError::NoProvidersConfigured);
    };

    let mut attempts = 0;
    let mut last_failure: Option<(String, OrchestratorError)> = None;

    for provider in candidates {
        attempts += 1;
        let provider_id = provider.id.clone();
        let display_name = provider.display_name.clone();
        let model = provider.default_model().unwrap_or_default().to_string();

        let result = with_timeout(
            &provider_id,
            attempt_timeout,
            operation(provider.clone(), model.clone()),
        )
        .await;

        match result {
            Ok(value) => {
                let failover_warning = (provider_id != primary).then(|| {
                    format!(
                        "Switched to {display_name} after {} failed attempt(s)",
                        attempts - 1
                    )
                });
                if let Some(ref warning) = failover_warning {
                    tracing::warn!(%warning, provider = %provider_id, "Failover occurred");
                }
                return Ok(FallbackOutcome {
                    value,
                    provider_id,
                    model,
                    attempts,
                    failover_warning,
                });
            }
            Err(err) if err.is_fatal() => {
                tracing::error!(
                    provider = %provider_id,
                    error = %err,
                    "Non-recoverable error, aborting fallback"
                );
                return Err(err);
            }
            Err(err) => {
                tracing::warn!(
                    provider = %provider_id,
                    model = %model,
                    attempt = attempts,
                    error = %err,
                    "Provider failed, trying next in chain"
                );
                last_failure = Some((provider_id, err));
            }
        }
    }

    match last_failure {
        Some((last_provider, source)) => Err(OrchestratorError::AllProvidersFailed {
            attempts,
            last_provider,
            source: Box::new(source),
        }),
        None => Err(OrchestratorError::NoProvidersConfigured),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::descriptor;
    use devquest_types::provider::ProviderCapabilities;
    use std::cell::RefCell;

    fn registry(ids: &[&str]) -> ProviderRegistry {
        ProviderRegistry::new(
            ids.iter()
                .enumerate()
                .map(|(i, id)| descriptor(id, i as u32 + 1, true, ProviderCapabilities::ALL))
                .collect(),
        )
        .unwrap()
    }

    fn fail(provider: &str) -> OrchestratorError {
        OrchestratorError::provider(
            provider,
            LlmError::Provider {
                message: format!("{provider} is down"),
            },
        )
    }

    #[tokio::test]
    async fn test_first_success_short_circuits() {
        let registry = registry(&["a", "b", "c"]);
        let invoked = RefCell::new(Vec::new());

        let outcome = execute_with_fallback(&registry, None, |provider, model| {
            invoked.borrow_mut().push(provider.id.clone());
            async move {
                match provider.id.as_str() {
                    "a" => Err(fail("a")),
                    _ => Ok(format!("{} via {model}", provider.id)),
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(outcome.value, "b via b-large");
        assert_eq!(outcome.provider_id, "b");
        assert_eq!(outcome.attempts, 2);
        assert!(outcome.failover_warning.unwrap().contains("Switched to B"));
        assert_eq!(*invoked.borrow(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_primary_success_has_no_warning() {
        let registry = registry(&["a", "b"]);
        let outcome = execute_with_fallback(&registry, None, |provider, _| async move {
            Ok::<_, OrchestratorError>(provider.id)
        })
        .await
        .unwrap();
        assert_eq!(outcome.value, "a");
        assert_eq!(outcome.attempts, 1);
        assert!(outcome.failover_warning.is_none());
    }

    #[tokio::test]
    async fn test_total_failure_references_last_error() {
        let registry = registry(&["a", "b"]);
        let result: Result<FallbackOutcome<()>, _> =
            execute_with_fallback(&registry, None, |provider, _| async move {
                Err(fail(&provider.id))
            })
            .await;

        let err = result.unwrap_err();
        match &err {
            OrchestratorError::AllProvidersFailed {
                attempts,
                last_provider,
                ..
            } => {
                assert_eq!(*attempts, 2);
                assert_eq!(last_provider, "b");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            err.last_error(),
            OrchestratorError::ProviderRequestFailed { provider, .. } if provider == "b"
        ));
        assert!(err.to_string().contains("b is down"));
    }

    #[tokio::test]
    async fn test_fatal_error_aborts_loop() {
        let registry = registry(&["a", "b"]);
        let calls = RefCell::new(0);
        let result: Result<FallbackOutcome<()>, _> =
            execute_with_fallback(&registry, None, |_, _| {
                *calls.borrow_mut() += 1;
                async { Err(OrchestratorError::UnknownProvider("ghost".to_string())) }
            })
            .await;

        assert!(matches!(result, Err(OrchestratorError::UnknownProvider(_))));
        assert_eq!(*calls.borrow(), 1);
    }

    #[tokio::test]
    async fn test_schema_failure_moves_to_next_provider() {
        let registry = registry(&["a", "b"]);
        let outcome = execute_with_fallback(&registry, None, |provider, _| async move {
            if provider.id == "a" {
                Err(OrchestratorError::SchemaValidationFailed {
                    schema: "ScopeReport".to_string(),
                    message: "missing field `score`".to_string(),
                })
            } else {
                Ok(provider.id)
            }
        })
        .await
        .unwrap();
        assert_eq!(outcome.value, "b");
    }

    #[tokio::test]
    async fn test_empty_registry() {
        let registry = ProviderRegistry::new(vec![]).unwrap();
        let result: Result<FallbackOutcome<()>, _> =
            execute_with_fallback(&registry, None, |_, _| async { Ok(()) }).await;
        assert!(matches!(result, Err(OrchestratorError::NoProvidersConfigured)));
    }

    #[tokio::test]
    async fn test_timeout_counts_as_provider_failure() {
        let registry = registry(&["slow", "fast"]);
        let outcome = execute_with_fallback(
            &registry,
            Some(Duration::from_millis(50)),
            |provider, _| async move {
                if provider.id == "slow" {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                }
                Ok::<_, OrchestratorError>(provider.id)
            },
        )
        .await
        .unwrap();
        assert_eq!(outcome.value, "fast");
    }

    #[tokio::test]
    async fn test_with_timeout_reports_timeout() {
        let result: Result<(), _> = with_timeout("slow", Some(Duration::from_millis(20)), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(())
        })
        .await;
        assert!(matches!(
            result,
            Err(OrchestratorError::ProviderRequestFailed {
                source: LlmError::Timeout { timeout_ms: 20 },
                ..
            })
        ));
    }
}
