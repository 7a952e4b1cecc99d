//! Application state wiring the orchestrator together.
//!
//! Built once at startup: config, registry, clients and executor. The
//! executor is shared read-only by every session the CLI creates.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use devquest_core::llm::registry::ProviderRegistry;
use devquest_core::orchestrator::executor::{ExecutorSettings, RequestExecutor};
use devquest_core::orchestrator::session::OrchestratorSession;
use devquest_infra::config::{load_config, resolve_data_dir};
use devquest_infra::credentials::EnvCredentials;
use devquest_infra::llm::build_clients;
use devquest_types::config::OrchestratorConfig;
use devquest_types::provider::TaskType;

pub struct AppState {
    pub data_dir: PathBuf,
    pub config: OrchestratorConfig,
    pub executor: Arc<RequestExecutor>,
}

impl AppState {
    /// Load config, check credentials, and build the executor.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        let config = load_config(&data_dir).await;

        let credentials = EnvCredentials::new();
        let registry = ProviderRegistry::from_specs(&config.providers, &credentials)
            .with_context(|| {
                format!(
                    "invalid provider catalog in {}",
                    data_dir.join("config.toml").display()
                )
            })?;
        let clients = build_clients(&registry, &config.providers, &credentials);

        tracing::info!(
            data_dir = %data_dir.display(),
            providers = registry.len(),
            available = registry.available().len(),
            clients = clients.len(),
            "Orchestrator ready"
        );

        let executor = RequestExecutor::new(registry, clients, ExecutorSettings::from(&config));

        Ok(Self {
            data_dir,
            config,
            executor: Arc::new(executor),
        })
    }

    /// CLI flag first, then `preferred_provider` from config.
    pub fn preferred<'a>(&'a self, flag: Option<&'a str>) -> Option<&'a str> {
        flag.or(self.config.preferred_provider.as_deref())
    }

    /// Fresh session for `task` with the effective preference applied.
    pub fn session(&self, task: TaskType, prefer: Option<&str>) -> OrchestratorSession {
        let session = OrchestratorSession::new(Arc::clone(&self.executor), task);
        match self.preferred(prefer) {
            Some(provider_id) => session.with_preferred_provider(provider_id),
            None => session,
        }
    }
}
