//! Configuration loader for DevQuest AI.
//!
//! Reads `config.toml` from the data directory (`~/.devquest/` in production)
//! and deserializes it into [`OrchestratorConfig`]. Falls back to the
//! built-in defaults when the file is missing or malformed.

use std::path::{Path, PathBuf};

use devquest_types::config::OrchestratorConfig;

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "DEVQUEST_DATA_DIR";

/// Resolve the data directory.
///
/// `DEVQUEST_DATA_DIR` wins, then `~/.devquest`, then `./.devquest`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".devquest");
    }

    PathBuf::from(".devquest")
}

/// Load orchestration configuration from `{data_dir}/config.toml`.
///
/// - Missing file: returns [`OrchestratorConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
pub async fn load_config(data_dir: &Path) -> OrchestratorConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return OrchestratorConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return OrchestratorConfig::default();
        }
    };

    match toml::from_str::<OrchestratorConfig>(&content) {
        Ok(config) => {
            tracing::debug!(
                providers = config.providers.len(),
                "Loaded {}",
                config_path.display()
            );
            config
        }
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            OrchestratorConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config.request_timeout_ms, 60_000);
        assert_eq!(config.providers.len(), 5);
    }

    #[tokio::test]
    async fn test_load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
request_timeout_ms = 15000
max_tokens = 1024
preferred_provider = "groq"
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.request_timeout_ms, 15_000);
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.preferred_provider.as_deref(), Some("groq"));
        // Catalog untouched when no [[providers]] are declared.
        assert_eq!(config.providers.len(), 5);
    }

    #[tokio::test]
    async fn test_load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.max_tokens, 4_096);
        assert!(config.preferred_provider.is_none());
    }

    #[test]
    fn test_resolve_data_dir_from_env() {
        // SAFETY: no other test reads or writes DEVQUEST_DATA_DIR.
        unsafe {
            std::env::set_var(DATA_DIR_ENV, "/tmp/test-devquest");
        }
        let dir = resolve_data_dir();
        assert_eq!(dir, PathBuf::from("/tmp/test-devquest"));
        unsafe {
            std::env::remove_var(DATA_DIR_ENV);
        }
    }
}
