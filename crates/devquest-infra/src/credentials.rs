//! Environment variable credentials.
//!
//! Key resolution: `DEVQUEST_{KEY}` is checked first, then `{KEY}` itself,
//! so a DevQuest-specific key can shadow one shared with other tools.

use devquest_core::llm::credentials::CredentialSource;

/// Read-only credential source backed by the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl EnvCredentials {
    pub fn new() -> Self {
        Self
    }
}

fn read_var(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) => Some(value),
        Err(std::env::VarError::NotPresent) => None,
        // Present but not valid Unicode; unusable as a credential.
        Err(std::env::VarError::NotUnicode(_)) => None,
    }
}

impl CredentialSource for EnvCredentials {
    fn get(&self, key: &str) -> Option<String> {
        read_var(&format!("DEVQUEST_{key}"))
            .filter(|v| !v.trim().is_empty())
            .or_else(|| read_var(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_plain_variable() {
        // SAFETY: variable name is unique to this test.
        unsafe {
            std::env::set_var("DQ_TEST_PLAIN_KEY", "sk-plain");
        }
        let creds = EnvCredentials::new();
        assert_eq!(creds.get("DQ_TEST_PLAIN_KEY").as_deref(), Some("sk-plain"));
        assert!(creds.has("DQ_TEST_PLAIN_KEY"));
        unsafe {
            std::env::remove_var("DQ_TEST_PLAIN_KEY");
        }
    }

    #[test]
    fn test_prefixed_variable_shadows_plain() {
        // SAFETY: variable names are unique to this test.
        unsafe {
            std::env::set_var("DQ_TEST_SHADOW_KEY", "sk-shared");
            std::env::set_var("DEVQUEST_DQ_TEST_SHADOW_KEY", "sk-devquest");
        }
        let creds = EnvCredentials::new();
        assert_eq!(creds.get("DQ_TEST_SHADOW_KEY").as_deref(), Some("sk-devquest"));
        unsafe {
            std::env::remove_var("DQ_TEST_SHADOW_KEY");
            std::env::remove_var("DEVQUEST_DQ_TEST_SHADOW_KEY");
        }
    }

    #[test]
    fn test_missing_and_blank_are_absent() {
        // SAFETY: variable name is unique to this test.
        unsafe {
            std::env::set_var("DQ_TEST_BLANK_KEY", "   ");
        }
        let creds = EnvCredentials::new();
        assert!(!creds.has("DQ_TEST_BLANK_KEY"));
        assert!(!creds.has("DQ_TEST_NEVER_SET_KEY"));
        unsafe {
            std::env::remove_var("DQ_TEST_BLANK_KEY");
        }
    }
}
