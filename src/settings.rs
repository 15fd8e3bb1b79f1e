//! Runtime configuration.
//!
//! All knobs come from the environment:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `SUPERFORM_API_KEY` | required | Vault API key |
//! | `SUPERVAULTS_VAULT_IDS` | required | Comma-separated vault ids to track |
//! | `SUPERVAULTS_CACHE_TTL_SECS` | 300 | Cache entry lifetime |
//! | `SUPERVAULTS_RETRY_MAX_ATTEMPTS` | 3 | Attempts per upstream call |
//! | `SUPERVAULTS_RETRY_BASE_DELAY_MS` | 1000 | First backoff delay |

use std::env;
use std::time::Duration;

use crate::errors::DataError;
use crate::retry::RetryPolicy;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Settings for the dashboard data service.
#[derive(Clone, Debug)]
pub struct DashboardSettings {
    pub api_key: String,
    pub cache_ttl: Duration,
    pub retry: RetryPolicy,
    pub vault_ids: Vec<String>,
}

impl DashboardSettings {
    pub fn new(api_key: String, vault_ids: Vec<String>) -> Self {
        Self {
            api_key,
            cache_ttl: DEFAULT_CACHE_TTL,
            retry: RetryPolicy {
                max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
                base_delay: DEFAULT_RETRY_BASE_DELAY,
            },
            vault_ids,
        }
    }

    /// Build settings from the environment.
    pub fn from_env() -> Result<Self, DataError> {
        let api_key = env::var("SUPERFORM_API_KEY").map_err(|_| DataError::MissingApiKey)?;

        let vault_ids = env::var("SUPERVAULTS_VAULT_IDS")
            .map(|raw| parse_vault_ids(&raw))
            .map_err(|_| {
                DataError::Configuration("SUPERVAULTS_VAULT_IDS is not set".to_string())
            })?;
        if vault_ids.is_empty() {
            return Err(DataError::Configuration(
                "SUPERVAULTS_VAULT_IDS is empty".to_string(),
            ));
        }

        let mut settings = Self::new(api_key, vault_ids);

        if let Ok(raw) = env::var("SUPERVAULTS_CACHE_TTL_SECS") {
            let secs: u64 = raw.parse().map_err(|_| {
                DataError::Configuration(format!("invalid SUPERVAULTS_CACHE_TTL_SECS: {}", raw))
            })?;
            settings.cache_ttl = Duration::from_secs(secs);
        }

        if let Ok(raw) = env::var("SUPERVAULTS_RETRY_MAX_ATTEMPTS") {
            let attempts: u32 = raw.parse().map_err(|_| {
                DataError::Configuration(format!(
                    "invalid SUPERVAULTS_RETRY_MAX_ATTEMPTS: {}",
                    raw
                ))
            })?;
            if attempts == 0 {
                return Err(DataError::Configuration(
                    "SUPERVAULTS_RETRY_MAX_ATTEMPTS must be at least 1".to_string(),
                ));
            }
            settings.retry.max_attempts = attempts;
        }

        if let Ok(raw) = env::var("SUPERVAULTS_RETRY_BASE_DELAY_MS") {
            let millis: u64 = raw.parse().map_err(|_| {
                DataError::Configuration(format!(
                    "invalid SUPERVAULTS_RETRY_BASE_DELAY_MS: {}",
                    raw
                ))
            })?;
            settings.retry.base_delay = Duration::from_millis(millis);
        }

        Ok(settings)
    }
}

fn parse_vault_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vault_ids_trims_and_drops_empties() {
        assert_eq!(
            parse_vault_ids("vault-1, vault-2 ,,vault-3"),
            vec!["vault-1", "vault-2", "vault-3"]
        );
        assert!(parse_vault_ids("").is_empty());
        assert!(parse_vault_ids(" , ").is_empty());
    }

    #[test]
    fn test_new_applies_defaults() {
        let settings =
            DashboardSettings::new("key".to_string(), vec!["vault-1".to_string()]);
        assert_eq!(settings.cache_ttl, Duration::from_secs(300));
        assert_eq!(settings.retry.max_attempts, 3);
        assert_eq!(settings.retry.base_delay, Duration::from_secs(1));
    }
}
