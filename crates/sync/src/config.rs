//! Sync configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SYNC_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `SYNC_DB_MAX_CONNECTIONS` - Pool size (default: 10)
//! - `SYNC_DB_ACQUIRE_TIMEOUT_SECS` - Pool acquire timeout (default: 10)
//! - `SYNC_MISSING_EMAIL_POLICY` - `allow` or `reject` (default: allow)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `RUST_LOG` - Tracing filter (read by [`crate::telemetry`])

use secrecy::SecretString;
use thiserror::Error;

use crate::reconcile::{MissingEmailPolicy, SyncPolicy};

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Identity sync configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Store connection settings
    pub database: DatabaseConfig,
    /// Reconciliation policy
    pub policy: SyncPolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., production, staging)
    pub sentry_environment: Option<String>,
}

/// `PostgreSQL` pool settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection URL (contains password)
    pub url: SecretString,
    /// Maximum pool size
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection before failing
    pub acquire_timeout_secs: u64,
}

impl SyncConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("SYNC_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("SYNC_DATABASE_URL".to_string()))?;

        let max_connections = parse_or_default(
            &lookup,
            "SYNC_DB_MAX_CONNECTIONS",
            DEFAULT_MAX_CONNECTIONS,
        )?;
        if max_connections == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "SYNC_DB_MAX_CONNECTIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let acquire_timeout_secs = parse_or_default(
            &lookup,
            "SYNC_DB_ACQUIRE_TIMEOUT_SECS",
            DEFAULT_ACQUIRE_TIMEOUT_SECS,
        )?;

        let missing_email = parse_or_default(
            &lookup,
            "SYNC_MISSING_EMAIL_POLICY",
            MissingEmailPolicy::default(),
        )?;

        Ok(Self {
            database: DatabaseConfig {
                url,
                max_connections,
                acquire_timeout_secs,
            },
            policy: SyncPolicy { missing_email },
            sentry_dsn: non_empty(lookup("SENTRY_DSN")),
            sentry_environment: non_empty(lookup("SENTRY_ENVIRONMENT")),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

/// Treat an empty variable the same as an unset one.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<SyncConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        SyncConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("SYNC_DATABASE_URL", "postgres://localhost/sync")]).unwrap();
        assert_eq!(config.database.url.expose_secret(), "postgres://localhost/sync");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.database.acquire_timeout_secs, 10);
        assert_eq!(config.policy.missing_email, MissingEmailPolicy::Allow);
        assert!(config.sentry_dsn.is_none());
        assert!(config.sentry_environment.is_none());
    }

    #[test]
    fn test_missing_database_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "SYNC_DATABASE_URL"));
    }

    #[test]
    fn test_database_url_fallback() {
        let config = load(&[("DATABASE_URL", "postgres://fly/sync")]).unwrap();
        assert_eq!(config.database.url.expose_secret(), "postgres://fly/sync");
    }

    #[test]
    fn test_primary_database_url_wins() {
        let config = load(&[
            ("SYNC_DATABASE_URL", "postgres://primary/sync"),
            ("DATABASE_URL", "postgres://fallback/sync"),
        ])
        .unwrap();
        assert_eq!(config.database.url.expose_secret(), "postgres://primary/sync");
    }

    #[test]
    fn test_reject_policy() {
        let config = load(&[
            ("SYNC_DATABASE_URL", "postgres://localhost/sync"),
            ("SYNC_MISSING_EMAIL_POLICY", "Reject"),
        ])
        .unwrap();
        assert_eq!(config.policy.missing_email, MissingEmailPolicy::Reject);
    }

    #[test]
    fn test_invalid_policy() {
        let err = load(&[
            ("SYNC_DATABASE_URL", "postgres://localhost/sync"),
            ("SYNC_MISSING_EMAIL_POLICY", "sometimes"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnvVar(key, _) if key == "SYNC_MISSING_EMAIL_POLICY"
        ));
    }

    #[test]
    fn test_invalid_pool_size() {
        let err = load(&[
            ("SYNC_DATABASE_URL", "postgres://localhost/sync"),
            ("SYNC_DB_MAX_CONNECTIONS", "lots"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));

        let err = load(&[
            ("SYNC_DATABASE_URL", "postgres://localhost/sync"),
            ("SYNC_DB_MAX_CONNECTIONS", "0"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_empty_sentry_dsn_is_unset() {
        let config = load(&[
            ("SYNC_DATABASE_URL", "postgres://localhost/sync"),
            ("SENTRY_DSN", ""),
        ])
        .unwrap();
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config = load(&[("SYNC_DATABASE_URL", "postgres://user:hunter2@db/sync")]).unwrap();
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("hunter2"));
    }
}
