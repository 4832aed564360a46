//! Hearing state layer configuration.
//!
//! Configuration is loaded from environment variables. The Redis URL may
//! embed credentials and is redacted in Debug output.

use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default sliding expiration for distributed cache entries (4 hours idle).
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 14_400;

/// Default idle TTL for the process-local conference layer.
pub const DEFAULT_LOCAL_CACHE_TTL_SECONDS: u64 = 14_400;

/// Default bound on a single store round-trip.
pub const DEFAULT_STORE_TIMEOUT_MILLIS: u64 = 5_000;

/// Default TTL for entity locks guarding read-modify-write cycles.
pub const DEFAULT_LOCK_TTL_SECONDS: u64 = 30;

/// Default number of acquisition attempts before reporting contention.
pub const DEFAULT_LOCK_RETRY_ATTEMPTS: u32 = 5;

/// Default delay between lock acquisition attempts.
pub const DEFAULT_LOCK_RETRY_DELAY_MILLIS: u64 = 50;

/// Hearing state layer configuration.
///
/// Loaded from environment variables with sensible defaults; only
/// `REDIS_URL` is required. Sensitive fields are redacted in Debug output.
#[derive(Clone)]
pub struct Config {
    /// Redis connection URL (shared store).
    /// Protected by `SecretString` to prevent accidental logging.
    pub redis_url: SecretString,

    /// Sliding expiration for distributed cache entries.
    pub cache_ttl: Duration,

    /// Idle TTL for the process-local conference layer.
    pub local_cache_ttl: Duration,

    /// Whether the process-local conference layer is enabled. Disable in
    /// single-instance deployments to read straight through to the store.
    pub local_cache_enabled: bool,

    /// Upper bound on a single store round-trip.
    pub store_timeout: Duration,

    /// TTL for entity locks guarding read-modify-write cycles.
    pub lock_ttl: Duration,

    /// Acquisition attempts before reporting lock contention.
    pub lock_retry_attempts: u32,

    /// Delay between lock acquisition attempts.
    pub lock_retry_delay: Duration,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("redis_url", &"[REDACTED]")
            .field("cache_ttl", &self.cache_ttl)
            .field("local_cache_ttl", &self.local_cache_ttl)
            .field("local_cache_enabled", &self.local_cache_enabled)
            .field("store_timeout", &self.store_timeout)
            .field("lock_ttl", &self.lock_ttl)
            .field("lock_retry_attempts", &self.lock_retry_attempts)
            .field("lock_retry_delay", &self.lock_retry_delay)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let redis_url = SecretString::from(
            vars.get("REDIS_URL")
                .ok_or_else(|| ConfigError::MissingEnvVar("REDIS_URL".to_string()))?
                .clone(),
        );

        let cache_ttl = Duration::from_secs(parse_or_default(
            vars,
            "HEARING_CACHE_TTL_SECONDS",
            DEFAULT_CACHE_TTL_SECONDS,
        )?);

        let local_cache_ttl = Duration::from_secs(parse_or_default(
            vars,
            "HEARING_LOCAL_CACHE_TTL_SECONDS",
            DEFAULT_LOCAL_CACHE_TTL_SECONDS,
        )?);

        let local_cache_enabled = match vars.get("HEARING_LOCAL_CACHE_ENABLED") {
            None => true,
            Some(raw) => raw.parse::<bool>().map_err(|_| {
                ConfigError::InvalidValue(format!(
                    "HEARING_LOCAL_CACHE_ENABLED must be true or false, got {raw:?}"
                ))
            })?,
        };

        let store_timeout = Duration::from_millis(parse_or_default(
            vars,
            "HEARING_STORE_TIMEOUT_MILLIS",
            DEFAULT_STORE_TIMEOUT_MILLIS,
        )?);

        let lock_ttl = Duration::from_secs(parse_or_default(
            vars,
            "HEARING_LOCK_TTL_SECONDS",
            DEFAULT_LOCK_TTL_SECONDS,
        )?);

        let lock_retry_attempts = parse_or_default(
            vars,
            "HEARING_LOCK_RETRY_ATTEMPTS",
            u64::from(DEFAULT_LOCK_RETRY_ATTEMPTS),
        )?;
        let lock_retry_attempts = u32::try_from(lock_retry_attempts).map_err(|_| {
            ConfigError::InvalidValue(format!(
                "HEARING_LOCK_RETRY_ATTEMPTS out of range: {lock_retry_attempts}"
            ))
        })?;

        let lock_retry_delay = Duration::from_millis(parse_or_default(
            vars,
            "HEARING_LOCK_RETRY_DELAY_MILLIS",
            DEFAULT_LOCK_RETRY_DELAY_MILLIS,
        )?);

        if store_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "HEARING_STORE_TIMEOUT_MILLIS must be greater than zero".to_string(),
            ));
        }

        if lock_ttl.is_zero() {
            return Err(ConfigError::InvalidValue(
                "HEARING_LOCK_TTL_SECONDS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            redis_url,
            cache_ttl,
            local_cache_ttl,
            local_cache_enabled,
            store_timeout,
            lock_ttl,
            lock_retry_attempts,
            lock_retry_delay,
        })
    }
}

fn parse_or_default(
    vars: &HashMap<String, String>,
    name: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    match vars.get(name) {
        None => Ok(default),
        Some(raw) => raw.parse::<u64>().map_err(|_| {
            ConfigError::InvalidValue(format!("{name} must be a non-negative integer, got {raw:?}"))
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn base_vars() -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert(
            "REDIS_URL".to_string(),
            "redis://localhost:6379".to_string(),
        );
        vars
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_vars(&base_vars()).unwrap();

        assert_eq!(config.cache_ttl, Duration::from_secs(14_400));
        assert_eq!(config.local_cache_ttl, Duration::from_secs(14_400));
        assert!(config.local_cache_enabled);
        assert_eq!(config.store_timeout, Duration::from_millis(5_000));
        assert_eq!(config.lock_ttl, Duration::from_secs(30));
        assert_eq!(config.lock_retry_attempts, 5);
        assert_eq!(config.lock_retry_delay, Duration::from_millis(50));
    }

    #[test]
    fn test_missing_redis_url() {
        let result = Config::from_vars(&HashMap::new());
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(name)) if name == "REDIS_URL"));
    }

    #[test]
    fn test_overrides() {
        let mut vars = base_vars();
        vars.insert("HEARING_CACHE_TTL_SECONDS".to_string(), "60".to_string());
        vars.insert(
            "HEARING_LOCAL_CACHE_ENABLED".to_string(),
            "false".to_string(),
        );
        vars.insert(
            "HEARING_STORE_TIMEOUT_MILLIS".to_string(),
            "250".to_string(),
        );

        let config = Config::from_vars(&vars).unwrap();
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert!(!config.local_cache_enabled);
        assert_eq!(config.store_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_number_rejected() {
        let mut vars = base_vars();
        vars.insert(
            "HEARING_CACHE_TTL_SECONDS".to_string(),
            "four hours".to_string(),
        );

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut vars = base_vars();
        vars.insert("HEARING_STORE_TIMEOUT_MILLIS".to_string(), "0".to_string());

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_debug_redacts_redis_url() {
        let mut vars = base_vars();
        vars.insert(
            "REDIS_URL".to_string(),
            "redis://:password123@localhost:6379".to_string(),
        );

        let config = Config::from_vars(&vars).unwrap();
        let debug_str = format!("{config:?}");
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("password123"));
    }
}
