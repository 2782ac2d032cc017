//! Application configuration loaded from environment variables.
//!
//! Loading is fail-fast: a missing or malformed variable stops startup with a
//! message naming it.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use subscriber_api_purchases::DEFAULT_MAX_BODY_SIZE;
use thiserror::Error;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One flattened JSON object per event.
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(ConfigError::InvalidValue {
                var: "LOG_FORMAT".to_string(),
                message: format!("expected 'json' or 'pretty', got '{other}'"),
            }),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}

/// Service configuration.
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub rust_log: String,
    pub log_format: LogFormat,
    pub database_max_connections: u32,
    pub database_acquire_timeout: Duration,
    pub max_body_size: usize,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[redacted]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .field("log_format", &self.log_format)
            .field("database_max_connections", &self.database_max_connections)
            .field("database_acquire_timeout", &self.database_acquire_timeout)
            .field("max_body_size", &self.max_body_size)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file is read first when present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `DATABASE_URL` is missing or any value fails
    /// to parse.
    ///
    /// # Variables
    ///
    /// - `DATABASE_URL` - PostgreSQL connection string (required)
    /// - `HOST` - Bind address (default: "0.0.0.0")
    /// - `PORT` - Listen port (default: 8080)
    /// - `RUST_LOG` - Log filter (default: "info")
    /// - `LOG_FORMAT` - "json" or "pretty" (default: "json")
    /// - `DATABASE_MAX_CONNECTIONS` - Pool size (default: 10)
    /// - `DATABASE_ACQUIRE_TIMEOUT_SECS` - Pool acquire timeout (default: 5)
    /// - `MAX_BODY_SIZE` - Largest batch body in bytes (default: 10 MiB)
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (development only)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port: u16 = parse_var(&lookup, "PORT", 8080)?;
        if port == 0 {
            return Err(ConfigError::InvalidValue {
                var: "PORT".to_string(),
                message: "Port must be between 1 and 65535".to_string(),
            });
        }

        let rust_log = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());

        let log_format = match lookup("LOG_FORMAT") {
            Some(value) => value.parse()?,
            None => LogFormat::Json,
        };

        let database_max_connections: u32 = parse_var(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?;
        if database_max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                var: "DATABASE_MAX_CONNECTIONS".to_string(),
                message: "Pool needs at least one connection".to_string(),
            });
        }

        let acquire_timeout_secs: u64 = parse_var(&lookup, "DATABASE_ACQUIRE_TIMEOUT_SECS", 5)?;

        let max_body_size: usize = parse_var(&lookup, "MAX_BODY_SIZE", DEFAULT_MAX_BODY_SIZE)?;

        Ok(Self {
            database_url,
            host,
            port,
            rust_log,
            log_format,
            database_max_connections,
            database_acquire_timeout: Duration::from_secs(acquire_timeout_secs),
            max_body_size,
        })
    }

    /// Socket address string to bind.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            var: var.to_string(),
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/subscribers")]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.database_acquire_timeout, Duration::from_secs(5));
        assert_eq!(config.max_body_size, 10 * 1024 * 1024);
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DATABASE_URL", "postgres://db/subscribers"),
            ("HOST", "127.0.0.1"),
            ("PORT", "3000"),
            ("LOG_FORMAT", "Pretty"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("DATABASE_ACQUIRE_TIMEOUT_SECS", "1"),
            ("MAX_BODY_SIZE", "1024"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:3000");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.database_max_connections, 4);
        assert_eq!(config.database_acquire_timeout, Duration::from_secs(1));
        assert_eq!(config.max_body_size, 1024);
    }

    #[test]
    fn test_missing_database_url() {
        assert!(matches!(
            load(&[]),
            Err(ConfigError::MissingVar(ref var)) if var == "DATABASE_URL"
        ));
    }

    #[test]
    fn test_invalid_values() {
        let url = ("DATABASE_URL", "postgres://localhost/subscribers");
        for (var, value) in [
            ("PORT", "0"),
            ("PORT", "http"),
            ("PORT", "70000"),
            ("LOG_FORMAT", "xml"),
            ("DATABASE_MAX_CONNECTIONS", "0"),
            ("DATABASE_ACQUIRE_TIMEOUT_SECS", "-1"),
            ("MAX_BODY_SIZE", "ten"),
        ] {
            let err = load(&[url, (var, value)]).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { var: ref v, .. } if v == var),
                "{var}={value} gave {err}"
            );
        }
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config = load(&[("DATABASE_URL", "postgres://user:secret@db/subscribers")]).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[redacted]"));
    }
}
