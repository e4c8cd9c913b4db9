//! Server configuration module.
//!
//! Handles loading configuration from environment variables. The InfluxDB
//! connection settings are required; the server refuses to start without them.

use std::time::Duration;
use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
const DEFAULT_INFLUX_TIMEOUT_SECS: u64 = 10;

/// Errors raised while loading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("Missing environment variable {0}")]
    MissingVar(&'static str),

    /// A variable is set but cannot be parsed.
    #[error("Invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        /// Variable name.
        var: &'static str,
        /// Raw value found in the environment.
        value: String,
        /// Parse failure.
        reason: String,
    },
}

/// InfluxDB connection settings.
#[derive(Clone)]
pub struct InfluxConfig {
    /// Base URL of the InfluxDB instance (e.g., <http://localhost:8086>).
    pub url: String,
    /// API token.
    pub token: String,
    /// Organization name, resolved to an ID at startup.
    pub org: String,
    /// Bucket error reports are written to.
    pub bucket: String,
    /// Timeout applied to every request to InfluxDB.
    pub timeout: Duration,
}

impl std::fmt::Debug for InfluxConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxConfig")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("org", &self.org)
            .field("bucket", &self.bucket)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Server configuration.
///
/// Configuration values are read from environment variables:
/// - `FAULTLINE_HOST`: The host address to bind to (default: "0.0.0.0")
/// - `FAULTLINE_PORT`: The port to listen on (default: 8080)
/// - `FAULTLINE_MAX_BODY_BYTES`: Largest accepted request body (default: 1 MiB)
/// - `FAULTLINE_INFLUX_URL`: InfluxDB base URL (required)
/// - `FAULTLINE_INFLUX_TOKEN`: InfluxDB API token (required)
/// - `FAULTLINE_INFLUX_ORG`: InfluxDB organization name (required)
/// - `FAULTLINE_INFLUX_BUCKET`: InfluxDB bucket (required)
/// - `FAULTLINE_INFLUX_TIMEOUT_SECS`: InfluxDB request timeout (default: 10)
#[derive(Debug, Clone)]
pub struct Config {
    /// The host address to bind to.
    pub host: String,
    /// The port to listen on.
    pub port: u16,
    /// Largest request body the ingestion endpoint reads.
    pub max_body_bytes: usize,
    /// InfluxDB connection settings.
    pub influx: InfluxConfig,
}

impl Config {
    /// Creates a new configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value cannot
    /// be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates a new configuration using `lookup` to resolve variable names.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value cannot
    /// be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::MissingVar(key));

        let influx = InfluxConfig {
            url: required("FAULTLINE_INFLUX_URL")?,
            token: required("FAULTLINE_INFLUX_TOKEN")?,
            org: required("FAULTLINE_INFLUX_ORG")?,
            bucket: required("FAULTLINE_INFLUX_BUCKET")?,
            timeout: Duration::from_secs(parse_or(
                "FAULTLINE_INFLUX_TIMEOUT_SECS",
                get("FAULTLINE_INFLUX_TIMEOUT_SECS"),
                DEFAULT_INFLUX_TIMEOUT_SECS,
            )?),
        };

        Ok(Self {
            host: get("FAULTLINE_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or("FAULTLINE_PORT", get("FAULTLINE_PORT"), DEFAULT_PORT)?,
            max_body_bytes: parse_or(
                "FAULTLINE_MAX_BODY_BYTES",
                get("FAULTLINE_MAX_BODY_BYTES"),
                DEFAULT_MAX_BODY_BYTES,
            )?,
            influx,
        })
    }

    /// Returns the `host:port` string the server binds to.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(var: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            var,
            reason: e.to_string(),
            value: raw,
        }),
    }
}
