//! Type-safe configuration with validation.
//!
//! [`AuthConfig`] is loaded once at process start (from the environment or
//! programmatically) and shared read-only by every request.

use crate::exclude::ExclusionSpec;
use serde::Deserialize;
use std::env;
use thiserror::Error;
use url::Url;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid URL format.
    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl {
        /// The configuration field holding the URL.
        field: String,
        /// Parse failure description.
        reason: String,
    },

    /// Missing required field.
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// A field that must be non-empty was empty.
    #[error("Configuration field must not be empty: {0}")]
    Empty(String),

    /// Invalid timeout value.
    #[error("Invalid JWKS fetch timeout: must be greater than 0")]
    InvalidTimeout,

    /// Environment variable parse error.
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError {
        /// The environment variable name.
        name: String,
        /// Parse failure description.
        reason: String,
    },
}

/// Immutable authentication gate configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// JWKS endpoint queried for signing keys.
    pub jwks_url: Url,
    /// Expected `aud` claim value.
    pub audience: String,
    /// Expected `iss` claim value.
    pub issuer: String,
    /// When true, the expiration check is skipped entirely.
    #[serde(default)]
    pub ignore_expiration: bool,
    /// Path prefixes exempt from authentication.
    #[serde(default, deserialize_with = "deserialize_exclusions")]
    pub exclude_paths: ExclusionSpec,
    /// Upper bound on a single JWKS fetch, in seconds (must be > 0).
    #[serde(default = "default_fetch_timeout")]
    pub jwks_fetch_timeout_secs: u64,
}

fn default_fetch_timeout() -> u64 {
    10
}

fn deserialize_exclusions<'de, D>(deserializer: D) -> Result<ExclusionSpec, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(ExclusionSpec::parse(&raw))
}

impl AuthConfig {
    /// Creates a configuration with required fields and defaults elsewhere.
    pub fn new(
        jwks_url: Url,
        audience: impl Into<String>,
        issuer: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            jwks_url,
            audience: audience.into(),
            issuer: issuer.into(),
            ignore_expiration: false,
            exclude_paths: ExclusionSpec::default(),
            jwks_fetch_timeout_secs: default_fetch_timeout(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Skips the expiration check entirely.
    #[must_use]
    pub fn with_ignore_expiration(mut self, ignore: bool) -> Self {
        self.ignore_expiration = ignore;
        self
    }

    /// Sets the `;`-delimited exclusion prefix list.
    #[must_use]
    pub fn with_exclude_paths(mut self, spec: &str) -> Self {
        self.exclude_paths = ExclusionSpec::parse(spec);
        self
    }

    /// Sets the JWKS fetch timeout in seconds.
    #[must_use]
    pub fn with_jwks_fetch_timeout(mut self, secs: u64) -> Self {
        self.jwks_fetch_timeout_secs = secs;
        self
    }

    /// Loads configuration from environment variables with validation.
    ///
    /// Required: `JWKS_URL`, `JWT_AUDIENCE`, `JWT_ISSUER`. Optional:
    /// `JWT_IGNORE_EXPIRATION` (default `false`), `JWT_EXCLUDE_PATHS`
    /// (default empty), `JWKS_FETCH_TIMEOUT` (default 10 seconds).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = Self {
            jwks_url: require_url_env("JWKS_URL")?,
            audience: require_env("JWT_AUDIENCE")?,
            issuer: require_env("JWT_ISSUER")?,
            ignore_expiration: parse_env("JWT_IGNORE_EXPIRATION", false)?,
            exclude_paths: ExclusionSpec::parse(
                &env::var("JWT_EXCLUDE_PATHS").unwrap_or_default(),
            ),
            jwks_fetch_timeout_secs: parse_env("JWKS_FETCH_TIMEOUT", default_fetch_timeout())?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.audience.is_empty() {
            return Err(ConfigError::Empty("audience".to_string()));
        }
        if self.issuer.is_empty() {
            return Err(ConfigError::Empty("issuer".to_string()));
        }
        if self.jwks_fetch_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }

    /// Gets the JWKS URL as a string.
    #[must_use]
    pub fn jwks_url_str(&self) -> &str {
        self.jwks_url.as_str()
    }
}

/// Read a required environment variable.
fn require_env(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingRequired(name.to_string()))
}

/// Read a required URL environment variable.
fn require_url_env(name: &str) -> Result<Url, ConfigError> {
    let raw = require_env(name)?;
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl {
        field: name.to_string(),
        reason: e.to_string(),
    })
}

/// Parse an environment variable with a default value.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val.parse().map_err(|e: T::Err| ConfigError::ParseError {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
