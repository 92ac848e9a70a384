//! Client configuration.
//!
//! Read from the process environment, with a `.env` file layered underneath:
//!
//! | Variable | Required | Default |
//! |---|---|---|
//! | `GOODSMALL_API_BASE_URL` | yes | |
//! | `GOODSMALL_API_TOKEN` | no | anonymous |
//! | `GOODSMALL_CACHE_TTL_SECS` | no | 300 |
//! | `GOODSMALL_CACHE_CAPACITY` | no | 1000 |
//! | `SENTRY_DSN` | no | disabled |
//! | `SENTRY_ENVIRONMENT` | no | |

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const BASE_URL_VAR: &str = "GOODSMALL_API_BASE_URL";
const TOKEN_VAR: &str = "GOODSMALL_API_TOKEN";

/// Tokens issued by the goods mall are far longer than this.
const MIN_TOKEN_LENGTH: usize = 16;

/// Words that show up in copied sample `.env` files.
const PLACEHOLDER_WORDS: &[&str] = &["changeme", "placeholder", "your-token", "xxxx", "todo"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not set")]
    Missing { var: &'static str },
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Everything the `gm` binary needs at startup.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

/// Connection settings for [`GoodsMallClient`](crate::GoodsMallClient).
#[derive(Clone)]
pub struct ApiConfig {
    /// Always ends in `/` so endpoint paths join beneath it.
    pub base_url: Url,
    pub token: Option<SecretString>,
    pub cache_ttl: Duration,
    pub cache_capacity: u64,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("cache_ttl", &self.cache_ttl)
            .field("cache_capacity", &self.cache_capacity)
            .finish()
    }
}

impl ApiConfig {
    pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
    pub const DEFAULT_CACHE_CAPACITY: u64 = 1000;

    /// Anonymous configuration with the default goods cache.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` unless `base_url` is an absolute
    /// http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            token: None,
            cache_ttl: Self::DEFAULT_CACHE_TTL,
            cache_capacity: Self::DEFAULT_CACHE_CAPACITY,
        })
    }

    #[must_use]
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    fn from_env() -> Result<Self, ConfigError> {
        let raw_url = env_var(BASE_URL_VAR).ok_or(ConfigError::Missing { var: BASE_URL_VAR })?;
        let mut config = Self::new(&raw_url)?;

        if let Some(token) = env_var(TOKEN_VAR) {
            check_token(&token)?;
            config.token = Some(SecretString::from(token));
        }
        if let Some(secs) = env_number("GOODSMALL_CACHE_TTL_SECS")? {
            config.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(capacity) = env_number("GOODSMALL_CACHE_CAPACITY")? {
            config.cache_capacity = capacity;
        }
        Ok(config)
    }
}

impl ClientConfig {
    /// Load configuration, reading `.env` first when one exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the base URL is missing or malformed, a
    /// numeric setting does not parse, or the token looks unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env is normal outside development
        let _ = dotenvy::dotenv();

        Ok(Self {
            api: ApiConfig::from_env()?,
            sentry_dsn: env_var("SENTRY_DSN"),
            sentry_environment: env_var("SENTRY_ENVIRONMENT"),
        })
    }
}

/// Blank values count as unset.
fn env_var(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn env_number(var: &'static str) -> Result<Option<u64>, ConfigError> {
    env_var(var)
        .map(|value| {
            value.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                var,
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        var: BASE_URL_VAR,
        reason,
    };

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("must be an http(s) URL".to_owned()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Catch tokens pasted with their header prefix or left at a sample value.
fn check_token(token: &str) -> Result<(), ConfigError> {
    let reject = |reason: &str| {
        Err(ConfigError::Invalid {
            var: TOKEN_VAR,
            reason: reason.to_owned(),
        })
    };

    if token.get(..7).is_some_and(|prefix| prefix.eq_ignore_ascii_case("bearer ")) {
        return reject("drop the `Bearer ` prefix, it is added per request");
    }
    if token.chars().any(char::is_whitespace) {
        return reject("contains whitespace");
    }
    if token.len() < MIN_TOKEN_LENGTH {
        return reject("too short to be an issued token");
    }
    let lower = token.to_ascii_lowercase();
    if let Some(word) = PLACEHOLDER_WORDS.iter().find(|word| lower.contains(*word)) {
        return reject(&format!("looks like a placeholder ({word})"));
    }
    Ok(())
}
