use crate::constants::{env, network};
use crate::services::logger::LogLevel;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Connection settings for the remote platform. Built once in `main` and
/// handed to the HTTP client; nothing below `main` reads the environment.
#[derive(Clone)]
pub struct Config {
    pub user_id: String,
    pub api_key: String,
    pub api_url: Url,
    pub timeout_ms: u64,
    pub log_level: LogLevel,
}

impl Config {
    pub fn new(user_id: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let user_id = user_id.into();
        let api_key = api_key.into();
        if user_id.trim().is_empty() {
            return Err(ConfigError::Missing(env::USER_ID));
        }
        if api_key.trim().is_empty() {
            return Err(ConfigError::Missing(env::API_KEY));
        }
        Ok(Self {
            user_id: user_id.trim().to_string(),
            api_key: api_key.trim().to_string(),
            api_url: parse_api_url(network::DEFAULT_API_URL)?,
            timeout_ms: network::TIMEOUT_API_REQUEST_MS,
            log_level: LogLevel::Info,
        })
    }

    pub fn with_api_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.api_url = parse_api_url(raw)?;
        Ok(self)
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &'static str| lookup(key).filter(|v| !v.trim().is_empty());

        let user_id = read(env::USER_ID).ok_or(ConfigError::Missing(env::USER_ID))?;
        let api_key = read(env::API_KEY).ok_or(ConfigError::Missing(env::API_KEY))?;
        let mut config = Self::new(user_id, api_key)?;

        if let Some(raw) = read(env::API_URL) {
            config = config.with_api_url(&raw)?;
        }
        if let Some(raw) = read(env::TIMEOUT_MS) {
            let timeout_ms = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|v| *v > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    key: env::TIMEOUT_MS,
                    reason: format!("expected a positive integer, got '{}'", raw),
                })?;
            config = config.with_timeout_ms(timeout_ms);
        }
        if let Some(raw) = read(env::LOG_LEVEL) {
            config.log_level = raw.parse().map_err(|reason| ConfigError::Invalid {
                key: env::LOG_LEVEL,
                reason,
            })?;
        }
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("user_id", &self.user_id)
            .field("api_key", &"[redacted]")
            .field("api_url", &self.api_url.as_str())
            .field("timeout_ms", &self.timeout_ms)
            .field("log_level", &self.log_level)
            .finish()
    }
}

// Url::join drops the last path segment unless the base ends with '/'.
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    let url = Url::parse(&normalized).map_err(|err| ConfigError::Invalid {
        key: env::API_URL,
        reason: err.to_string(),
    })?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Invalid {
            key: env::API_URL,
            reason: "only http/https URLs are supported".to_string(),
        });
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn requires_user_id_and_api_key() {
        let err = Config::from_lookup(lookup(&[(env::API_KEY, "k")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(env::USER_ID));
        let err = Config::from_lookup(lookup(&[(env::USER_ID, "u")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(env::API_KEY));
    }

    #[test]
    fn applies_defaults() {
        let config =
            Config::from_lookup(lookup(&[(env::USER_ID, "u-1"), (env::API_KEY, "secret")]))
                .expect("config");
        assert_eq!(config.timeout_ms, 30_000);
        assert_eq!(config.api_url.as_str(), "https://ai.data.cloud/api/v2/team/");
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn rejects_non_positive_timeout() {
        let err = Config::from_lookup(lookup(&[
            (env::USER_ID, "u"),
            (env::API_KEY, "k"),
            (env::TIMEOUT_MS, "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key, .. } if key == env::TIMEOUT_MS));
    }

    #[test]
    fn debug_output_hides_api_key() {
        let config = Config::new("u", "very-secret-key").expect("config");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("very-secret-key"));
        assert!(rendered.contains("[redacted]"));
    }

    #[test]
    fn api_url_gets_trailing_slash() {
        let config = Config::new("u", "k")
            .and_then(|c| c.with_api_url("http://localhost:8080/api/v2/team"))
            .expect("config");
        assert_eq!(
            config.api_url.join("datasets").expect("join").as_str(),
            "http://localhost:8080/api/v2/team/datasets"
        );
    }
}
