//! # Configuration
//!
//! Layered configuration for the client and the node. Supports environment
//! variables, a TOML config file, and built-in defaults.
//!
//! Precedence (highest to lowest):
//! 1. Environment variables (`QUERY_HUMAN_*`)
//! 2. Config file (`./query-human.toml` or `./config/query-human.toml`)
//! 3. Default values
//!
//! ```rust
//! use query_human::config::{AttemptTimeoutPolicy, QueryHumanConfig};
//!
//! let config = QueryHumanConfig::default();
//! assert_eq!(config.polling.default_timeout_seconds, 86_400);
//! assert_eq!(config.polling.backoff_ms, 1_000);
//! assert_eq!(config.polling.attempt_timeout, AttemptTimeoutPolicy::FullBudget);
//! ```

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::constants::{self, env};
use crate::error::{QueryHumanError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryHumanConfig {
    /// Remote service settings
    pub service: ServiceConfig,
    /// Poll loop policy
    pub polling: PollingConfig,
    /// Host-facing node behaviour
    pub node: NodeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the human-query service (e.g., "<https://example.com/>")
    pub base_url: String,
    /// User agent sent with every attempt
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Overall wait budget when the caller does not pass one
    pub default_timeout_seconds: u64,
    /// Delay between unsuccessful attempts in milliseconds
    pub backoff_ms: u64,
    /// How long a single HTTP attempt may take
    pub attempt_timeout: AttemptTimeoutPolicy,
    /// How the correlation ID is derived
    pub query_id_strategy: QueryIdStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// What the node returns to the host engine
    pub outcome_delivery: OutcomeDelivery,
    /// Item field that receives the outcome under `attach_to_items`
    pub response_field: String,
}

/// Per-attempt HTTP timeout policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptTimeoutPolicy {
    /// Every attempt may take the full overall budget. A slow final attempt
    /// can overshoot the deadline by up to one budget.
    #[default]
    FullBudget,
    /// Each attempt is capped at whatever remains of the overall budget.
    RemainingBudget,
}

/// Correlation ID derivation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIdStrategy {
    /// `{api_key}-{unix_seconds}`
    #[default]
    Timestamp,
    /// `{api_key}-{unix_seconds}-{uuid}`, unique under rapid repeat calls
    TimestampWithNonce,
}

/// What the node hands back to the host after a query completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeDelivery {
    /// Input items unchanged; the outcome is only logged.
    #[default]
    PassThrough,
    /// Each input item gets the outcome under [`NodeConfig::response_field`].
    AttachToItems,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: constants::DEFAULT_BASE_URL.to_string(),
            user_agent: format!("query-human/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            default_timeout_seconds: constants::DEFAULT_TIMEOUT_SECONDS,
            backoff_ms: constants::DEFAULT_BACKOFF_MS,
            attempt_timeout: AttemptTimeoutPolicy::default(),
            query_id_strategy: QueryIdStrategy::default(),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            outcome_delivery: OutcomeDelivery::default(),
            response_field: constants::DEFAULT_RESPONSE_FIELD.to_string(),
        }
    }
}

impl PollingConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

impl ServiceConfig {
    /// Full submission URL: base URL joined with the `queryHuman` path.
    pub fn query_url(&self) -> Result<Url> {
        let mut base = self.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }

        let base = Url::parse(&base)
            .map_err(|e| QueryHumanError::configuration(format!("Invalid base URL: {e}")))?;

        base.join(constants::QUERY_HUMAN_PATH)
            .map_err(|e| QueryHumanError::configuration(format!("Failed to construct URL: {e}")))
    }
}

impl QueryHumanConfig {
    /// Load configuration from the default config file (if any) and environment.
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => {
                debug!("Loading config from: {}", path.display());
                Self::load_from_file(&path)?
            }
            None => Self::default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;

        debug!(?config, "Loaded query-human configuration");
        Ok(config)
    }

    /// Load configuration from a specific file, then apply env overrides.
    pub fn load_with_file(path: &Path) -> Result<Self> {
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file. Missing sections fall back to defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            QueryHumanError::configuration(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            QueryHumanError::configuration(format!("Failed to parse config file: {e}"))
        })
    }

    fn find_config_file() -> Option<PathBuf> {
        ["./query-human.toml", "./config/query-human.toml"]
            .iter()
            .map(PathBuf::from)
            .find(|path| path.is_file())
    }

    /// Apply `QUERY_HUMAN_*` environment overrides.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup. Lets tests avoid mutating the
    /// process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(env::BASE_URL) {
            self.service.base_url = url;
        }
        if let Some(timeout) = lookup(env::TIMEOUT_SECONDS) {
            self.polling.default_timeout_seconds = parse_env(env::TIMEOUT_SECONDS, &timeout)?;
        }
        if let Some(backoff) = lookup(env::BACKOFF_MS) {
            self.polling.backoff_ms = parse_env(env::BACKOFF_MS, &backoff)?;
        }
        if let Some(policy) = lookup(env::ATTEMPT_TIMEOUT) {
            self.polling.attempt_timeout = parse_env(env::ATTEMPT_TIMEOUT, &policy)?;
        }
        if let Some(strategy) = lookup(env::QUERY_ID_STRATEGY) {
            self.polling.query_id_strategy = parse_env(env::QUERY_ID_STRATEGY, &strategy)?;
        }
        if let Some(delivery) = lookup(env::OUTCOME_DELIVERY) {
            self.node.outcome_delivery = parse_env(env::OUTCOME_DELIVERY, &delivery)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.service.query_url()?;

        if self.polling.default_timeout_seconds == 0 {
            return Err(QueryHumanError::configuration(
                "polling.default_timeout_seconds must be greater than zero",
            ));
        }
        if self.polling.backoff_ms == 0 {
            return Err(QueryHumanError::configuration(
                "polling.backoff_ms must be greater than zero",
            ));
        }
        if self.node.response_field.trim().is_empty() {
            return Err(QueryHumanError::configuration(
                "node.response_field must not be empty",
            ));
        }
        Ok(())
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            QueryHumanError::configuration(format!("Failed to serialize config: {e}"))
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn parse_env<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| QueryHumanError::configuration(format!("Invalid {key} '{raw}': {e}")))
}

impl FromStr for AttemptTimeoutPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "full" | "full_budget" => Ok(Self::FullBudget),
            "remaining" | "remaining_budget" => Ok(Self::RemainingBudget),
            other => Err(format!("unknown attempt timeout policy '{other}'")),
        }
    }
}

impl FromStr for QueryIdStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "timestamp" => Ok(Self::Timestamp),
            "timestamp_with_nonce" | "nonce" => Ok(Self::TimestampWithNonce),
            other => Err(format!("unknown query id strategy '{other}'")),
        }
    }
}

impl FromStr for OutcomeDelivery {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pass_through" | "passthrough" => Ok(Self::PassThrough),
            "attach_to_items" | "attach" => Ok(Self::AttachToItems),
            other => Err(format!("unknown outcome delivery '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = QueryHumanConfig::default();
        assert_eq!(
            config.service.base_url,
            "https://cerebrus-prod-eastus.azurewebsites.net/"
        );
        assert_eq!(config.polling.default_timeout_seconds, 86_400);
        assert_eq!(config.polling.backoff(), Duration::from_secs(1));
        assert_eq!(config.polling.query_id_strategy, QueryIdStrategy::Timestamp);
        assert_eq!(config.node.outcome_delivery, OutcomeDelivery::PassThrough);
        assert_eq!(config.node.response_field, "response");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_query_url_appends_path() {
        let config = ServiceConfig::default();
        assert_eq!(
            config.query_url().unwrap().as_str(),
            "https://cerebrus-prod-eastus.azurewebsites.net/queryHuman"
        );

        let without_slash = ServiceConfig {
            base_url: "http://127.0.0.1:8080/api".to_string(),
            ..ServiceConfig::default()
        };
        assert_eq!(
            without_slash.query_url().unwrap().as_str(),
            "http://127.0.0.1:8080/api/queryHuman"
        );
    }

    #[test]
    fn test_env_overrides() {
        let mut config = QueryHumanConfig::default();
        config
            .apply_overrides(lookup_from(&[
                (env::BASE_URL, "http://localhost:9000/"),
                (env::TIMEOUT_SECONDS, "60"),
                (env::BACKOFF_MS, "250"),
                (env::ATTEMPT_TIMEOUT, "remaining_budget"),
                (env::QUERY_ID_STRATEGY, "timestamp_with_nonce"),
                (env::OUTCOME_DELIVERY, "attach_to_items"),
            ]))
            .unwrap();

        assert_eq!(config.service.base_url, "http://localhost:9000/");
        assert_eq!(config.polling.default_timeout_seconds, 60);
        assert_eq!(config.polling.backoff_ms, 250);
        assert_eq!(
            config.polling.attempt_timeout,
            AttemptTimeoutPolicy::RemainingBudget
        );
        assert_eq!(
            config.polling.query_id_strategy,
            QueryIdStrategy::TimestampWithNonce
        );
        assert_eq!(config.node.outcome_delivery, OutcomeDelivery::AttachToItems);
    }

    #[test]
    fn test_invalid_env_value_is_an_error() {
        let mut config = QueryHumanConfig::default();
        let err = config
            .apply_overrides(lookup_from(&[(env::TIMEOUT_SECONDS, "one day")]))
            .unwrap_err();
        assert!(matches!(err, QueryHumanError::Configuration(msg) if msg.contains("QUERY_HUMAN_TIMEOUT_SECONDS")));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = QueryHumanConfig::default();
        config.service.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = QueryHumanConfig::default();
        config.polling.default_timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = QueryHumanConfig::default();
        config.node.response_field = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_backoff_is_rejected() {
        let mut config = QueryHumanConfig::default();
        config
            .apply_overrides(lookup_from(&[(env::BACKOFF_MS, "0")]))
            .unwrap();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, QueryHumanError::Configuration(msg) if msg.contains("backoff_ms")));
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("query-human.toml");
        std::fs::write(
            &path,
            r#"
[polling]
default_timeout_seconds = 120
attempt_timeout = "remaining_budget"
"#,
        )
        .unwrap();

        let config = QueryHumanConfig::load_from_file(&path).unwrap();
        assert_eq!(config.polling.default_timeout_seconds, 120);
        assert_eq!(
            config.polling.attempt_timeout,
            AttemptTimeoutPolicy::RemainingBudget
        );
        assert_eq!(config.polling.backoff_ms, 1_000);
        assert_eq!(config.service, ServiceConfig::default());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("query-human.toml");

        let mut original = QueryHumanConfig::default();
        original.node.outcome_delivery = OutcomeDelivery::AttachToItems;
        original.save_to_file(&path).unwrap();

        let loaded = QueryHumanConfig::load_from_file(&path).unwrap();
        assert_eq!(original, loaded);
    }
}
