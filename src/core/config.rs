//! Engine configuration.
//!
//! Environment-driven settings for the process hosting the plugin engine.

use crate::core::{Error, Result};
use crate::monitoring::LoggerConfig;
use crate::plugin::ExecuteAllOptions;
use serde::{Deserialize, Serialize};

const ENV_ENVIRONMENT: &str = "POSTLENS_ENV";
const ENV_LOG_LEVEL: &str = "POSTLENS_LOG_LEVEL";
const ENV_LOG_FORMAT: &str = "POSTLENS_LOG_FORMAT";
const ENV_PARALLEL: &str = "POSTLENS_PARALLEL";
const ENV_FAIL_FAST: &str = "POSTLENS_FAIL_FAST";
const ENV_CATEGORY: &str = "POSTLENS_CATEGORY";
const ENV_MOCK_MODE: &str = "POSTLENS_MOCK_MODE";

/// Top-level engine configuration.
///
/// The engine itself is configured per call; these values are read by the
/// hosting process when it wires up its subscriber and data source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Deployment environment name
    pub environment: String,
    /// Logging setup
    pub logging: LoggerConfig,
    /// Options the host passes to `PluginRegistry::execute_all`
    pub batch: ExecuteAllOptions,
    /// Host should hand plugins an `InMemoryApiClient` instead of a live API client
    pub mock_mode: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            logging: LoggerConfig::default(),
            batch: ExecuteAllOptions::default(),
            mock_mode: false,
        }
    }
}

impl EngineConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variable names. Unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(env) = lookup(ENV_ENVIRONMENT) {
            config.environment = env;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            config.logging.level = level.parse()?;
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            config.logging.format = format.parse()?;
        }
        if let Some(parallel) = lookup(ENV_PARALLEL) {
            config.batch.parallel = parse_bool(ENV_PARALLEL, &parallel)?;
        }
        if let Some(fail_fast) = lookup(ENV_FAIL_FAST) {
            config.batch.fail_fast = parse_bool(ENV_FAIL_FAST, &fail_fast)?;
        }
        if let Some(category) = lookup(ENV_CATEGORY).filter(|c| !c.trim().is_empty()) {
            config.batch.filter_by_category = Some(category.parse()?);
        }
        if let Some(mock) = lookup(ENV_MOCK_MODE) {
            config.mock_mode = parse_bool(ENV_MOCK_MODE, &mock)?;
        }

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("{} must be a boolean, got '{}'", key, other))),
    }
}
