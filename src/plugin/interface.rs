//! Plugin interface definition.
//!
//! Defines the contract every analytic module implements and the static
//! description it registers with.

use crate::plugin::context::PluginExecutionContext;
use crate::plugin::result::PluginResult;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Plugin category, used to filter batch runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginCategory {
    Analytics,
    Optimization,
    Automation,
    Reporting,
}

impl std::fmt::Display for PluginCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PluginCategory::Analytics => write!(f, "analytics"),
            PluginCategory::Optimization => write!(f, "optimization"),
            PluginCategory::Automation => write!(f, "automation"),
            PluginCategory::Reporting => write!(f, "reporting"),
        }
    }
}

impl std::str::FromStr for PluginCategory {
    type Err = crate::core::Error;

    fn from_str(s: &str) -> crate::core::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "analytics" => Ok(PluginCategory::Analytics),
            "optimization" => Ok(PluginCategory::Optimization),
            "automation" => Ok(PluginCategory::Automation),
            "reporting" => Ok(PluginCategory::Reporting),
            other => Err(crate::core::Error::Config(format!(
                "unknown plugin category '{}'",
                other
            ))),
        }
    }
}

/// Value type of a configuration option.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFieldType {
    Number,
    String,
    Boolean,
}

/// One named option in a plugin's configuration schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfigField {
    #[serde(rename = "type")]
    pub field_type: ConfigFieldType,
    pub label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

impl ConfigField {
    /// A numeric option.
    pub fn number(label: &str, required: bool) -> Self {
        Self {
            field_type: ConfigFieldType::Number,
            label: label.to_string(),
            description: String::new(),
            required,
            default: None,
        }
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }

    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// Configuration schema and default values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginConfig {
    pub requires_auth: bool,
    pub config_schema: BTreeMap<String, ConfigField>,
    pub default_config: HashMap<String, serde_json::Value>,
}

/// Plugin information.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PluginInfo {
    /// Plugin ID
    pub id: String,
    /// Plugin name
    pub name: String,
    /// Version
    pub version: String,
    /// Description
    pub description: String,
    /// Author
    pub author: String,
    /// Category
    pub category: PluginCategory,
    /// Enabled at registration time
    pub enabled: bool,
    /// Configuration schema and defaults
    pub config: PluginConfig,
}

impl PluginInfo {
    /// Create new plugin info, enabled by default.
    pub fn new(id: &str, name: &str, version: &str, category: PluginCategory) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            description: String::new(),
            author: String::new(),
            category,
            enabled: true,
            config: PluginConfig::default(),
        }
    }

    /// Set description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }

    /// Set author.
    pub fn with_author(mut self, author: &str) -> Self {
        self.author = author.to_string();
        self
    }

    /// Set the enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Require authenticated API access.
    pub fn requires_auth(mut self) -> Self {
        self.config.requires_auth = true;
        self
    }

    /// Add a configuration option. Its default, if any, becomes part of the default config.
    pub fn with_option(mut self, key: &str, field: ConfigField) -> Self {
        if let Some(default) = &field.default {
            self.config.default_config.insert(key.to_string(), default.clone());
        }
        self.config.config_schema.insert(key.to_string(), field);
        self
    }

    /// Set a default configuration value.
    pub fn with_default(mut self, key: &str, value: serde_json::Value) -> Self {
        self.config.default_config.insert(key.to_string(), value);
        self
    }

    /// Merge the default config with per-call overrides; overrides win.
    pub fn resolve_config(
        &self,
        overrides: &HashMap<String, serde_json::Value>,
    ) -> HashMap<String, serde_json::Value> {
        let mut merged = self.config.default_config.clone();
        merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }
}

/// Read a typed value out of a configuration map.
pub fn config_value<T: DeserializeOwned>(
    config: &HashMap<String, serde_json::Value>,
    key: &str,
) -> Option<T> {
    config
        .get(key)
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

/// Plugin trait that all analytic modules implement.
///
/// The registry drives every call through the same gate:
/// `initialize`, then `validate`, then `execute`, and finally `cleanup`,
/// which runs on every exit path.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Get plugin info.
    fn info(&self) -> &PluginInfo;

    /// Precondition checks. Must be idempotent.
    async fn initialize(&self, ctx: &PluginExecutionContext) -> PluginResult<()>;

    /// Primary computation.
    async fn execute(&self, ctx: &PluginExecutionContext) -> PluginResult<serde_json::Value>;

    /// Soft check; `Ok(false)` is reported as a recoverable validation failure.
    async fn validate(&self, _ctx: &PluginExecutionContext) -> PluginResult<bool> {
        Ok(true)
    }

    /// Best-effort teardown. Errors are logged and dropped by the registry.
    async fn cleanup(&self) -> PluginResult<()> {
        Ok(())
    }
}
