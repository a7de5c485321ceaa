//! Per-call execution context.

use crate::analytics::{ApiClient, PostQuery};
use crate::core::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Reporting period attached to a time range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    Month,
    Quarter,
    Year,
}

/// Time window a plugin should analyze.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

impl TimeRange {
    pub fn between(start: Timestamp, end: Timestamp) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            period: None,
        }
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    /// Post query covering this range.
    pub fn to_query(&self) -> PostQuery {
        PostQuery {
            start: self.start,
            end: self.end,
        }
    }
}

/// Input to every plugin run. Owned by the caller and read-only to plugins.
#[derive(Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginExecutionContext {
    /// Profile to analyze
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    /// Window to analyze
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
    /// Per-call configuration overrides
    pub config: HashMap<String, serde_json::Value>,
    /// Data-access capability
    #[serde(skip_serializing)]
    pub api_client: Option<Arc<dyn ApiClient>>,
}

impl PluginExecutionContext {
    /// Create a context bound to a data-access capability.
    pub fn new(api_client: Arc<dyn ApiClient>) -> Self {
        Self {
            api_client: Some(api_client),
            ..Default::default()
        }
    }

    pub fn with_profile(mut self, profile_id: &str) -> Self {
        self.profile_id = Some(profile_id.to_string());
        self
    }

    pub fn with_time_range(mut self, time_range: TimeRange) -> Self {
        self.time_range = Some(time_range);
        self
    }

    pub fn with_config(mut self, key: &str, value: serde_json::Value) -> Self {
        self.config.insert(key.to_string(), value);
        self
    }

    /// Post query for the context's time range, unbounded when absent.
    pub fn post_query(&self) -> PostQuery {
        self.time_range
            .as_ref()
            .map(TimeRange::to_query)
            .unwrap_or_default()
    }

    /// Context as JSON, without the data-access capability.
    pub fn to_details(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl std::fmt::Debug for PluginExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginExecutionContext")
            .field("profile_id", &self.profile_id)
            .field("time_range", &self.time_range)
            .field("config", &self.config)
            .field("api_client", &self.api_client.as_ref().map(|_| "<ApiClient>"))
            .finish()
    }
}
