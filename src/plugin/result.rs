//! Plugin execution results and errors.

use crate::core::{now, Timestamp};
use crate::plugin::context::PluginExecutionContext;
use crate::plugin::interface::PluginInfo;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Warning attached when a plugin fails with something other than a
/// [`PluginExecutionError`].
pub const UNEXPECTED_ERROR_WARNING: &str = "Unexpected error occurred during plugin execution";

/// Error code reported to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    PluginNotFound,
    PluginDisabled,
    ValidationFailed,
    ExecutionFailed,
}

impl ErrorCode {
    /// Whether the caller can plausibly remedy the condition and retry.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ErrorCode::PluginDisabled | ErrorCode::ValidationFailed)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::PluginNotFound => write!(f, "PLUGIN_NOT_FOUND"),
            ErrorCode::PluginDisabled => write!(f, "PLUGIN_DISABLED"),
            ErrorCode::ValidationFailed => write!(f, "VALIDATION_FAILED"),
            ErrorCode::ExecutionFailed => write!(f, "EXECUTION_FAILED"),
        }
    }
}

/// Structured error produced by the engine for a single plugin.
#[derive(Error, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[error("[{code}] {message}")]
#[serde(rename_all = "camelCase")]
pub struct PluginExecutionError {
    pub code: ErrorCode,
    pub message: String,
    pub plugin_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub recoverable: bool,
}

impl PluginExecutionError {
    /// Create an error whose recoverability follows its code.
    pub fn new(code: ErrorCode, message: impl Into<String>, plugin_id: &str) -> Self {
        Self {
            code,
            message: message.into(),
            plugin_id: plugin_id.to_string(),
            details: None,
            recoverable: code.is_recoverable(),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn not_found(plugin_id: &str) -> Self {
        Self::new(
            ErrorCode::PluginNotFound,
            format!("Plugin {} not found", plugin_id),
            plugin_id,
        )
    }

    pub fn disabled(plugin_id: &str) -> Self {
        Self::new(
            ErrorCode::PluginDisabled,
            format!("Plugin {} is disabled", plugin_id),
            plugin_id,
        )
    }

    pub fn validation_failed(plugin_id: &str, ctx: &PluginExecutionContext) -> Self {
        Self::new(
            ErrorCode::ValidationFailed,
            format!("Plugin {} validation failed", plugin_id),
            plugin_id,
        )
        .with_details(json!({ "context": ctx.to_details() }))
    }

    /// Wrap an unexpected failure, keeping the original as `details`.
    pub fn execution_failed(plugin_id: &str, original: &str) -> Self {
        Self::new(ErrorCode::ExecutionFailed, original, plugin_id)
            .with_details(json!({ "originalError": original }))
    }
}

/// Error type returned by plugin methods.
#[derive(Error, Debug)]
pub enum PluginError {
    /// Already classified; passed through to the result unchanged
    #[error(transparent)]
    Execution(#[from] PluginExecutionError),

    /// Data-access failure
    #[error(transparent)]
    Api(#[from] crate::core::Error),

    /// Domain failure raised by plugin logic
    #[error("{0}")]
    Other(String),
}

impl PluginError {
    pub fn msg(message: impl Into<String>) -> Self {
        PluginError::Other(message.into())
    }
}

/// Result type for plugin operations.
pub type PluginResult<T> = std::result::Result<T, PluginError>;

/// Who ran and when.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    pub timestamp: Timestamp,
    pub plugin_name: String,
    pub plugin_version: String,
}

impl ResultMetadata {
    pub fn for_plugin(info: &PluginInfo) -> Self {
        Self {
            timestamp: now(),
            plugin_name: info.name.clone(),
            plugin_version: info.version.clone(),
        }
    }
}

/// Outcome of one plugin run.
///
/// `data` is present exactly when the run succeeded and `error` exactly
/// when it failed; the constructors are the only way to build one.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginExecutionResult {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<PluginExecutionError>,
    /// Elapsed milliseconds
    pub execution_time: u64,
    pub plugin_id: String,
    pub metadata: ResultMetadata,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl PluginExecutionResult {
    /// A successful run.
    pub fn succeeded(info: &PluginInfo, data: serde_json::Value, execution_time: u64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            execution_time,
            plugin_id: info.id.clone(),
            metadata: ResultMetadata::for_plugin(info),
            warnings: Vec::new(),
        }
    }

    /// A failed run.
    pub fn failed(info: &PluginInfo, error: PluginExecutionError, execution_time: u64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            execution_time,
            plugin_id: info.id.clone(),
            metadata: ResultMetadata::for_plugin(info),
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: &str) -> Self {
        self.warnings.push(warning.to_string());
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&serde_json::Value> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&PluginExecutionError> {
        self.error.as_ref()
    }

    /// Deserialize the payload into a plugin's typed result.
    pub fn data_as<T: serde::de::DeserializeOwned>(&self) -> Option<T> {
        self.data
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Collapse into the payload or the error.
    pub fn into_outcome(self) -> std::result::Result<serde_json::Value, PluginExecutionError> {
        match (self.data, self.error) {
            (Some(data), None) => Ok(data),
            (_, Some(error)) => Err(error),
            (None, None) => Err(PluginExecutionError::execution_failed(
                &self.plugin_id,
                "result carried neither data nor error",
            )),
        }
    }
}
