//! Plugin Module
//!
//! Provides the plugin execution engine:
//! - Plugin interface and execution context
//! - Results and structured errors
//! - Lifecycle and panic isolation
//! - Plugin registry with single and batch execution

pub mod context;
pub mod interface;
pub mod isolation;
pub mod lifecycle;
pub mod registry;
pub mod result;

pub use context::{Period, PluginExecutionContext, TimeRange};
pub use interface::{
    config_value, ConfigField, ConfigFieldType, Plugin, PluginCategory, PluginConfig, PluginInfo,
};
pub use lifecycle::PluginState;
pub use registry::{ExecuteAllOptions, PluginRegistry, RegisteredPlugin};
pub use result::{
    ErrorCode, PluginError, PluginExecutionError, PluginExecutionResult, PluginResult,
    ResultMetadata,
};
