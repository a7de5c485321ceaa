//! Monitoring Module
//!
//! Structured logging for the engine and its plugins.

pub mod logging;

pub use logging::{init as init_logging, subscriber, LogFormat, LogLevel, LoggerConfig};
