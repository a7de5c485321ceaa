//! # postlens - Plugin execution engine for social post analytics
//!
//! Runs independently authored analytic plugins against a caller-supplied
//! context and reports isolated, structured results:
//! - **Plugin**: the execution contract and the registry that drives it
//! - **Analytics**: post data model and the injected data-access capability
//! - **Plugins**: optimal posting time and performance summary modules
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use postlens::analytics::{InMemoryApiClient, Profile, Service};
//! use postlens::plugin::{ExecuteAllOptions, PluginExecutionContext};
//! use postlens::plugins::builtin_registry;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = InMemoryApiClient::new().with_profile(Profile::new("p1", Service::Twitter));
//!     let ctx = PluginExecutionContext::new(Arc::new(client)).with_profile("p1");
//!
//!     let registry = builtin_registry();
//!     let results = registry
//!         .execute_all(&ctx, &ExecuteAllOptions::default())
//!         .await
//!         .unwrap();
//!     for (id, result) in &results {
//!         println!("{}: success={}", id, result.is_success());
//!     }
//! }
//! ```

pub mod analytics;
pub mod core;
pub mod monitoring;
pub mod plugin;
pub mod plugins;

pub use core::error::{Error, Result};
pub use plugin::{
    ExecuteAllOptions, Plugin, PluginExecutionContext, PluginExecutionError, PluginExecutionResult,
    PluginRegistry,
};
