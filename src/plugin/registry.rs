//! Plugin registry for managing and executing plugins.
//!
//! Handles registration, lookup and the two orchestration modes: a single
//! plugin via [`PluginRegistry::execute`] and a fan-out across every enabled
//! plugin via [`PluginRegistry::execute_all`].
//!
//! Registration takes `&mut self` and is meant for startup. Execution only
//! needs `&self`, so the plugin map is frozen for as long as any run is in
//! flight.

use crate::core::{elapsed_ms, now, Timestamp};
use crate::plugin::context::PluginExecutionContext;
use crate::plugin::interface::{Plugin, PluginCategory, PluginInfo};
use crate::plugin::lifecycle::{run_scoped, Invocation, PluginState};
use crate::plugin::result::{
    PluginError, PluginExecutionError, PluginExecutionResult, UNEXPECTED_ERROR_WARNING,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Options for [`PluginRegistry::execute_all`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExecuteAllOptions {
    /// Run plugins concurrently (default) or one after another
    pub parallel: bool,
    /// Raise the first failure instead of returning the map
    pub fail_fast: bool,
    /// Only run plugins of this category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_by_category: Option<PluginCategory>,
}

impl Default for ExecuteAllOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            fail_fast: false,
            filter_by_category: None,
        }
    }
}

impl ExecuteAllOptions {
    /// Run plugins one at a time in registration order.
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Default::default()
        }
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_category(mut self, category: PluginCategory) -> Self {
        self.filter_by_category = Some(category);
        self
    }
}

/// Registered plugin entry.
#[derive(Clone)]
pub struct RegisteredPlugin {
    /// Plugin instance
    plugin: Arc<dyn Plugin>,
    /// Current enabled flag, seeded from the plugin's info
    enabled: bool,
    /// Registration time
    registered_at: Timestamp,
}

impl RegisteredPlugin {
    pub fn id(&self) -> &str {
        &self.plugin.info().id
    }

    pub fn info(&self) -> &PluginInfo {
        self.plugin.info()
    }

    pub fn plugin(&self) -> &Arc<dyn Plugin> {
        &self.plugin
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn registered_at(&self) -> Timestamp {
        self.registered_at
    }

    /// Catalog view of the plugin, reflecting the current enabled flag.
    pub fn descriptor(&self) -> PluginInfo {
        let mut info = self.info().clone();
        info.enabled = self.enabled;
        info
    }
}

impl std::fmt::Debug for RegisteredPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredPlugin")
            .field("id", &self.id())
            .field("enabled", &self.enabled)
            .field("registered_at", &self.registered_at)
            .finish()
    }
}

/// Plugin registry.
#[derive(Default)]
pub struct PluginRegistry {
    /// Registered plugins
    plugins: HashMap<String, RegisteredPlugin>,
    /// Registration order
    order: Vec<String>,
}

impl PluginRegistry {
    /// Create a new registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin.
    pub fn register<P: Plugin + 'static>(&mut self, plugin: P) {
        self.register_arc(Arc::new(plugin));
    }

    /// Register a shared plugin instance.
    ///
    /// An existing entry with the same id is replaced in place.
    pub fn register_arc(&mut self, plugin: Arc<dyn Plugin>) {
        let info = plugin.info();
        let id = info.id.clone();
        tracing::info!(plugin_id = %id, name = %info.name, version = %info.version, "Registering plugin");

        let entry = RegisteredPlugin {
            enabled: info.enabled,
            plugin,
            registered_at: now(),
        };

        if self.plugins.insert(id.clone(), entry).is_some() {
            tracing::warn!(plugin_id = %id, "Replaced previously registered plugin");
        } else {
            self.order.push(id);
        }
    }

    /// Enable or disable a registered plugin.
    pub fn set_enabled(&mut self, plugin_id: &str, enabled: bool) -> Result<(), PluginExecutionError> {
        let entry = self
            .plugins
            .get_mut(plugin_id)
            .ok_or_else(|| PluginExecutionError::not_found(plugin_id))?;
        entry.enabled = enabled;
        tracing::info!(plugin_id = %plugin_id, enabled, "Plugin enabled flag changed");
        Ok(())
    }

    /// Get plugin by ID.
    pub fn get_plugin(&self, plugin_id: &str) -> Option<&RegisteredPlugin> {
        self.plugins.get(plugin_id)
    }

    /// All plugins in registration order.
    pub fn plugins(&self) -> Vec<&RegisteredPlugin> {
        self.order
            .iter()
            .filter_map(|id| self.plugins.get(id))
            .collect()
    }

    /// Enabled plugins in registration order.
    pub fn available_plugins(&self) -> Vec<&RegisteredPlugin> {
        self.plugins()
            .into_iter()
            .filter(|entry| entry.enabled)
            .collect()
    }

    /// Get plugin count.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Execute one plugin.
    ///
    /// Returns `Err` only when the plugin is unknown or disabled. Every
    /// failure of a found, enabled plugin is reported inside the result.
    pub async fn execute(
        &self,
        plugin_id: &str,
        ctx: &PluginExecutionContext,
    ) -> Result<PluginExecutionResult, PluginExecutionError> {
        let started = Instant::now();
        let entry = self
            .plugins
            .get(plugin_id)
            .ok_or_else(|| PluginExecutionError::not_found(plugin_id))?;
        dispatch(entry, ctx, started).await
    }

    /// Execute every enabled plugin, optionally filtered by category.
    ///
    /// In parallel mode every plugin runs to completion before a
    /// `fail_fast` failure is raised. In sequential mode `fail_fast`
    /// stops at the first failure and later plugins never run.
    pub async fn execute_all(
        &self,
        ctx: &PluginExecutionContext,
        options: &ExecuteAllOptions,
    ) -> Result<HashMap<String, PluginExecutionResult>, PluginExecutionError> {
        let selected: Vec<RegisteredPlugin> = self
            .available_plugins()
            .into_iter()
            .filter(|entry| {
                options
                    .filter_by_category
                    .map_or(true, |category| entry.info().category == category)
            })
            .cloned()
            .collect();

        tracing::debug!(
            plugins = selected.len(),
            parallel = options.parallel,
            fail_fast = options.fail_fast,
            "Executing plugin batch"
        );

        if options.parallel {
            fan_out(selected, ctx, options.fail_fast).await
        } else {
            run_sequential(selected, ctx, options.fail_fast).await
        }
    }
}

async fn fan_out(
    selected: Vec<RegisteredPlugin>,
    ctx: &PluginExecutionContext,
    fail_fast: bool,
) -> Result<HashMap<String, PluginExecutionResult>, PluginExecutionError> {
    let handles: Vec<_> = selected
        .iter()
        .map(|entry| {
            let entry = entry.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move {
                let started = Instant::now();
                dispatch(&entry, &ctx, started)
                    .await
                    .unwrap_or_else(|e| boundary_failure(entry.info(), &e.to_string()))
            })
        })
        .collect();

    // Wait for every task; one failing never cancels the others.
    let settled = join_all(handles).await;

    let mut results = HashMap::with_capacity(selected.len());
    let mut first_failure: Option<PluginExecutionError> = None;

    for (entry, joined) in selected.iter().zip(settled) {
        let result = joined.unwrap_or_else(|e| {
            tracing::error!(plugin_id = %entry.id(), error = %e, "Plugin task did not complete");
            boundary_failure(entry.info(), &e.to_string())
        });

        if fail_fast && first_failure.is_none() {
            first_failure = result.error().cloned();
        }
        results.insert(entry.id().to_string(), result);
    }

    match first_failure {
        Some(error) => Err(error),
        None => Ok(results),
    }
}

async fn run_sequential(
    selected: Vec<RegisteredPlugin>,
    ctx: &PluginExecutionContext,
    fail_fast: bool,
) -> Result<HashMap<String, PluginExecutionResult>, PluginExecutionError> {
    let mut results = HashMap::with_capacity(selected.len());

    for entry in &selected {
        let result = match dispatch(entry, ctx, Instant::now()).await {
            Ok(result) => result,
            Err(e) if fail_fast => return Err(e),
            Err(e) => boundary_failure(entry.info(), &e.to_string()),
        };

        if fail_fast {
            if let Some(error) = result.error() {
                return Err(error.clone());
            }
        }
        results.insert(entry.id().to_string(), result);
    }

    Ok(results)
}

/// Failure recorded when an error escapes a single execution inside a batch.
fn boundary_failure(info: &PluginInfo, message: &str) -> PluginExecutionResult {
    PluginExecutionResult::failed(info, PluginExecutionError::execution_failed(&info.id, message), 0)
}

/// Gate on the enabled flag, then run the full lifecycle.
async fn dispatch(
    entry: &RegisteredPlugin,
    ctx: &PluginExecutionContext,
    started: Instant,
) -> Result<PluginExecutionResult, PluginExecutionError> {
    if !entry.enabled {
        return Err(PluginExecutionError::disabled(entry.id()));
    }

    let span = tracing::info_span!("plugin_execution", plugin_id = %entry.id(), execution_id = %Uuid::new_v4());
    Ok(invoke(entry.plugin.as_ref(), ctx, started).instrument(span).await)
}

async fn invoke(plugin: &dyn Plugin, ctx: &PluginExecutionContext, started: Instant) -> PluginExecutionResult {
    let info = plugin.info();
    let mut invocation = Invocation::new(&info.id);

    let outcome = run_scoped(plugin, run_stages(plugin, ctx, &mut invocation)).await;
    if !invocation.state().is_terminal() {
        invocation.advance(PluginState::Failed);
    }
    invocation.advance(PluginState::CleanedUp);

    let execution_time = elapsed_ms(started);
    let failure = match outcome {
        Ok(Ok(data)) => {
            tracing::debug!(elapsed_ms = execution_time, "Plugin execution completed");
            return PluginExecutionResult::succeeded(info, data, execution_time);
        }
        Ok(Err(PluginError::Execution(error))) => {
            tracing::error!(code = %error.code, error = %error.message, "Plugin execution failed");
            return PluginExecutionResult::failed(info, error, execution_time);
        }
        Ok(Err(other)) => other.to_string(),
        Err(panic_message) => panic_message,
    };

    tracing::error!(error = %failure, "Plugin execution failed unexpectedly");
    PluginExecutionResult::failed(
        info,
        PluginExecutionError::execution_failed(&info.id, &failure),
        execution_time,
    )
    .with_warning(UNEXPECTED_ERROR_WARNING)
}

async fn run_stages(
    plugin: &dyn Plugin,
    ctx: &PluginExecutionContext,
    invocation: &mut Invocation,
) -> Result<serde_json::Value, PluginError> {
    let plugin_id = &plugin.info().id;

    invocation.advance(PluginState::Initializing);
    plugin.initialize(ctx).await?;

    invocation.advance(PluginState::Validating);
    if !plugin.validate(ctx).await? {
        return Err(PluginExecutionError::validation_failed(plugin_id, ctx).into());
    }

    invocation.advance(PluginState::Executing);
    let data = plugin.execute(ctx).await?;

    invocation.advance(PluginState::Completed);
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::result::ErrorCode;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Clone, Copy, PartialEq)]
    enum Behavior {
        Succeed,
        FailPlain,
        FailClassified,
        FailInit,
        RejectValidation,
        Panic,
    }

    #[derive(Default)]
    struct Calls {
        initialize: AtomicUsize,
        execute: AtomicUsize,
        cleanup: AtomicUsize,
    }

    struct MockPlugin {
        info: PluginInfo,
        behavior: Behavior,
        failing_cleanup: bool,
        delay: Duration,
        rendezvous: Option<Arc<tokio::sync::Barrier>>,
        calls: Arc<Calls>,
    }

    impl MockPlugin {
        fn new(id: &str, behavior: Behavior) -> Self {
            Self {
                info: PluginInfo::new(id, &format!("Mock {}", id), "1.0.0", PluginCategory::Analytics),
                behavior,
                failing_cleanup: false,
                delay: Duration::ZERO,
                rendezvous: None,
                calls: Arc::new(Calls::default()),
            }
        }

        fn category(mut self, category: PluginCategory) -> Self {
            self.info.category = category;
            self
        }

        fn disabled(mut self) -> Self {
            self.info.enabled = false;
            self
        }

        fn failing_cleanup(mut self) -> Self {
            self.failing_cleanup = true;
            self
        }

        fn delayed(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn meeting_at(mut self, barrier: &Arc<tokio::sync::Barrier>) -> Self {
            self.rendezvous = Some(Arc::clone(barrier));
            self
        }

        fn calls(&self) -> Arc<Calls> {
            Arc::clone(&self.calls)
        }
    }

    #[async_trait]
    impl Plugin for MockPlugin {
        fn info(&self) -> &PluginInfo {
            &self.info
        }

        async fn initialize(&self, _ctx: &PluginExecutionContext) -> Result<(), PluginError> {
            self.calls.initialize.fetch_add(1, Ordering::SeqCst);
            if self.behavior == Behavior::FailInit {
                return Err(PluginError::msg("Profile ID is required"));
            }
            Ok(())
        }

        async fn execute(&self, _ctx: &PluginExecutionContext) -> Result<serde_json::Value, PluginError> {
            self.calls.execute.fetch_add(1, Ordering::SeqCst);
            if let Some(barrier) = &self.rendezvous {
                barrier.wait().await;
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match self.behavior {
                Behavior::FailPlain => Err(PluginError::msg("boom")),
                Behavior::FailClassified => Err(PluginExecutionError::new(
                    ErrorCode::ValidationFailed,
                    "bad window",
                    &self.info.id,
                )
                .into()),
                Behavior::Panic => panic!("exploded"),
                _ => Ok(json!({ "plugin": self.info.id })),
            }
        }

        async fn validate(&self, _ctx: &PluginExecutionContext) -> Result<bool, PluginError> {
            Ok(self.behavior != Behavior::RejectValidation)
        }

        async fn cleanup(&self) -> Result<(), PluginError> {
            self.calls.cleanup.fetch_add(1, Ordering::SeqCst);
            if self.failing_cleanup {
                return Err(PluginError::msg("cleanup exploded"));
            }
            Ok(())
        }
    }

    fn ctx() -> PluginExecutionContext {
        PluginExecutionContext::default().with_profile("p1")
    }

    #[test]
    fn test_registry_creation() {
        let registry = PluginRegistry::new();
        assert_eq!(registry.len(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = PluginRegistry::new();
        registry.register(MockPlugin::new("a", Behavior::Succeed));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_plugin("a").map(|p| p.id()), Some("a"));
        assert!(registry.get_plugin("b").is_none());
    }

    #[test]
    fn test_reregister_overwrites_in_place() {
        let mut registry = PluginRegistry::new();
        registry.register(MockPlugin::new("a", Behavior::Succeed));
        registry.register(MockPlugin::new("b", Behavior::Succeed));
        registry.register(MockPlugin::new("a", Behavior::FailPlain).disabled());

        assert_eq!(registry.len(), 2);
        let ids: Vec<&str> = registry.plugins().iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(!registry.get_plugin("a").unwrap().is_enabled());
    }

    #[test]
    fn test_available_plugins_only_enabled() {
        let mut registry = PluginRegistry::new();
        registry.register(MockPlugin::new("a", Behavior::Succeed));
        registry.register(MockPlugin::new("b", Behavior::Succeed).disabled());
        registry.register(MockPlugin::new("c", Behavior::Succeed));

        let ids: Vec<&str> = registry.available_plugins().iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_set_enabled_and_descriptor() {
        let mut registry = PluginRegistry::new();
        registry.register(MockPlugin::new("a", Behavior::Succeed));

        registry.set_enabled("a", false).unwrap();
        assert!(registry.available_plugins().is_empty());
        assert!(!registry.get_plugin("a").unwrap().descriptor().enabled);

        let err = registry.set_enabled("zzz", true).unwrap_err();
        assert_eq!(err.code, ErrorCode::PluginNotFound);
    }

    #[tokio::test]
    async fn test_execute_success() {
        let mut registry = PluginRegistry::new();
        let plugin = MockPlugin::new("a", Behavior::Succeed);
        let calls = plugin.calls();
        registry.register(plugin);

        let result = registry.execute("a", &ctx()).await.unwrap();
        assert!(result.is_success());
        assert_eq!(result.data(), Some(&json!({ "plugin": "a" })));
        assert_eq!(result.plugin_id, "a");
        assert_eq!(result.metadata.plugin_name, "Mock a");
        assert!(result.warnings.is_empty());
        assert_eq!(calls.cleanup.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_execute_missing_plugin() {
        let registry = PluginRegistry::new();
        let err = registry.execute("missing-id", &ctx()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PluginNotFound);
        assert!(!err.recoverable);
        assert_eq!(err.plugin_id, "missing-id");
    }

    #[tokio::test]
    async fn test_execute_disabled_plugin_skips_lifecycle() {
        let mut registry = PluginRegistry::new();
        let plugin = MockPlugin::new("b", Behavior::Succeed).disabled();
        let calls = plugin.calls();
        registry.register(plugin);

        let err = registry.execute("b", &ctx()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PluginDisabled);
        assert!(err.recoverable);
        assert_eq!(calls.initialize.load(Ordering::SeqCst), 0);
        assert_eq!(calls.execute.load(Ordering::SeqCst), 0);
        assert_eq!(calls.cleanup.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_plain_error_becomes_execution_failed() {
        let mut registry = PluginRegistry::new();
        let plugin = MockPlugin::new("a", Behavior::FailPlain);
        let calls = plugin.calls();
        registry.register(plugin);

        let result = registry.execute("a", &ctx()).await.unwrap();
        assert!(!result.is_success());
        assert!(result.data().is_none());
        let error = result.error().unwrap();
        assert_eq!(error.code, ErrorCode::ExecutionFailed);
        assert!(!error.recoverable);
        assert_eq!(error.message, "boom");
        assert_eq!(error.details, Some(json!({ "originalError": "boom" })));
        assert_eq!(result.warnings, vec![UNEXPECTED_ERROR_WARNING.to_string()]);
        assert_eq!(calls.cleanup.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_classified_error_passes_through_unchanged() {
        let mut registry = PluginRegistry::new();
        registry.register(MockPlugin::new("a", Behavior::FailClassified));

        let result = registry.execute("a", &ctx()).await.unwrap();
        let error = result.error().unwrap();
        assert_eq!(error.code, ErrorCode::ValidationFailed);
        assert_eq!(error.message, "bad window");
        assert!(result.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_initialize_failure_skips_execute() {
        let mut registry = PluginRegistry::new();
        let plugin = MockPlugin::new("a", Behavior::FailInit);
        let calls = plugin.calls();
        registry.register(plugin);

        let result = registry.execute("a", &ctx()).await.unwrap();
        assert_eq!(result.error().unwrap().code, ErrorCode::ExecutionFailed);
        assert_eq!(calls.execute.load(Ordering::SeqCst), 0);
        assert_eq!(calls.cleanup.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_validation_rejection() {
        let mut registry = PluginRegistry::new();
        let plugin = MockPlugin::new("a", Behavior::RejectValidation);
        let calls = plugin.calls();
        registry.register(plugin);

        let result = registry.execute("a", &ctx()).await.unwrap();
        let error = result.error().unwrap();
        assert_eq!(error.code, ErrorCode::ValidationFailed);
        assert!(error.recoverable);
        assert_eq!(error.details.as_ref().unwrap()["context"]["profileId"], json!("p1"));
        assert_eq!(calls.execute.load(Ordering::SeqCst), 0);
        assert_eq!(calls.cleanup.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panic_is_isolated() {
        let mut registry = PluginRegistry::new();
        let plugin = MockPlugin::new("a", Behavior::Panic);
        let calls = plugin.calls();
        registry.register(plugin);

        let result = registry.execute("a", &ctx()).await.unwrap();
        let error = result.error().unwrap();
        assert_eq!(error.code, ErrorCode::ExecutionFailed);
        assert!(error.message.contains("exploded"));
        assert_eq!(calls.cleanup.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failing_cleanup_never_changes_result() {
        let mut registry = PluginRegistry::new();
        let ok = MockPlugin::new("ok", Behavior::Succeed).failing_cleanup();
        let bad = MockPlugin::new("bad", Behavior::FailPlain).failing_cleanup();
        let (ok_calls, bad_calls) = (ok.calls(), bad.calls());
        registry.register(ok);
        registry.register(bad);

        assert!(registry.execute("ok", &ctx()).await.unwrap().is_success());
        let failed = registry.execute("bad", &ctx()).await.unwrap();
        assert_eq!(failed.error().unwrap().message, "boom");
        assert_eq!(ok_calls.cleanup.load(Ordering::SeqCst), 1);
        assert_eq!(bad_calls.cleanup.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_execute_all_default_options() {
        let mut registry = PluginRegistry::new();
        registry.register(MockPlugin::new("a", Behavior::Succeed));
        registry.register(MockPlugin::new("b", Behavior::Succeed).disabled());

        let results = registry
            .execute_all(&ctx(), &ExecuteAllOptions::default())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert!(results["a"].is_success());
    }

    #[tokio::test]
    async fn test_execute_all_isolates_failures() {
        let mut registry = PluginRegistry::new();
        registry.register(MockPlugin::new("a", Behavior::Succeed));
        registry.register(MockPlugin::new("b", Behavior::Panic));
        registry.register(MockPlugin::new("c", Behavior::FailPlain));
        registry.register(MockPlugin::new("d", Behavior::Succeed));

        let results = registry
            .execute_all(&ctx(), &ExecuteAllOptions::default())
            .await
            .unwrap();

        let mut keys: Vec<&str> = results.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["a", "b", "c", "d"]);
        assert!(results["a"].is_success());
        assert!(!results["b"].is_success());
        assert!(!results["c"].is_success());
        assert!(results["d"].is_success());
    }

    #[tokio::test]
    async fn test_execute_all_category_filter() {
        let mut registry = PluginRegistry::new();
        registry.register(MockPlugin::new("a", Behavior::Succeed));
        registry.register(MockPlugin::new("o", Behavior::Succeed).category(PluginCategory::Optimization));

        let options = ExecuteAllOptions::default().with_category(PluginCategory::Optimization);
        let results = registry.execute_all(&ctx(), &options).await.unwrap();

        assert_eq!(results.len(), 1);
        assert!(results.contains_key("o"));

        let sequential = ExecuteAllOptions::sequential().with_category(PluginCategory::Reporting);
        assert!(registry.execute_all(&ctx(), &sequential).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sequential_fail_fast_stops_early() {
        let mut registry = PluginRegistry::new();
        let first = MockPlugin::new("first", Behavior::Succeed);
        let failing = MockPlugin::new("failing", Behavior::FailPlain);
        let after = MockPlugin::new("after", Behavior::Succeed);
        let (failing_calls, after_calls) = (failing.calls(), after.calls());
        registry.register(first);
        registry.register(failing);
        registry.register(after);

        let options = ExecuteAllOptions::sequential().with_fail_fast(true);
        let err = registry.execute_all(&ctx(), &options).await.unwrap_err();

        assert_eq!(err.plugin_id, "failing");
        assert_eq!(err.code, ErrorCode::ExecutionFailed);
        assert_eq!(failing_calls.cleanup.load(Ordering::SeqCst), 1);
        assert_eq!(after_calls.initialize.load(Ordering::SeqCst), 0);
        assert_eq!(after_calls.execute.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sequential_without_fail_fast_runs_everything() {
        let mut registry = PluginRegistry::new();
        registry.register(MockPlugin::new("a", Behavior::FailPlain));
        registry.register(MockPlugin::new("b", Behavior::Succeed));

        let results = registry
            .execute_all(&ctx(), &ExecuteAllOptions::sequential())
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(!results["a"].is_success());
        assert!(results["b"].is_success());
    }

    #[tokio::test]
    async fn test_parallel_fail_fast_runs_all_before_raising() {
        let mut registry = PluginRegistry::new();
        let failing = MockPlugin::new("failing", Behavior::FailPlain);
        let slow = MockPlugin::new("slow", Behavior::Succeed).delayed(Duration::from_millis(50));
        let (failing_calls, slow_calls) = (failing.calls(), slow.calls());
        registry.register(failing);
        registry.register(slow);

        let options = ExecuteAllOptions::default().with_fail_fast(true);
        let err = registry.execute_all(&ctx(), &options).await.unwrap_err();

        assert_eq!(err.plugin_id, "failing");
        assert_eq!(slow_calls.execute.load(Ordering::SeqCst), 1);
        assert_eq!(slow_calls.cleanup.load(Ordering::SeqCst), 1);
        assert_eq!(failing_calls.cleanup.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_parallel_runs_concurrently() {
        // Each plugin blocks until all three are executing at once.
        let barrier = Arc::new(tokio::sync::Barrier::new(3));
        let mut registry = PluginRegistry::new();
        for id in ["a", "b", "c"] {
            registry.register(MockPlugin::new(id, Behavior::Succeed).meeting_at(&barrier));
        }

        let results = tokio::time::timeout(
            Duration::from_secs(10),
            registry.execute_all(&ctx(), &ExecuteAllOptions::default()),
        )
        .await
        .expect("plugins never ran at the same time")
        .unwrap();

        assert_eq!(results.len(), 3);
        assert!(results.values().all(|r| r.is_success()));
    }

    #[test]
    fn test_options_deserialize_defaults() {
        let options: ExecuteAllOptions = serde_json::from_value(json!({})).unwrap();
        assert_eq!(options, ExecuteAllOptions::default());

        let options: ExecuteAllOptions =
            serde_json::from_value(json!({ "parallel": false, "failFast": true, "filterByCategory": "analytics" }))
                .unwrap();
        assert!(!options.parallel);
        assert!(options.fail_fast);
        assert_eq!(options.filter_by_category, Some(PluginCategory::Analytics));
    }
}
