//! Built-in analytic plugins.

pub mod optimal_timing;
pub mod performance_analytics;

pub use optimal_timing::{OptimalTimingAnalysis, OptimalTimingPlugin};
pub use performance_analytics::{AnalyticsSummary, PerformanceAnalyticsPlugin};

use crate::plugin::PluginRegistry;

/// Registry with every built-in plugin registered.
pub fn builtin_registry() -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    registry.register(OptimalTimingPlugin::new());
    registry.register(PerformanceAnalyticsPlugin::new());
    registry
}
