//! Per-invocation plugin lifecycle.
//!
//! ```text
//! Registered -> Initializing -> Validating -> Executing -> Completed -> CleanedUp
//!                    |              |             |
//!                    +--------------+-------------+------> Failed ----> CleanedUp
//! ```
//!
//! `CleanedUp` is reached on every path once a plugin has been resolved.

use crate::plugin::interface::Plugin;
use crate::plugin::isolation::catch_panic;
use std::future::Future;

/// Lifecycle state of a single invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    Registered,
    Initializing,
    Validating,
    Executing,
    Completed,
    Failed,
    CleanedUp,
}

impl std::fmt::Display for PluginState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PluginState::Registered => write!(f, "registered"),
            PluginState::Initializing => write!(f, "initializing"),
            PluginState::Validating => write!(f, "validating"),
            PluginState::Executing => write!(f, "executing"),
            PluginState::Completed => write!(f, "completed"),
            PluginState::Failed => write!(f, "failed"),
            PluginState::CleanedUp => write!(f, "cleaned_up"),
        }
    }
}

impl PluginState {
    /// Check if `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: PluginState) -> bool {
        use PluginState::*;
        matches!(
            (self, next),
            (Registered, Initializing)
                | (Initializing, Validating)
                | (Initializing, Executing)
                | (Validating, Executing)
                | (Executing, Completed)
                | (Initializing | Validating | Executing, Failed)
                | (Completed | Failed, CleanedUp)
        )
    }

    /// Check if the invocation has finished running plugin code.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PluginState::Completed | PluginState::Failed)
    }
}

/// Tracks the state of one plugin invocation and traces each transition.
#[derive(Debug)]
pub struct Invocation {
    plugin_id: String,
    state: PluginState,
}

impl Invocation {
    pub fn new(plugin_id: &str) -> Self {
        Self {
            plugin_id: plugin_id.to_string(),
            state: PluginState::Registered,
        }
    }

    pub fn state(&self) -> PluginState {
        self.state
    }

    /// Move to `next`. Illegal transitions are logged and ignored.
    pub fn advance(&mut self, next: PluginState) {
        if self.state.can_transition_to(next) {
            tracing::debug!(plugin_id = %self.plugin_id, from = %self.state, to = %next, "Plugin state transition");
            self.state = next;
        } else {
            tracing::warn!(plugin_id = %self.plugin_id, from = %self.state, to = %next, "Ignoring illegal plugin state transition");
        }
    }
}

/// Run `body`, then always run the plugin's cleanup.
///
/// Panics in `body` are caught and returned as `Err(message)`. Cleanup
/// failures and panics are logged and never reach the caller.
pub async fn run_scoped<F, T>(plugin: &dyn Plugin, body: F) -> Result<T, String>
where
    F: Future<Output = T>,
{
    let outcome = catch_panic(body).await;
    release(plugin).await;
    outcome
}

async fn release(plugin: &dyn Plugin) {
    let plugin_id = &plugin.info().id;
    match catch_panic(plugin.cleanup()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!(plugin_id = %plugin_id, error = %e, "Plugin cleanup failed");
        }
        Err(msg) => {
            tracing::warn!(plugin_id = %plugin_id, error = %msg, "Plugin cleanup panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        use PluginState::*;
        let path = [Registered, Initializing, Validating, Executing, Completed, CleanedUp];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_failure_transitions() {
        assert!(PluginState::Initializing.can_transition_to(PluginState::Failed));
        assert!(PluginState::Executing.can_transition_to(PluginState::Failed));
        assert!(PluginState::Failed.can_transition_to(PluginState::CleanedUp));
        assert!(!PluginState::Registered.can_transition_to(PluginState::Failed));
        assert!(!PluginState::CleanedUp.can_transition_to(PluginState::Initializing));
    }

    #[test]
    fn test_invocation_ignores_illegal_transition() {
        let mut invocation = Invocation::new("demo");
        invocation.advance(PluginState::Executing);
        assert_eq!(invocation.state(), PluginState::Registered);

        invocation.advance(PluginState::Initializing);
        assert_eq!(invocation.state(), PluginState::Initializing);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(PluginState::CleanedUp.to_string(), "cleaned_up");
    }
}
