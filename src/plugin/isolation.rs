//! Panic isolation for plugin calls.
//!
//! A panicking plugin must not take down the caller or its sibling tasks.
//! Panics raised while polling a plugin future are caught and turned into
//! a message the registry reports as an execution failure.
//!
//! `catch_unwind` only catches unwinding panics, not aborts.

use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

/// Await `fut`, converting a panic into `Err(message)`.
pub async fn catch_panic<F, T>(fut: F) -> Result<T, String>
where
    F: Future<Output = T>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(value) => Ok(value),
        Err(panic_info) => {
            let msg = extract_panic_message(&panic_info);
            tracing::error!(message = %msg, "Plugin panicked");
            Err(msg)
        }
    }
}

/// Extract a readable message from a panic payload.
pub fn extract_panic_message(panic_info: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        format!("plugin panicked: {}", s)
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        format!("plugin panicked: {}", s)
    } else {
        "plugin panicked".to_string()
    }
}
