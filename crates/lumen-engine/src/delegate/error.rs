use std::any::Any;

use thiserror::Error;

/// Failure of a delegated task, as seen by the submitting thread.
#[derive(Debug, Error)]
pub enum DelegateError {
    /// The task ran on the owner thread and returned an error.
    #[error("delegated task failed: {0}")]
    Failed(#[source] anyhow::Error),

    /// The task panicked on the owner thread.
    #[error("delegated task panicked: {0}")]
    Panicked(String),

    /// The task was dropped before it ran, so its completion slot will never
    /// be fulfilled.
    #[error("delegated task was cancelled before it ran")]
    Cancelled,

    /// The delegator no longer accepts work from other threads.
    #[error("delegator is closed")]
    Closed,
}

impl DelegateError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Closed)
    }
}

/// Extracts a readable message from a `catch_unwind` payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
