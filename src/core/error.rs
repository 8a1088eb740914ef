//! Error types for scheduler operations and event replies.

use std::time::Duration;

use thiserror::Error;

/// Errors produced by scheduler components.
///
/// None of these ever reach a caller through `emit`; action outcomes travel
/// inside [`EventError`] on the caller's reply channel instead.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A dequeue was attempted on an empty pending queue.
    #[error("empty queue")]
    EmptyQueue,
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The scheduler has been stopped and cannot be restarted.
    #[error("scheduler has been stopped")]
    Stopped,
    /// The run-loop thread could not be spawned.
    #[error("failed to spawn run loop: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Failure delivered on a reply channel in place of a payload.
#[derive(Debug, Error)]
pub enum EventError<E> {
    /// The action itself returned an error; the value is passed through untouched.
    #[error("action failed: {0}")]
    Action(E),
    /// The action did not finish within the configured per-action timeout.
    #[error("action exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),
    /// The action panicked while running.
    #[error("action panicked: {0}")]
    Panicked(String),
    /// The scheduler stopped before the action could run.
    #[error("scheduler stopped before the event ran")]
    Stopped,
}

impl<E> EventError<E> {
    /// Returns the action's own error, if that is what this is.
    pub fn into_action_error(self) -> Option<E> {
        match self {
            Self::Action(err) => Some(err),
            _ => None,
        }
    }

    /// Whether the action never ran because the scheduler stopped.
    pub const fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
