//! Retrying fallible operations.
//!
//! [`Retry`] re-runs an operation with exponential backoff and jitter until it
//! succeeds, the attempt budget is spent, or the caller cancels. Higher layers
//! that make remote calls depend on the [`RetryExecutor`] trait so the policy
//! can be swapped (for instance with [`NoRetry`] in tests).

pub mod backoff;
pub mod executor;

use std::future::Future;

use async_trait::async_trait;

pub use backoff::next_backoff;
pub use executor::Retry;

/// Generic "run with retries" contract.
///
/// # Example
///
/// ```rust,ignore
/// use eventloop::retry::{Retry, RetryExecutor};
///
/// async fn fetch<R: RetryExecutor>(policy: &R) -> Result<String, std::io::Error> {
///     policy.execute(|| async { call_remote().await }).await
/// }
/// ```
#[async_trait]
pub trait RetryExecutor: Send + Sync {
    /// Run `attempt` under this executor's policy.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt made.
    async fn execute<T, E, F, Fut>(&self, attempt: F) -> Result<T, E>
    where
        T: Send,
        E: Send,
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send;
}

#[async_trait]
impl RetryExecutor for Retry {
    async fn execute<T, E, F, Fut>(&self, attempt: F) -> Result<T, E>
    where
        T: Send,
        E: Send,
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        self.run(attempt).await
    }
}

/// Executor that makes exactly one attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

#[async_trait]
impl RetryExecutor for NoRetry {
    async fn execute<T, E, F, Fut>(&self, mut attempt: F) -> Result<T, E>
    where
        T: Send,
        E: Send,
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        attempt().await
    }
}
