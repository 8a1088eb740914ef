//! Retry executor with exponential backoff.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::backoff::next_backoff;
use crate::config::retry::{DEFAULT_INITIAL_DELAY, DEFAULT_MAX_DELAY, DEFAULT_MAX_TRIES};
use crate::config::RetryConfig;

/// Re-runs a fallible operation until it succeeds or the attempt budget runs out.
///
/// Between attempts it sleeps for [`next_backoff`]. The executor holds no
/// mutable state; one instance can drive any number of concurrent operations.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use eventloop::retry::Retry;
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let retry = Retry::new(3, Duration::from_millis(1), Duration::from_millis(5));
///
/// let mut calls = 0;
/// let result: Result<u32, &str> = rt.block_on(retry.run(|| {
///     calls += 1;
///     let outcome = if calls < 3 { Err("not yet") } else { Ok(calls) };
///     async move { outcome }
/// }));
/// assert_eq!(result, Ok(3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retry {
    max_tries: u32,
    initial_delay: Duration,
    max_delay: Duration,
}

impl Default for Retry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TRIES, DEFAULT_INITIAL_DELAY, DEFAULT_MAX_DELAY)
    }
}

impl Retry {
    /// Create an executor. Zero values fall back to the defaults.
    #[must_use]
    pub fn new(max_tries: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_tries: if max_tries == 0 { DEFAULT_MAX_TRIES } else { max_tries },
            initial_delay: if initial_delay.is_zero() {
                DEFAULT_INITIAL_DELAY
            } else {
                initial_delay
            },
            max_delay: if max_delay.is_zero() {
                DEFAULT_MAX_DELAY
            } else {
                max_delay
            },
        }
    }

    /// Create an executor from configuration.
    #[must_use]
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_tries,
            Duration::from_millis(config.initial_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }

    /// Total attempts, including the first.
    pub const fn max_tries(&self) -> u32 {
        self.max_tries
    }

    /// Lower bound of the backoff.
    pub const fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Upper bound of the backoff.
    pub const fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Delay before the next attempt after `attempt` failures.
    pub fn backoff(&self, attempt: u32) -> Duration {
        next_backoff(attempt, self.initial_delay, self.max_delay)
    }

    /// Run `attempt` until it succeeds or `max_tries` attempts have failed.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt.
    pub async fn run<T, E, F, Fut>(&self, attempt: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let never = CancellationToken::new();
        self.drive(&never, attempt).await
    }

    /// Like [`run`](Self::run), but stops waiting as soon as `token` is cancelled.
    ///
    /// Each attempt receives a clone of `token`. An attempt already in
    /// progress is never interrupted by the executor.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt, whether the budget ran out or
    /// the token was cancelled.
    pub async fn run_with_cancel<T, E, F, Fut>(
        &self,
        token: &CancellationToken,
        mut attempt: F,
    ) -> Result<T, E>
    where
        F: FnMut(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let handed_out = token.clone();
        self.drive(token, move || attempt(handed_out.clone())).await
    }

    /// Like [`run_with_cancel`](Self::run_with_cancel) with a token that is
    /// cancelled once `deadline` passes.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt.
    pub async fn run_with_deadline<T, E, F, Fut>(&self, deadline: Instant, attempt: F) -> Result<T, E>
    where
        F: FnMut(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let token = CancellationToken::new();
        let timer = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
                token.cancel();
            })
        };

        let result = self.run_with_cancel(&token, attempt).await;
        timer.abort();
        result
    }

    /// Blocking variant of [`run`](Self::run) for callers outside an async runtime.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt.
    pub fn run_blocking<T, E, F>(&self, mut attempt: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
    {
        let mut attempts = 0_u32;
        loop {
            let err = match attempt() {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            attempts += 1;
            if attempts >= self.max_tries {
                debug!(attempts, "retry budget exhausted");
                return Err(err);
            }
            let wait = self.backoff(attempts);
            debug!(attempt = attempts, wait_ms = wait.as_millis(), "attempt failed, backing off");
            std::thread::sleep(wait);
        }
    }

    async fn drive<T, E, F, Fut>(&self, token: &CancellationToken, mut attempt: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempts = 0_u32;
        loop {
            let err = match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            attempts += 1;
            if attempts >= self.max_tries {
                debug!(attempts, "retry budget exhausted");
                return Err(err);
            }

            let wait = self.backoff(attempts);
            debug!(attempt = attempts, wait_ms = wait.as_millis(), "attempt failed, backing off");

            tokio::select! {
                biased;
                () = token.cancelled() => {
                    debug!(attempts, "retry cancelled");
                    return Err(err);
                }
                () = tokio::time::sleep(wait) => {}
            }
        }
    }
}
