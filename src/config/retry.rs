//! Retry executor configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::env_parse;
use crate::core::error::AppResult;

/// Attempts made when none (or zero) is configured.
pub const DEFAULT_MAX_TRIES: u32 = 5;
/// Initial backoff when none (or zero) is configured.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(200);
/// Backoff cap when none (or zero) is configured.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(1000);

/// Retry parameters. Zero values fall back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_tries: u32,
    /// Lower bound of the backoff, in milliseconds.
    pub initial_delay_ms: u64,
    /// Upper bound of the backoff, in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    #[allow(clippy::cast_possible_truncation)]
    fn default() -> Self {
        Self {
            max_tries: DEFAULT_MAX_TRIES,
            initial_delay_ms: DEFAULT_INITIAL_DELAY.as_millis() as u64,
            max_delay_ms: DEFAULT_MAX_DELAY.as_millis() as u64,
        }
    }
}

impl RetryConfig {
    /// Set the attempt budget.
    #[must_use]
    pub const fn with_max_tries(mut self, max_tries: u32) -> Self {
        self.max_tries = max_tries;
        self
    }

    /// Set the backoff bounds.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn with_delays(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_delay_ms = initial.as_millis() as u64;
        self.max_delay_ms = max.as_millis() as u64;
        self
    }

    /// Build configuration from `EVENTLOOP_RETRY_*` environment variables.
    ///
    /// # Errors
    ///
    /// Fails when a variable is set but not a valid number.
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();
        if let Some(tries) = env_parse("EVENTLOOP_RETRY_MAX_TRIES")? {
            cfg.max_tries = tries;
        }
        if let Some(ms) = env_parse("EVENTLOOP_RETRY_INITIAL_DELAY_MS")? {
            cfg.initial_delay_ms = ms;
        }
        if let Some(ms) = env_parse("EVENTLOOP_RETRY_MAX_DELAY_MS")? {
            cfg.max_delay_ms = ms;
        }
        Ok(cfg)
    }
}
