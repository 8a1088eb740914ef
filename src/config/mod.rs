//! Configuration models for the scheduler and the retry executor.

pub mod retry;
pub mod scheduler;

use std::env::VarError;
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Context};

use crate::core::error::AppResult;

pub use crate::core::queue::DequeueOrder;
pub use retry::RetryConfig;
pub use scheduler::{SchedulerConfig, UnrepliedPolicy};

/// Read and parse an environment variable; `None` when it is unset.
pub(crate) fn env_parse<T>(key: &str) -> AppResult<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("invalid value {raw:?} for {key}: {e}")),
        Err(VarError::NotPresent) => Ok(None),
        Err(err) => Err(err).with_context(|| format!("reading {key}")),
    }
}
