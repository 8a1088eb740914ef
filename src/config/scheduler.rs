//! Scheduler configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::env_parse;
use crate::core::error::AppResult;
use crate::core::queue::DequeueOrder;

/// Default capacity of the emit hand-off channel.
pub const DEFAULT_HANDOFF_CAPACITY: usize = 100;
/// Default run-loop thread name prefix.
pub const DEFAULT_THREAD_NAME: &str = "eventloop";
/// Default run-loop thread stack size.
pub const DEFAULT_THREAD_STACK_SIZE: usize = 2 * 1024 * 1024;

/// What the run loop does with an event that has no reply channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnrepliedPolicy {
    /// Run the action anyway and only log its outcome.
    #[default]
    Execute,
    /// Discard the pair without running the action.
    Drop,
}

impl FromStr for DequeueOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fifo" => Ok(Self::Fifo),
            "lifo" => Ok(Self::Lifo),
            other => Err(format!("unknown dequeue order `{other}` (expected fifo or lifo)")),
        }
    }
}

impl FromStr for UnrepliedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "execute" => Ok(Self::Execute),
            "drop" => Ok(Self::Drop),
            other => Err(format!("unknown unreplied policy `{other}` (expected execute or drop)")),
        }
    }
}

impl fmt::Display for DequeueOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fifo => "fifo",
            Self::Lifo => "lifo",
        })
    }
}

/// Configuration for a single [`Scheduler`](crate::core::Scheduler) instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Capacity of the bounded channel between `emit` and the run loop.
    pub handoff_capacity: usize,
    /// Dequeue discipline of the pending queue.
    pub dequeue_order: DequeueOrder,
    /// Handling of events emitted without a reply channel.
    pub unreplied: UnrepliedPolicy,
    /// Optional upper bound on a single action's run time, in milliseconds.
    pub action_timeout_ms: Option<u64>,
    /// Run-loop thread name prefix.
    pub thread_name: String,
    /// Run-loop thread stack size in bytes.
    pub thread_stack_size: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            handoff_capacity: DEFAULT_HANDOFF_CAPACITY,
            dequeue_order: DequeueOrder::default(),
            unreplied: UnrepliedPolicy::default(),
            action_timeout_ms: None,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            thread_stack_size: DEFAULT_THREAD_STACK_SIZE,
        }
    }
}

impl SchedulerConfig {
    /// Configuration with every value at its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hand-off channel capacity.
    #[must_use]
    pub fn with_handoff_capacity(mut self, capacity: usize) -> Self {
        self.handoff_capacity = capacity;
        self
    }

    /// Set the dequeue discipline.
    #[must_use]
    pub fn with_dequeue_order(mut self, order: DequeueOrder) -> Self {
        self.dequeue_order = order;
        self
    }

    /// Set the policy for reply-less events.
    #[must_use]
    pub fn with_unreplied(mut self, policy: UnrepliedPolicy) -> Self {
        self.unreplied = policy;
        self
    }

    /// Bound each action's run time.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn with_action_timeout(mut self, timeout: Duration) -> Self {
        self.action_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Set the run-loop thread name prefix.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set the run-loop thread stack size.
    #[must_use]
    pub fn with_thread_stack_size(mut self, bytes: usize) -> Self {
        self.thread_stack_size = bytes;
        self
    }

    /// Per-action timeout, if one is configured.
    #[must_use]
    pub fn action_timeout(&self) -> Option<Duration> {
        self.action_timeout_ms.map(Duration::from_millis)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.handoff_capacity == 0 {
            return Err("handoff_capacity must be greater than 0".into());
        }
        if self.action_timeout_ms == Some(0) {
            return Err("action_timeout_ms must be greater than 0 when set".into());
        }
        if self.thread_name.trim().is_empty() {
            return Err("thread_name must not be empty".into());
        }
        if self.thread_stack_size == 0 {
            return Err("thread_stack_size must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a message on malformed JSON or invalid values.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from `EVENTLOOP_*` environment variables.
    ///
    /// A `.env` file in the working directory is loaded first when present.
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Fails when a variable cannot be parsed or the result does not validate.
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();
        if let Some(capacity) = env_parse("EVENTLOOP_HANDOFF_CAPACITY")? {
            cfg.handoff_capacity = capacity;
        }
        if let Some(order) = env_parse("EVENTLOOP_DEQUEUE_ORDER")? {
            cfg.dequeue_order = order;
        }
        if let Some(policy) = env_parse("EVENTLOOP_UNREPLIED")? {
            cfg.unreplied = policy;
        }
        if let Some(timeout) = env_parse("EVENTLOOP_ACTION_TIMEOUT_MS")? {
            cfg.action_timeout_ms = Some(timeout);
        }
        if let Some(name) = env_parse::<String>("EVENTLOOP_THREAD_NAME")? {
            cfg.thread_name = name;
        }
        if let Some(bytes) = env_parse("EVENTLOOP_THREAD_STACK_SIZE")? {
            cfg.thread_stack_size = bytes;
        }

        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }
}
