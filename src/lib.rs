//! # eventloop
//!
//! An in-process event scheduler with a dedicated run-loop thread, plus a
//! retry executor with exponential backoff.
//!
//! Producers on any thread hand an event and an action to a [`Scheduler`].
//! The scheduler's run loop executes actions one at a time and delivers each
//! outcome on the caller's one-shot reply channel, which is closed right after.
//!
//! ## Key Features
//!
//! - **Serialized execution**: one run loop per instance, one action at a time
//! - **No polling**: an idle loop blocks until work or a stop signal arrives
//! - **Exactly-once replies**: success, action error, panic, timeout or abandonment
//! - **Instance-scoped stop**: stopping one scheduler never affects another
//! - **Configurable**: FIFO/LIFO dequeue, reply-less event policy, per-action timeout
//! - **Retry executor**: exponential backoff with jitter, cancellation and deadlines
//!
//! ## Scheduler
//!
//! ```rust
//! use std::time::Duration;
//! use eventloop::config::{DequeueOrder, SchedulerConfig};
//! use eventloop::core::{reply_channel, Event, Scheduler};
//!
//! let scheduler: Scheduler<String, std::io::Error> = Scheduler::with_config(
//!     SchedulerConfig::new()
//!         .with_dequeue_order(DequeueOrder::Fifo)
//!         .with_action_timeout(Duration::from_secs(5)),
//! )
//! .unwrap();
//! scheduler.start().unwrap();
//!
//! let (tx, rx) = reply_channel();
//! let id = scheduler.emit(Event::require_feedback(tx), || Ok("done".to_string()));
//!
//! let reply = rx.recv().unwrap();
//! assert_eq!(reply.event_id, id);
//! assert_eq!(reply.result.unwrap(), "done");
//!
//! scheduler.stop();
//! ```
//!
//! ## Retry
//!
//! ```rust,ignore
//! use eventloop::retry::Retry;
//!
//! let retry = Retry::from_config(&RetryConfig::from_env()?);
//! let body = retry.run(|| async { client.get(url).send().await }).await?;
//! ```
//!
//! [`Scheduler`]: crate::core::Scheduler

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Events, the pending queue and the scheduler run loop.
pub mod core;
/// Configuration models for schedulers and retries.
pub mod config;
/// Retry executor with exponential backoff.
pub mod retry;
/// Shared utilities.
pub mod util;
