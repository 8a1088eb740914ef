//! Core scheduling abstractions: events, the pending queue and the run loop.

pub mod error;
pub mod event;
pub mod queue;
pub mod scheduler;
pub mod stats;

pub use error::{AppResult, EventError, SchedulerError};
pub use event::{reply_channel, Action, Event, EventId, EventKind, EventReply, ReplyReceiver, ReplySender};
pub use queue::{DequeueOrder, PendingEntry, PendingQueue};
pub use scheduler::{Scheduler, SchedulerState};
pub use stats::SchedulerStats;
