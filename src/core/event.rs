//! Events, actions and the one-shot reply channel.
//!
//! An [`Event`] describes *who* wants a result and *whether* they want one.
//! The work itself is an [`Action`]: a boxed closure the scheduler invokes at
//! most once. Results come back as an [`EventReply`] on the caller's
//! [`ReplySender`], which is consumed by the single delivery so a channel can
//! never be written twice.

use std::fmt;

use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use super::error::EventError;

/// Classification tag carried by every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The caller is waiting on a reply channel.
    RequireFeedback,
    /// The caller does not need the outcome.
    NoFeedback,
}

/// Correlation identifier assigned by a scheduler at emit time.
///
/// Identifiers come from a per-instance counter and are never reused by the
/// scheduler that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub(crate) u64);

impl EventId {
    /// Raw sequence number of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "evt-{}", self.0)
    }
}

/// Unit of work paired with an event.
pub type Action<T, E> = Box<dyn FnOnce() -> Result<T, E> + Send + 'static>;

/// Result of running an event's action, delivered exactly once.
#[derive(Debug)]
pub struct EventReply<T, E> {
    /// Identifier returned by `emit` for this event.
    pub event_id: EventId,
    /// Payload on success, or why there is none.
    pub result: Result<T, EventError<E>>,
}

impl<T, E> EventReply<T, E> {
    /// Consume the reply and keep only the outcome.
    pub fn into_result(self) -> Result<T, EventError<E>> {
        self.result
    }
}

/// Receiving half of a reply channel. Disconnects once the reply was sent.
pub type ReplyReceiver<T, E> = Receiver<EventReply<T, E>>;

/// Sending half of a reply channel, held by the scheduler on the caller's behalf.
pub struct ReplySender<T, E> {
    tx: Sender<EventReply<T, E>>,
}

impl<T, E> ReplySender<T, E> {
    /// Send the reply and close the channel.
    ///
    /// Returns `false` when the caller already dropped its receiver.
    pub(crate) fn deliver(self, reply: EventReply<T, E>) -> bool {
        self.tx.send(reply).is_ok()
    }
}

impl<T, E> fmt::Debug for ReplySender<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplySender").finish_non_exhaustive()
    }
}

/// Create a reply channel with room for the single reply it will ever carry.
#[must_use]
pub fn reply_channel<T, E>() -> (ReplySender<T, E>, ReplyReceiver<T, E>) {
    let (tx, rx) = bounded(1);
    (ReplySender { tx }, rx)
}

/// Caller-supplied description of a unit of work.
#[derive(Debug)]
pub struct Event<T, E> {
    kind: EventKind,
    reply: Option<ReplySender<T, E>>,
}

impl<T, E> Event<T, E> {
    /// Build an event from its parts.
    pub const fn new(kind: EventKind, reply: Option<ReplySender<T, E>>) -> Self {
        Self { kind, reply }
    }

    /// An event whose caller waits on `reply`.
    pub const fn require_feedback(reply: ReplySender<T, E>) -> Self {
        Self::new(EventKind::RequireFeedback, Some(reply))
    }

    /// A fire-and-forget event without a reply channel.
    pub const fn no_feedback() -> Self {
        Self::new(EventKind::NoFeedback, None)
    }

    /// Classification tag.
    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    /// Whether a reply channel is attached.
    pub const fn has_reply(&self) -> bool {
        self.reply.is_some()
    }

    pub(crate) fn into_parts(self) -> (EventKind, Option<ReplySender<T, E>>) {
        (self.kind, self.reply)
    }
}
