//! Pending queue of not-yet-executed (event, action) pairs.

use std::collections::VecDeque;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::error::{EventError, SchedulerError};
use super::event::{Action, EventId, EventKind, EventReply, ReplySender};

/// Which pending pair the run loop removes next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DequeueOrder {
    /// Oldest pair first.
    #[default]
    Fifo,
    /// Most recently added pair first (stack discipline).
    Lifo,
}

/// An emitted event together with its action, waiting to run.
pub struct PendingEntry<T, E> {
    pub(crate) id: EventId,
    pub(crate) kind: EventKind,
    pub(crate) reply: Option<ReplySender<T, E>>,
    pub(crate) action: Action<T, E>,
    pub(crate) emitted_at: Instant,
}

impl<T, E> PendingEntry<T, E> {
    pub(crate) fn new(
        id: EventId,
        kind: EventKind,
        reply: Option<ReplySender<T, E>>,
        action: Action<T, E>,
    ) -> Self {
        Self {
            id,
            kind,
            reply,
            action,
            emitted_at: Instant::now(),
        }
    }

    /// Identifier assigned at emit time.
    pub const fn id(&self) -> EventId {
        self.id
    }

    /// Discard the action unexecuted and tell the caller, if any, why.
    ///
    /// Returns `true` when a reply channel was attached.
    pub(crate) fn abandon(self) -> bool {
        let Some(reply) = self.reply else {
            return false;
        };
        if !reply.deliver(EventReply {
            event_id: self.id,
            result: Err(EventError::Stopped),
        }) {
            tracing::debug!(event_id = %self.id, "caller dropped reply receiver before abandon");
        }
        true
    }
}

/// Ordered collection of pending pairs. Unbounded; callers serialize access.
pub struct PendingQueue<T, E> {
    order: DequeueOrder,
    entries: VecDeque<PendingEntry<T, E>>,
}

impl<T, E> PendingQueue<T, E> {
    /// Create an empty queue with the given dequeue discipline.
    pub fn new(order: DequeueOrder) -> Self {
        Self {
            order,
            entries: VecDeque::new(),
        }
    }

    /// Append a pair.
    pub fn push(&mut self, entry: PendingEntry<T, E>) {
        self.entries.push_back(entry);
    }

    /// Remove the next pair according to the dequeue order.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::EmptyQueue`] when nothing is pending.
    pub fn pop(&mut self) -> Result<PendingEntry<T, E>, SchedulerError> {
        let entry = match self.order {
            DequeueOrder::Fifo => self.entries.pop_front(),
            DequeueOrder::Lifo => self.entries.pop_back(),
        };
        entry.ok_or(SchedulerError::EmptyQueue)
    }

    /// Remove every pending pair, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = PendingEntry<T, E>> + '_ {
        self.entries.drain(..)
    }

    /// Dequeue discipline in use.
    pub const fn order(&self) -> DequeueOrder {
        self.order
    }

    /// Number of pending pairs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
