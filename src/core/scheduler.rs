//! Event scheduler with a dedicated run-loop thread.
//!
//! Callers on any thread hand (event, action) pairs to [`Scheduler::emit`].
//! The pairs travel through a bounded channel to the scheduler's run loop,
//! which moves them into the pending queue and, whenever nothing new is
//! waiting, removes one pair and runs its action. The outcome goes back on the
//! caller's reply channel, which is closed right after.
//!
//! # Design
//!
//! - **One executor per instance**: actions run one at a time on the run-loop
//!   thread; there is no parallelism between actions.
//! - **No polling**: an idle loop blocks on "new emission OR stop signal".
//! - **Instance-scoped stop**: [`Scheduler::stop`] stops only this scheduler,
//!   lets the in-flight action finish and abandons whatever is still pending.
//! - **No global state**: channels, locks, flags and counters are all fields.
//!
//! # Example
//!
//! ```rust
//! use eventloop::core::{reply_channel, Event, Scheduler};
//!
//! let scheduler: Scheduler<u32, String> = Scheduler::initialize();
//! scheduler.start().unwrap();
//!
//! let (tx, rx) = reply_channel();
//! scheduler.emit(Event::require_feedback(tx), || Ok(42));
//!
//! let reply = rx.recv().unwrap();
//! assert_eq!(reply.result.unwrap(), 42);
//! assert!(rx.recv().is_err());
//!
//! scheduler.stop();
//! ```

use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, Receiver, RecvTimeoutError, SendError, Sender, TryRecvError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::error::{EventError, SchedulerError};
use super::event::{Action, Event, EventId, EventReply};
use super::queue::{PendingEntry, PendingQueue};
use super::stats::{SchedulerCounters, SchedulerStats};
use crate::config::{SchedulerConfig, UnrepliedPolicy};

thread_local! {
    /// Instance id of the scheduler whose run loop owns this thread.
    static CURRENT_LOOP: Cell<Option<Uuid>> = const { Cell::new(None) };
}

/// Lifecycle state of a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    /// Created, run loop not started yet. Emitted events wait in the hand-off channel.
    Idle,
    /// Run loop is executing events.
    Running,
    /// Stopped for good.
    Stopped,
}

struct Lifecycle<T, E> {
    state: SchedulerState,
    /// Held here until `start` moves it into the run loop.
    handoff_rx: Option<Receiver<PendingEntry<T, E>>>,
    /// Dropping the sender wakes an idle run loop.
    stop_tx: Option<Sender<()>>,
    runner: Option<JoinHandle<()>>,
}

/// In-process event scheduler.
///
/// `T` is the payload produced by actions, `E` their error type.
pub struct Scheduler<T, E = anyhow::Error> {
    id: Uuid,
    config: SchedulerConfig,
    handoff_tx: Sender<PendingEntry<T, E>>,
    queue: Arc<Mutex<PendingQueue<T, E>>>,
    lifecycle: Mutex<Lifecycle<T, E>>,
    shutdown: Arc<AtomicBool>,
    counters: Arc<SchedulerCounters>,
    next_id: AtomicU64,
}

impl<T, E> Scheduler<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Create an idle scheduler with the default configuration.
    #[must_use]
    pub fn initialize() -> Self {
        Self::build(SchedulerConfig::default())
    }

    /// Create an idle scheduler with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] if the configuration is invalid.
    pub fn with_config(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;
        Ok(Self::build(config))
    }

    fn build(config: SchedulerConfig) -> Self {
        let (handoff_tx, handoff_rx) = bounded(config.handoff_capacity);
        let id = Uuid::new_v4();

        debug!(
            scheduler_id = %id,
            handoff_capacity = config.handoff_capacity,
            dequeue_order = %config.dequeue_order,
            "scheduler initialized"
        );

        Self {
            id,
            queue: Arc::new(Mutex::new(PendingQueue::new(config.dequeue_order))),
            config,
            handoff_tx,
            lifecycle: Mutex::new(Lifecycle {
                state: SchedulerState::Idle,
                handoff_rx: Some(handoff_rx),
                stop_tx: None,
                runner: None,
            }),
            shutdown: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(SchedulerCounters::default()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Hand an event and its action to the scheduler.
    ///
    /// Returns the correlation id assigned to the event. Never fails: action
    /// outcomes, and abandonment after [`stop`](Self::stop), are reported on
    /// the event's reply channel. Blocks only while the hand-off channel is
    /// full.
    pub fn emit<F>(&self, event: Event<T, E>, action: F) -> EventId
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        let id = EventId(self.next_id.fetch_add(1, Ordering::Relaxed));
        SchedulerCounters::bump(&self.counters.emitted);

        let (kind, reply) = event.into_parts();
        let entry = PendingEntry::new(id, kind, reply, Box::new(action));

        if self.shutdown.load(Ordering::Acquire) {
            warn!(scheduler_id = %self.id, event_id = %id, "event emitted after stop, abandoning");
            abandon_entry(entry, &self.counters);
            return id;
        }

        // The run loop is the only consumer of the hand-off channel; an
        // action emitting onto its own scheduler must not wait on it.
        if self.is_own_loop() {
            self.queue.lock().push(entry);
            debug!(scheduler_id = %self.id, event_id = %id, "event emitted from the run loop");
            return id;
        }

        match self.handoff_tx.send(entry) {
            Ok(()) => {
                info!(scheduler_id = %self.id, event_id = %id, kind = ?kind, "event emitted");
            }
            Err(SendError(entry)) => {
                warn!(scheduler_id = %self.id, event_id = %id, "run loop is gone, abandoning");
                abandon_entry(entry, &self.counters);
            }
        }
        id
    }

    /// Start the run loop on its own thread.
    ///
    /// Calling `start` on a running scheduler is a no-op.
    ///
    /// # Errors
    ///
    /// - [`SchedulerError::Stopped`] if the scheduler was stopped
    /// - [`SchedulerError::Spawn`] if the run-loop thread could not be created
    pub fn start(&self) -> Result<(), SchedulerError> {
        let mut lifecycle = self.lifecycle.lock();
        match lifecycle.state {
            SchedulerState::Running => {
                debug!(scheduler_id = %self.id, "scheduler already running");
                return Ok(());
            }
            SchedulerState::Stopped => return Err(SchedulerError::Stopped),
            SchedulerState::Idle => {}
        }

        let Some(handoff_rx) = lifecycle.handoff_rx.take() else {
            return Err(SchedulerError::Stopped);
        };
        let (stop_tx, stop_rx) = bounded::<()>(0);

        let run_loop = RunLoop {
            scheduler_id: self.id,
            handoff_rx,
            stop_rx,
            queue: Arc::clone(&self.queue),
            shutdown: Arc::clone(&self.shutdown),
            counters: Arc::clone(&self.counters),
            unreplied: self.config.unreplied,
            action_timeout: self.config.action_timeout(),
            action_thread_name: format!("{}-action", self.config.thread_name),
        };

        let short_id = self.id.simple().to_string();
        let spawned = thread::Builder::new()
            .name(format!("{}-{}", self.config.thread_name, &short_id[..8]))
            .stack_size(self.config.thread_stack_size)
            .spawn(move || run_loop.run());

        match spawned {
            Ok(handle) => {
                lifecycle.state = SchedulerState::Running;
                lifecycle.stop_tx = Some(stop_tx);
                lifecycle.runner = Some(handle);
                info!(scheduler_id = %self.id, "scheduler started");
                Ok(())
            }
            Err(err) => {
                // The hand-off receiver went down with the closure, so this
                // instance can never run anything.
                lifecycle.state = SchedulerState::Stopped;
                self.shutdown.store(true, Ordering::Release);
                error!(scheduler_id = %self.id, error = %err, "failed to spawn run loop");
                Err(SchedulerError::Spawn(err))
            }
        }
    }

    /// Stop the run loop and release the pending queue.
    ///
    /// The action in flight, if any, finishes and its reply is delivered.
    /// Everything still pending is abandoned: callers with a reply channel
    /// receive [`EventError::Stopped`]. Returns once the run loop has exited,
    /// except when called from inside one of this scheduler's actions, in which
    /// case the loop exits as soon as that action returns. Idempotent.
    pub fn stop(&self) {
        let (runner, idle_rx) = {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.state == SchedulerState::Stopped {
                return;
            }
            lifecycle.state = SchedulerState::Stopped;
            self.shutdown.store(true, Ordering::Release);
            lifecycle.stop_tx = None;
            (lifecycle.runner.take(), lifecycle.handoff_rx.take())
        };

        info!(scheduler_id = %self.id, "stopping scheduler");

        if let Some(handoff_rx) = idle_rx {
            let abandoned = abandon_all(&self.queue, &handoff_rx, &self.counters);
            debug!(scheduler_id = %self.id, abandoned, "scheduler stopped before start");
        }

        if let Some(runner) = runner {
            if self.is_own_loop() {
                warn!(
                    scheduler_id = %self.id,
                    "stop called from inside an action, run loop exits after it returns"
                );
            } else if runner.join().is_err() {
                error!(scheduler_id = %self.id, "run loop thread panicked");
            }
        }

        info!(scheduler_id = %self.id, stats = ?self.stats(), "scheduler stopped");
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SchedulerState {
        self.lifecycle.lock().state
    }

    /// Whether the run loop is active.
    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Running
    }

    /// Unique id of this scheduler instance.
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Configuration this scheduler was built with.
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Get current scheduler statistics.
    pub fn stats(&self) -> SchedulerStats {
        let pending = self.queue.lock().len() + self.handoff_tx.len();
        self.counters.snapshot(pending as u64)
    }

    fn is_own_loop(&self) -> bool {
        CURRENT_LOOP.with(|current| current.get() == Some(self.id))
    }
}

impl<T, E> Default for Scheduler<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn default() -> Self {
        Self::initialize()
    }
}

impl<T, E> Drop for Scheduler<T, E> {
    fn drop(&mut self) {
        // Signal the run loop but don't join it here.
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            let lifecycle = self.lifecycle.get_mut();
            lifecycle.stop_tx = None;
            if let Some(handoff_rx) = lifecycle.handoff_rx.take() {
                abandon_all(&self.queue, &handoff_rx, &self.counters);
            }
            debug!(scheduler_id = %self.id, "scheduler dropped without explicit stop");
        }
    }
}

/// State moved onto the run-loop thread.
struct RunLoop<T, E> {
    scheduler_id: Uuid,
    handoff_rx: Receiver<PendingEntry<T, E>>,
    stop_rx: Receiver<()>,
    queue: Arc<Mutex<PendingQueue<T, E>>>,
    shutdown: Arc<AtomicBool>,
    counters: Arc<SchedulerCounters>,
    unreplied: UnrepliedPolicy,
    action_timeout: Option<Duration>,
    action_thread_name: String,
}

impl<T, E> RunLoop<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn run(self) {
        CURRENT_LOOP.with(|current| current.set(Some(self.scheduler_id)));
        debug!(scheduler_id = %self.scheduler_id, "run loop started");

        loop {
            if self.shutdown.load(Ordering::Acquire) {
                break;
            }

            // New emissions are queued before anything is dequeued.
            match self.handoff_rx.try_recv() {
                Ok(entry) => {
                    self.ingest(entry);
                    continue;
                }
                Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {}
            }

            let next = self.queue.lock().pop();
            match next {
                Ok(entry) => self.dispatch(entry),
                // Empty queue: park until something arrives or stop is requested.
                Err(_) => {
                    if !self.idle() {
                        break;
                    }
                }
            }
        }

        let abandoned = abandon_all(&self.queue, &self.handoff_rx, &self.counters);
        CURRENT_LOOP.with(|current| current.set(None));
        info!(scheduler_id = %self.scheduler_id, abandoned, "run loop exited");
    }

    /// Block until a new pair arrives or a stop is signalled.
    ///
    /// Returns `false` when the loop should exit.
    fn idle(&self) -> bool {
        select! {
            recv(self.handoff_rx) -> msg => match msg {
                Ok(entry) => {
                    self.ingest(entry);
                    true
                }
                Err(_) => false,
            },
            recv(self.stop_rx) -> _ => false,
        }
    }

    fn ingest(&self, entry: PendingEntry<T, E>) {
        let event_id = entry.id();
        let mut queue = self.queue.lock();
        queue.push(entry);
        debug!(
            scheduler_id = %self.scheduler_id,
            event_id = %event_id,
            queue_len = queue.len(),
            "event queued"
        );
    }

    fn dispatch(&self, entry: PendingEntry<T, E>) {
        let PendingEntry {
            id,
            kind,
            reply,
            action,
            emitted_at,
        } = entry;

        if reply.is_none() && self.unreplied == UnrepliedPolicy::Drop {
            SchedulerCounters::bump(&self.counters.dropped);
            warn!(
                scheduler_id = %self.scheduler_id,
                event_id = %id,
                kind = ?kind,
                "event has no reply channel, dropping"
            );
            return;
        }

        debug!(
            scheduler_id = %self.scheduler_id,
            event_id = %id,
            kind = ?kind,
            waited_ms = emitted_at.elapsed().as_millis(),
            "executing event"
        );

        SchedulerCounters::bump(&self.counters.executed);
        let result = self.execute(id, action);
        let ok = result.is_ok();
        if !ok {
            SchedulerCounters::bump(&self.counters.failed);
        }

        match reply {
            Some(reply) => {
                if reply.deliver(EventReply { event_id: id, result }) {
                    debug!(scheduler_id = %self.scheduler_id, event_id = %id, ok, "event completed");
                } else {
                    debug!(
                        scheduler_id = %self.scheduler_id,
                        event_id = %id,
                        "caller dropped reply receiver, discarding result"
                    );
                }
            }
            None => {
                debug!(scheduler_id = %self.scheduler_id, event_id = %id, ok, "fire-and-forget event completed");
            }
        }
    }

    fn execute(&self, id: EventId, action: Action<T, E>) -> Result<T, EventError<E>> {
        match self.action_timeout {
            None => self.finish(id, panic::catch_unwind(AssertUnwindSafe(action))),
            Some(timeout) => self.execute_with_timeout(id, action, timeout),
        }
    }

    /// Run the action on a helper thread and wait at most `timeout` for it.
    ///
    /// A helper that misses the deadline is detached; its late result is discarded.
    fn execute_with_timeout(
        &self,
        id: EventId,
        action: Action<T, E>,
        timeout: Duration,
    ) -> Result<T, EventError<E>> {
        let (tx, rx) = bounded(1);
        let slot = Arc::new(Mutex::new(Some(action)));
        let helper_slot = Arc::clone(&slot);

        // Helpers are not marked as the run loop: a detached helper emitting
        // late must go through the hand-off channel to wake an idle loop.
        let spawned = thread::Builder::new()
            .name(self.action_thread_name.clone())
            .spawn(move || {
                let action = helper_slot.lock().take();
                if let Some(action) = action {
                    let _ = tx.send(panic::catch_unwind(AssertUnwindSafe(action)));
                }
            });

        if let Err(err) = spawned {
            warn!(
                scheduler_id = %self.scheduler_id,
                event_id = %id,
                error = %err,
                "failed to spawn action thread, running inline without deadline"
            );
            let action = slot.lock().take();
            return match action {
                Some(action) => self.finish(id, panic::catch_unwind(AssertUnwindSafe(action))),
                None => Err(EventError::Panicked("action was lost before it ran".into())),
            };
        }

        match rx.recv_timeout(timeout) {
            Ok(outcome) => self.finish(id, outcome),
            Err(RecvTimeoutError::Timeout) => {
                SchedulerCounters::bump(&self.counters.timed_out);
                warn!(
                    scheduler_id = %self.scheduler_id,
                    event_id = %id,
                    timeout_ms = timeout.as_millis(),
                    "action exceeded its deadline, detaching"
                );
                Err(EventError::DeadlineExceeded(timeout))
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(EventError::Panicked("action thread exited without a result".into()))
            }
        }
    }

    fn finish(&self, id: EventId, outcome: thread::Result<Result<T, E>>) -> Result<T, EventError<E>> {
        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(EventError::Action(err)),
            Err(payload) => {
                SchedulerCounters::bump(&self.counters.panicked);
                let message = panic_message(payload.as_ref());
                error!(
                    scheduler_id = %self.scheduler_id,
                    event_id = %id,
                    panic = %message,
                    "action panicked"
                );
                Err(EventError::Panicked(message))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn abandon_entry<T, E>(entry: PendingEntry<T, E>, counters: &SchedulerCounters) {
    let event_id = entry.id();
    entry.abandon();
    SchedulerCounters::bump(&counters.abandoned);
    debug!(event_id = %event_id, "event abandoned");
}

/// Abandon everything in the pending queue and the hand-off channel.
fn abandon_all<T, E>(
    queue: &Mutex<PendingQueue<T, E>>,
    handoff_rx: &Receiver<PendingEntry<T, E>>,
    counters: &SchedulerCounters,
) -> usize {
    let mut entries: Vec<_> = queue.lock().drain().collect();
    entries.extend(handoff_rx.try_iter());

    let count = entries.len();
    for entry in entries {
        abandon_entry(entry, counters);
    }
    count
}
