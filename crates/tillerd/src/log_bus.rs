//! Process-wide publish/subscribe hub for log lines.
//!
//! The bus keeps a bounded replay history and fans each published line out to
//! every subscriber's bounded mailbox. Publishing never blocks: a full mailbox
//! loses the line for that subscriber only, and a mailbox whose receiver has
//! gone away is pruned on the next publish.
//!
//! The bus must not emit `tracing` events. Daemon logs are forwarded into the
//! bus by a subscriber layer, so logging from inside [`LogBus::publish`] would
//! re-enter the bus lock.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TryRecvError, TrySendError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use thiserror::Error;
use tiller_config::{Config, MAX_SUBSCRIBER_CAPACITY};
use tiller_proto::truncate_line;

/// Shared line payload; cloning is a reference-count bump.
pub type LogLine = Arc<str>;

/// Errors returned by [`LogBus`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BusError {
    /// The bus has been closed and accepts no further subscriptions.
    #[error("log bus is closed")]
    Closed,
}

/// Identifier assigned to each subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// Publish/subscribe hub with bounded history and bounded mailboxes.
///
/// Cloning yields another handle to the same bus.
#[derive(Clone)]
pub struct LogBus {
    shared: Arc<Shared>,
}

struct Shared {
    state: Mutex<BusState>,
    history_capacity: usize,
    mailbox_capacity: usize,
}

struct BusState {
    history: VecDeque<LogLine>,
    subscribers: HashMap<SubscriberId, Mailbox>,
    next_id: u64,
    closed: bool,
}

struct Mailbox {
    sender: SyncSender<LogLine>,
    dropped: Arc<AtomicU64>,
}

impl LogBus {
    /// Creates a bus retaining `history_capacity` lines for replay and giving
    /// each subscriber a mailbox of `mailbox_capacity` lines.
    ///
    /// A mailbox capacity of zero is raised to one so that publishing can
    /// always enqueue without a rendezvous. Mailboxes are allocated up front,
    /// so the capacity is capped at [`MAX_SUBSCRIBER_CAPACITY`]; history grows
    /// on demand.
    #[must_use]
    pub fn new(history_capacity: usize, mailbox_capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(BusState {
                    history: VecDeque::new(),
                    subscribers: HashMap::new(),
                    next_id: 0,
                    closed: false,
                }),
                history_capacity,
                mailbox_capacity: mailbox_capacity.clamp(1, MAX_SUBSCRIBER_CAPACITY),
            }),
        }
    }

    /// Creates a bus sized from the daemon configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.log_history(), config.subscriber_capacity())
    }

    /// Appends `line` to the history and offers it to every subscriber.
    ///
    /// Lines longer than the wire limit are truncated on a character boundary
    /// first. Publishing after [`LogBus::close`] is ignored.
    pub fn publish(&self, line: &str) {
        let line: LogLine = Arc::from(truncate_line(line));
        let mut state = self.shared.lock();
        if state.closed {
            return;
        }

        if self.shared.history_capacity > 0 {
            if state.history.len() == self.shared.history_capacity {
                state.history.pop_front();
            }
            state.history.push_back(Arc::clone(&line));
        }

        state.subscribers.retain(|_, mailbox| {
            match mailbox.sender.try_send(Arc::clone(&line)) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    mailbox.dropped.fetch_add(1, Ordering::Relaxed);
                    true
                }
                Err(TrySendError::Disconnected(_)) => false,
            }
        });
    }

    /// Registers a subscriber and returns it with a snapshot of the history.
    ///
    /// The snapshot is taken and the mailbox registered under one lock hold,
    /// so every later publish lands in the mailbox and none in the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Closed`] once the bus has been closed.
    pub fn subscribe(&self) -> Result<(Subscription, Vec<LogLine>), BusError> {
        let (sender, receiver) = mpsc::sync_channel(self.shared.mailbox_capacity);
        let dropped = Arc::new(AtomicU64::new(0));

        let mut state = self.shared.lock();
        if state.closed {
            return Err(BusError::Closed);
        }
        let id = SubscriberId(state.next_id);
        state.next_id += 1;
        let backlog = state.history.iter().cloned().collect();
        state.subscribers.insert(
            id,
            Mailbox {
                sender,
                dropped: Arc::clone(&dropped),
            },
        );
        drop(state);

        let subscription = Subscription {
            id,
            receiver,
            dropped,
            bus: Arc::downgrade(&self.shared),
        };
        Ok((subscription, backlog))
    }

    /// Deregisters a subscriber. Unknown or already removed ids are ignored.
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.shared.remove(id);
    }

    /// Detaches every subscriber and refuses further subscriptions.
    ///
    /// Detached mailboxes still yield the lines already queued before
    /// reporting end of stream.
    pub fn close(&self) {
        let mut state = self.shared.lock();
        state.closed = true;
        state.subscribers.clear();
    }

    /// Number of currently registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.shared.lock().subscribers.len()
    }

    /// Copy of the retained history, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<LogLine> {
        self.shared.lock().history.iter().cloned().collect()
    }
}

impl std::fmt::Debug for LogBus {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("LogBus")
            .field("history_capacity", &self.shared.history_capacity)
            .field("mailbox_capacity", &self.shared.mailbox_capacity)
            .finish_non_exhaustive()
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, id: SubscriberId) {
        self.lock().subscribers.remove(&id);
    }
}

/// Receiving end of a bus registration.
///
/// Dropping the subscription deregisters it.
pub struct Subscription {
    id: SubscriberId,
    receiver: Receiver<LogLine>,
    dropped: Arc<AtomicU64>,
    bus: Weak<Shared>,
}

impl Subscription {
    /// Identifier of this subscription.
    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Waits up to `timeout` for the next line.
    ///
    /// # Errors
    ///
    /// Returns [`RecvTimeoutError::Timeout`] when nothing arrived in time and
    /// [`RecvTimeoutError::Disconnected`] once the bus detached this
    /// subscriber and the mailbox is drained.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<LogLine, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Returns the next queued line without waiting.
    ///
    /// # Errors
    ///
    /// Mirrors [`Receiver::try_recv`].
    pub fn try_recv(&self) -> Result<LogLine, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Number of lines lost because the mailbox was full.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.bus.upgrade() {
            shared.remove(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Subscription")
            .field("id", &self.id)
            .field("dropped", &self.dropped())
            .finish_non_exhaustive()
    }
}
