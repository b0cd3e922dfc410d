//! Publish/subscribe channel carrying feed messages to the scene.
//!
//! The channel is an explicit object handed to whoever produces or consumes
//! snapshots; there is no global instance. Each [`Subscription`] owns an
//! unbounded queue; dropping it unregisters the subscriber.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use crate::snapshot::Snapshot;

/// Change in the feed connection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A connection to the feed was established.
    Available,
    /// The connection dropped or could not be made.
    Lost {
        /// Human-readable cause.
        reason: String,
    },
}

/// Message delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    /// A parsed snapshot.
    Snapshot(Snapshot),
    /// A connection state change.
    Link(LinkEvent),
}

#[derive(Debug, Default)]
struct Subscribers {
    next_id: u64,
    senders: Vec<(u64, Sender<FeedMessage>)>,
}

/// Cloneable handle to a shared subscriber list.
///
/// # Examples
///
/// ```
/// use swarm_view::channel::{FeedMessage, LinkEvent, SnapshotChannel};
///
/// let channel = SnapshotChannel::new();
/// let subscription = channel.subscribe();
/// channel.publish(&FeedMessage::Link(LinkEvent::Available));
/// assert_eq!(
///     subscription.try_recv(),
///     Some(FeedMessage::Link(LinkEvent::Available))
/// );
/// drop(subscription);
/// assert_eq!(channel.subscriber_count(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SnapshotChannel {
    inner: Arc<Mutex<Subscribers>>,
}

fn lock(inner: &Mutex<Subscribers>) -> MutexGuard<'_, Subscribers> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SnapshotChannel {
    /// Creates a channel with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel();
        let mut subs = lock(&self.inner);
        let id = subs.next_id;
        subs.next_id += 1;
        subs.senders.push((id, tx));
        Subscription {
            id,
            receiver: rx,
            channel: Arc::downgrade(&self.inner),
        }
    }

    /// Sends `message` to every live subscriber and returns how many got it.
    ///
    /// Subscribers whose receiving end is gone are pruned.
    pub fn publish(&self, message: &FeedMessage) -> usize {
        let mut subs = lock(&self.inner);
        subs.senders.retain(|(_, tx)| tx.send(message.clone()).is_ok());
        subs.senders.len()
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).senders.len()
    }
}

/// Receiving end of a [`SnapshotChannel`].
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    receiver: Receiver<FeedMessage>,
    channel: Weak<Mutex<Subscribers>>,
}

impl Subscription {
    /// Next queued message, if any. Never blocks.
    #[must_use]
    pub fn try_recv(&self) -> Option<FeedMessage> {
        match self.receiver.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Waits up to `timeout` for the next message.
    #[must_use]
    pub fn recv_timeout(&self, timeout: Duration) -> Option<FeedMessage> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Every message queued so far, in publish order.
    pub fn drain(&self) -> impl Iterator<Item = FeedMessage> + '_ {
        self.receiver.try_iter()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.channel.upgrade() {
            lock(&inner).senders.retain(|(id, _)| *id != self.id);
        }
    }
}
