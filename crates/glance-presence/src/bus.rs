//! The presence event bus.
//!
//! A thin wrapper over [`tokio::sync::broadcast`] with the delivery rules
//! observers rely on:
//!
//! - **Non-blocking publish.** A broadcast send never waits. When the
//!   ring buffer is full the oldest queued event is overwritten, and a
//!   subscriber that hadn't read it yet finds out as a lag on its next
//!   receive.
//! - **No backlog.** A subscriber only sees events published after it
//!   subscribed, limited to what the buffer still holds.
//! - **FIFO per channel.** Every subscriber receives events in publish
//!   order (minus whatever it lagged past).

use glance_protocol::PresenceEvent;
use tokio::sync::broadcast;

/// Default ring buffer size. Small on purpose: observers want the latest
/// title, not a history.
pub const DEFAULT_CAPACITY: usize = 4;

/// Largest ring buffer size a bus will allocate.
pub const MAX_CAPACITY: usize = 1 << 16;

/// Default channel name.
pub const DEFAULT_CHANNEL: &str = "focus";

/// A single named, bounded broadcast channel of [`PresenceEvent`]s.
///
/// Cheap to clone; every clone publishes into the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    name: String,
    capacity: usize,
    sender: broadcast::Sender<PresenceEvent>,
}

impl EventBus {
    /// Creates a channel holding at most `capacity` undelivered events.
    ///
    /// The ring buffer size is a power of two, so `capacity` is rounded up
    /// to the next one (0 becomes 1) and capped at [`MAX_CAPACITY`].
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_CAPACITY).next_power_of_two();
        let (sender, _) = broadcast::channel(capacity);
        Self {
            name: name.into(),
            capacity,
            sender,
        }
    }

    /// Publishes an event to every current subscriber and returns how many
    /// there were.
    ///
    /// Never blocks and never fails: with no subscribers the event is
    /// discarded, and with a full buffer the oldest event is dropped to
    /// make room. Both cases are logged.
    pub fn publish(&self, event: PresenceEvent) -> usize {
        if self.sender.len() >= self.capacity {
            tracing::warn!(
                channel = %self.name,
                capacity = self.capacity,
                "event buffer full, dropping oldest event"
            );
        }
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                tracing::debug!(channel = %self.name, "no subscribers, event dropped");
                0
            }
        }
    }

    /// Attaches a new subscriber. It sees only events published from now on.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            channel: self.name.clone(),
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// The channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The ring buffer size.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL, DEFAULT_CAPACITY)
    }
}

/// One observer's view of an [`EventBus`].
///
/// Dropping it detaches the observer.
#[derive(Debug)]
pub struct Subscription {
    channel: String,
    receiver: broadcast::Receiver<PresenceEvent>,
}

impl Subscription {
    /// Waits for the next event.
    ///
    /// Events this subscriber was too slow to read are skipped (and
    /// logged); it resumes at the oldest event the buffer still holds.
    /// Returns `None` once every publisher is gone.
    pub async fn recv(&mut self) -> Option<PresenceEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(
                        channel = %self.channel,
                        missed,
                        "subscriber lagged, events dropped"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next event if one is already buffered, without waiting.
    pub fn try_recv(&mut self) -> Option<PresenceEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}
