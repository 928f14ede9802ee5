//! Broadcast channel carrying monitor events to their consumers.
//!
//! The sync monitor emits every state change through an `EventBus`. The
//! reporter and any test harness subscribe and observe the same ordered stream.

use thiserror::Error;
use tokio::sync::broadcast;

const DEFAULT_EVENT_LIMIT: usize = 10000;

/// Event-related errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Receiver lagged behind and missed {0} events")]
    Lagged(u64),
}

type Result<T> = std::result::Result<T, Error>;

/// Event bus for broadcasting events to subscribers.
///
/// All subscribers receive all events emitted after they subscribed.
#[derive(Debug, Clone)]
pub struct EventBus<T: Clone> {
    sender: broadcast::Sender<T>,
}

impl<T: Clone> EventBus<T> {
    /// Create a new event bus with the given capacity.
    ///
    /// Capacity determines how many events can be buffered before
    /// slow receivers start missing events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
        }
    }

    /// Create a new subscriber to receive events.
    pub fn subscribe(&self) -> EventReceiver<T> {
        EventReceiver::new(self.sender.subscribe())
    }

    /// Emit events to all subscribers.
    ///
    /// Having no subscribers is not an error.
    pub fn emit(&self, events: &[T]) {
        for event in events {
            let _ = self.sender.send(event.clone());
        }
    }
}

impl<T: Clone> Default for EventBus<T> {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_LIMIT)
    }
}

#[derive(Debug)]
pub struct EventReceiver<T: Clone> {
    receiver: broadcast::Receiver<T>,
}

impl<T: Clone> EventReceiver<T> {
    pub fn new(receiver: broadcast::Receiver<T>) -> Self {
        Self {
            receiver,
        }
    }

    /// Wait for the next event.
    ///
    /// Returns `Ok(None)` once every sender is dropped and the buffer is drained.
    pub async fn recv(&mut self) -> Result<Option<T>> {
        match self.receiver.recv().await {
            Ok(event) => Ok(Some(event)),
            Err(broadcast::error::RecvError::Lagged(n)) => Err(Error::Lagged(n)),
            Err(broadcast::error::RecvError::Closed) => Ok(None),
        }
    }

    /// Take the next buffered event without waiting.
    pub fn try_recv(&mut self) -> Option<T> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }

    /// Drain every event currently buffered.
    pub fn drain(&mut self) -> Vec<T> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}
