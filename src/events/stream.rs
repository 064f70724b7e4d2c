use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};

use crate::error::StreamError;

use super::SubscriptionId;

/// A buffered subscription to an [`super::EventEmitter`].
///
/// The receiving side may live on another thread. Dropping the stream
/// unsubscribes it the next time the emitter fires.
#[derive(Debug)]
pub struct EventStream<T> {
    subscription_id: SubscriptionId,
    rx: Receiver<T>,
}

impl<T> EventStream<T> {
    pub(crate) fn new(subscription_id: SubscriptionId, rx: Receiver<T>) -> Self {
        Self { subscription_id, rx }
    }

    /// The subscription id backing this stream.
    #[must_use]
    pub const fn subscription_id(&self) -> SubscriptionId {
        self.subscription_id
    }

    /// Receives the next event (blocking).
    pub fn recv(&self) -> Result<T, StreamError> {
        self.rx.recv().map_err(|_| StreamError::Disconnected)
    }

    /// Receives the next event with a timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, StreamError> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => StreamError::Timeout {
                duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            },
            RecvTimeoutError::Disconnected => StreamError::Disconnected,
        })
    }

    /// Returns the next buffered event, if any.
    pub fn try_recv(&self) -> Option<T> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Takes every buffered event.
    pub fn drain(&self) -> Vec<T> {
        self.rx.try_iter().collect()
    }
}
