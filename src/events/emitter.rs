//! Synchronous event emitter.
//!
//! `fire` runs every callback listener on the calling thread and then pushes
//! a clone of the event into each stream subscription with a non-blocking
//! `try_send`. A panicking listener is logged and does not stop delivery to
//! the others.

use std::cell::{Cell, RefCell};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use crossbeam_channel::{bounded, Sender, TrySendError};

use super::stream::EventStream;
use super::SubscriptionId;

type Listener<T> = Rc<dyn Fn(&T)>;

/// Publish/subscribe point for one event type.
pub struct EventEmitter<T> {
    name: &'static str,
    listeners: RefCell<Vec<(SubscriptionId, Listener<T>)>>,
    streams: RefCell<Vec<(SubscriptionId, Sender<T>)>>,
    dropped_events: Cell<u64>,
}

impl<T> std::fmt::Debug for EventEmitter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("name", &self.name)
            .field("listeners", &self.listeners.borrow().len())
            .field("streams", &self.streams.borrow().len())
            .field("dropped_events", &self.dropped_events.get())
            .finish()
    }
}

impl<T: Clone> EventEmitter<T> {
    /// Creates an emitter. `name` only appears in logs.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            listeners: RefCell::new(Vec::new()),
            streams: RefCell::new(Vec::new()),
            dropped_events: Cell::new(0),
        }
    }

    /// Registers a callback listener.
    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Registers a stream subscription buffering up to `capacity` events.
    /// Events that do not fit are dropped and counted.
    pub fn subscribe_stream(&self, capacity: usize) -> EventStream<T> {
        let id = SubscriptionId::new();
        let (tx, rx) = bounded(capacity.max(1));
        self.streams.borrow_mut().push((id, tx));
        EventStream::new(id, rx)
    }

    /// Removes a subscription. Returns true if it existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        if listeners.len() != before {
            return true;
        }
        drop(listeners);

        let mut streams = self.streams.borrow_mut();
        let before = streams.len();
        streams.retain(|(sid, _)| *sid != id);
        streams.len() != before
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.listeners.borrow().len() + self.streams.borrow().len()
    }

    /// Events that could not be queued to a full stream.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.get()
    }

    /// Delivers `event` to every subscriber.
    pub fn fire(&self, event: &T) {
        // Snapshot so listeners may (un)subscribe while being called.
        let listeners: Vec<Listener<T>> = self.listeners.borrow().iter().map(|(_, l)| Rc::clone(l)).collect();
        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                tracing::warn!(event = self.name, "event listener panicked");
            }
        }

        let mut streams = self.streams.borrow_mut();
        streams.retain(|(_, tx)| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped_events.set(self.dropped_events.get() + 1);
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }
}
