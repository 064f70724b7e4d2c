//! Change notifications.
//!
//! Every notification the policy service raises goes through an
//! [`EventEmitter`]. Callers either register callbacks or take an
//! [`EventStream`] and poll it.

mod emitter;
mod stream;

pub use emitter::EventEmitter;
pub use stream::EventStream;

use std::cell::Cell;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::resource::Resource;

/// Unique identifier for a subscription.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Create a new random subscription id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Payload of a readonly-changed notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadonlyChange {
    /// The resource whose session override was updated, or `None` when a
    /// setting or provider change may affect any resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Resource>,
}

impl ReadonlyChange {
    /// A change that may affect every resource.
    #[must_use]
    pub const fn global() -> Self {
        Self { resource: None }
    }

    /// A change to a single resource.
    #[must_use]
    pub const fn resource(resource: Resource) -> Self {
        Self {
            resource: Some(resource),
        }
    }
}

/// Observable boolean published for UI gating.
#[derive(Debug)]
pub struct ContextFlag {
    key: &'static str,
    value: Cell<bool>,
    changed: EventEmitter<bool>,
}

impl ContextFlag {
    /// Creates a flag with an initial value.
    #[must_use]
    pub fn new(key: &'static str, initial: bool) -> Self {
        Self {
            key,
            value: Cell::new(initial),
            changed: EventEmitter::new(key),
        }
    }

    /// The context key name.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.key
    }

    /// Current value.
    #[must_use]
    pub fn get(&self) -> bool {
        self.value.get()
    }

    /// Sets the value, notifying subscribers only if it changed.
    pub fn set(&self, value: bool) {
        if self.value.replace(value) != value {
            self.changed.fire(&value);
        }
    }

    /// Fires with the new value on every change.
    #[must_use]
    pub const fn on_did_change(&self) -> &EventEmitter<bool> {
        &self.changed
    }
}
