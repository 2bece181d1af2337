//! Change notifications for configuration keys.
//!
//! Every key handler owns an [`EventSender`].  Listeners registered on a
//! handler hear about that key only; listeners registered on the storage
//! handler hear about every key it owns.  Events are delivered synchronously
//! on the thread that caused them, after the listener list lock is released,
//! so a listener may read or write configuration from inside its callback.

use std::sync::Arc;

use parking_lot::RwLock;

use confkit_core::{ConfigValue, HandlerVariant, ValidationError};

/// Something that happened to a configuration key.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigEvent {
    /// The key was registered and its declaration checked.
    HandlerInitialized { key: String, variant: HandlerVariant },

    /// A value passed validation and was stored.
    ValueUpdated {
        key: String,
        variant: HandlerVariant,
        old: ConfigValue,
        new: ConfigValue,
    },

    /// A value was rejected; the store was not touched.
    ValidationFailed {
        key: String,
        variant: HandlerVariant,
        rejected: ConfigValue,
        error: ValidationError,
    },
}

impl ConfigEvent {
    /// The key this event is about.
    pub fn key(&self) -> &str {
        match self {
            ConfigEvent::HandlerInitialized { key, .. }
            | ConfigEvent::ValueUpdated { key, .. }
            | ConfigEvent::ValidationFailed { key, .. } => key,
        }
    }
}

/// Receives configuration events.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigEventSink: Send + Sync {
    fn on_config_event(&self, event: &ConfigEvent);
}

/// A list of listeners that events are broadcast to.
#[derive(Default)]
pub struct EventSender {
    listeners: RwLock<Vec<Arc<dyn ConfigEventSink>>>,
}

impl EventSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, listener: Arc<dyn ConfigEventSink>) {
        self.listeners.write().push(listener);
    }

    /// Removes `listener` (matched by identity); returns whether it was found.
    pub fn remove_listener(&self, listener: &Arc<dyn ConfigEventSink>) -> bool {
        let target = Arc::as_ptr(listener) as *const ();
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|l| Arc::as_ptr(l) as *const () != target);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Delivers `event` to every listener in registration order.
    pub fn fire(&self, event: &ConfigEvent) {
        let listeners: Vec<_> = self.listeners.read().clone();
        for listener in listeners {
            listener.on_config_event(event);
        }
    }
}

impl std::fmt::Debug for EventSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSender")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
