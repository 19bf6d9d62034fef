//! Controller Events
//!
//! Lifecycle notifications for the embedding UI, separate from the
//! per-store change signal.

use std::sync::Arc;

use super::controller::ControllerState;
use crate::message::MessageId;
use crate::network::ConnectionState;

/// Events emitted by the reconciliation controller.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// The controller moved to a new state.
    StateChanged {
        /// The new state.
        state: ControllerState,
    },

    /// The channel connected, dropped or started retrying.
    ConnectionStateChanged {
        state: ConnectionState,
    },

    /// A backfill was applied to the store.
    HistoryLoaded {
        /// Number of messages in the store afterwards.
        count: usize,
        /// True if the fallback fixture replaced an unavailable history.
        fallback: bool,
    },

    /// An optimistic send could not be transmitted.
    MessageFailed {
        message_id: MessageId,
        error: String,
    },

    /// An inbound frame was dropped as malformed.
    FrameDropped {
        /// Why the frame was dropped.
        reason: String,
    },

    /// A transport failure the controller recovered from or is retrying.
    Error {
        message: String,
    },
}

/// Receives controller events.
///
/// Handlers run synchronously on the thread driving the controller and
/// must not call back into it.
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: &ChatEvent);
}

/// Adapts a closure to [`EventHandler`].
pub struct CallbackHandler<F>
where
    F: Fn(&ChatEvent) + Send + Sync,
{
    callback: F,
}

impl<F> CallbackHandler<F>
where
    F: Fn(&ChatEvent) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        CallbackHandler { callback }
    }
}

impl<F> EventHandler for CallbackHandler<F>
where
    F: Fn(&ChatEvent) + Send + Sync,
{
    fn on_event(&self, event: &ChatEvent) {
        (self.callback)(event)
    }
}

/// Fans each event out to every registered handler, in registration order.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn clear_handlers(&mut self) {
        self.handlers.clear();
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn dispatch(&self, event: ChatEvent) {
        for handler in &self.handlers {
            handler.on_event(&event);
        }
    }
}
