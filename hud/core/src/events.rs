//! Event buses linking the game host, the chat log, and the coordinator.
//!
//! Everything here is single-threaded. A bus hands out [`Subscription`]
//! values that own the receiving half of a channel; dropping one is the
//! unregistration. Publishers prune closed channels on the next publish,
//! so there is no registry to unhook from and no handler can outlive its
//! owner.
//!
//! Delivery is deferred: publishing only queues, and subscribers drain
//! their queue once per frame. Within a bus, order of arrival is order of
//! delivery.

use std::cell::RefCell;
use std::sync::mpsc::{self, Receiver, Sender, TryIter};

use tracing::trace;

use crate::log::MessageChannel;

// ===== Payloads =====

/// A message entering the display system, as published by the chat log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPush {
    /// Raw message text, colour escapes included.
    pub text: String,
    /// The channel the message was filed under.
    pub channel: MessageChannel,
}

/// Graphics context lifecycle notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextEvent {
    /// The context died; every texture handle is now invalid.
    Lost,
    /// A fresh context exists; widgets may rasterise again.
    Recreated,
}

// ===== Bus =====

/// A single-threaded broadcast bus for one event type.
pub struct EventBus<T> {
    subscribers: RefCell<Vec<Sender<T>>>,
}

impl<T: Clone> EventBus<T> {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self {
            subscribers: RefCell::new(Vec::new()),
        }
    }

    /// Registers a new subscriber and returns its handle.
    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.borrow_mut().push(tx);
        Subscription { rx }
    }

    /// Queues an event for every live subscriber.
    ///
    /// Subscribers whose handle has been dropped are pruned here.
    pub fn publish(&self, event: T) {
        let mut subscribers = self.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        let pruned = before - subscribers.len();
        if pruned > 0 {
            trace!(pruned, "dropped closed subscriptions");
        }
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

impl<T: Clone> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A live registration on an [`EventBus`].
///
/// Owns the receiving half of the channel; dropping it unregisters.
pub struct Subscription<T> {
    rx: Receiver<T>,
}

impl<T> Subscription<T> {
    /// Drains every event queued since the last drain, in arrival order.
    pub fn drain(&self) -> TryIter<'_, T> {
        self.rx.try_iter()
    }
}

// ===== Bundle =====

/// The buses shared between the host, the chat log, and the coordinator.
///
/// The host owns this behind an `Rc`; the chat log publishes to `chat`,
/// the host publishes the rest.
#[derive(Default)]
pub struct Events {
    /// A message was filed into the chat log.
    pub chat: EventBus<ChatPush>,
    /// The chat font changed; cached text must re-rasterise.
    pub font_changed: EventBus<()>,
    /// One colour code was redefined; carries the code character.
    pub color_code_changed: EventBus<char>,
    /// Graphics context lifecycle.
    pub context: EventBus<ContextEvent>,
}

impl Events {
    /// Creates the bundle with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }
}
