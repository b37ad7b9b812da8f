//! # Event Bus
//!
//! Per-editor, synchronous pub/sub keyed by [`EventName`].
//!
//! Handlers for an event run in subscription order before `emit` returns.
//! The handler list is snapshotted before dispatch, so a handler may
//! subscribe, unsubscribe or dispatch further actions; nested emissions run
//! to completion before the outer one continues.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::errors::EventError;
use crate::events::{EditorEvent, Event, EventName};
use crate::stream::{Sink, Stream};

/// Untyped event handler
pub type Handler = Rc<dyn Fn(&EditorEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle returned by every subscribe call. `unsubscribe` detaches the
/// handler; dropping the handle leaves it attached.
#[must_use = "keep the Subscription to be able to unsubscribe"]
pub struct Subscription {
    id: Option<SubscriptionId>,
    teardown: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        Self {
            id: None,
            teardown: Some(Box::new(teardown)),
        }
    }

    fn with_id(id: SubscriptionId, teardown: impl FnOnce() + 'static) -> Self {
        Self {
            id: Some(id),
            teardown: Some(Box::new(teardown)),
        }
    }

    /// Bus id of the handler, when the subscription maps to exactly one.
    pub fn id(&self) -> Option<SubscriptionId> {
        self.id
    }

    pub fn unsubscribe(mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.teardown.is_some())
            .finish()
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: HashMap<EventName, Vec<(SubscriptionId, Handler)>>,
}

impl Registry {
    fn remove(&mut self, name: EventName, id: SubscriptionId) -> bool {
        let Some(handlers) = self.handlers.get_mut(&name) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(sub_id, _)| *sub_id != id);
        handlers.len() != before
    }
}

/// Cloning shares the registry.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Rc<RefCell<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one typed event.
    pub fn on<E: Event>(&self, handler: impl Fn(&E) + 'static) -> Subscription {
        self.on_event(E::NAME, move |event| {
            if let Some(payload) = E::from_event(event) {
                handler(payload);
            }
        })
    }

    /// Subscribe to an event by name with an untyped handler.
    pub fn on_event(
        &self,
        name: EventName,
        handler: impl Fn(&EditorEvent) + 'static,
    ) -> Subscription {
        let id = {
            let mut registry = self.registry.borrow_mut();
            registry.next_id += 1;
            let id = SubscriptionId(registry.next_id);
            registry
                .handlers
                .entry(name)
                .or_default()
                .push((id, Rc::new(handler)));
            id
        };
        trace!(event = %name, subscription = %id, "handler subscribed");

        let registry: Weak<RefCell<Registry>> = Rc::downgrade(&self.registry);
        Subscription::with_id(id, move || {
            if let Some(registry) = registry.upgrade() {
                registry.borrow_mut().remove(name, id);
            }
        })
    }

    /// Remove one handler by id.
    pub fn off(&self, name: EventName, id: SubscriptionId) -> Result<(), EventError> {
        if self.registry.borrow_mut().remove(name, id) {
            trace!(event = %name, subscription = %id, "handler removed");
            Ok(())
        } else {
            Err(EventError::HandlerNotFound {
                event: name,
                subscription_id: id.value(),
            })
        }
    }

    /// Run every handler currently registered for the event's name.
    pub fn emit(&self, event: &EditorEvent) {
        let name = event.name();
        let handlers: Vec<Handler> = self
            .registry
            .borrow()
            .handlers
            .get(&name)
            .map(|handlers| handlers.iter().map(|(_, h)| Rc::clone(h)).collect())
            .unwrap_or_default();

        trace!(event = %name, handlers = handlers.len(), "emitting");
        for handler in handlers {
            handler(event);
        }
    }

    /// Remove every handler for every event.
    pub fn cleanup(&self) {
        self.registry.borrow_mut().handlers.clear();
    }

    pub fn handler_count(&self, name: EventName) -> usize {
        self.registry
            .borrow()
            .handlers
            .get(&name)
            .map_or(0, Vec::len)
    }

    /// Lazy stream over one typed event. Nothing is registered until the
    /// stream is subscribed.
    pub fn stream<E: Event>(&self) -> Stream<E> {
        let bus = self.clone();
        Stream::new(move |sink: Sink<E>| bus.on::<E>(move |payload| sink(payload)))
    }

    /// Lazy stream over the raw events published under `name`.
    pub fn stream_event(&self, name: EventName) -> Stream<EditorEvent> {
        let bus = self.clone();
        Stream::new(move |sink: Sink<EditorEvent>| bus.on_event(name, move |event| sink(event)))
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.borrow();
        let counts: HashMap<EventName, usize> = registry
            .handlers
            .iter()
            .map(|(name, handlers)| (*name, handlers.len()))
            .collect();
        f.debug_struct("EventBus").field("handlers", &counts).finish()
    }
}
