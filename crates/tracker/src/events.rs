//! Page Event Bus - the page's global event target
//!
//! Design: named events, synchronous listeners, many listeners per name.
//! The tracker depends on the `EventTarget` trait only; `PageEventBus` is the
//! in-process implementation hosts (and tests) plug in.

use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::dom::Element;

pub const CLICK: &str = "click";
pub const DBLCLICK: &str = "dblclick";
pub const CONTEXTMENU: &str = "contextmenu";
pub const MOUSEDOWN: &str = "mousedown";
pub const MOUSEUP: &str = "mouseup";
pub const MOUSEENTER: &str = "mouseenter";
pub const MOUSEOUT: &str = "mouseout";
pub const MOUSEOVER: &str = "mouseover";

pub const PUSH_STATE: &str = "pushState";
pub const REPLACE_STATE: &str = "replaceState";
pub const POPSTATE: &str = "popstate";
pub const HASHCHANGE: &str = "hashchange";

pub const ERROR: &str = "error";
pub const UNHANDLED_REJECTION: &str = "unhandledrejection";

/// Interaction events the DOM category listens to
pub const MOUSE_EVENTS: [&str; 8] = [
    CLICK,
    DBLCLICK,
    CONTEXTMENU,
    MOUSEDOWN,
    MOUSEUP,
    MOUSEENTER,
    MOUSEOUT,
    MOUSEOVER,
];

/// Listener registration handle
pub type ListenerId = u64;

/// Event listener callback
pub type Listener = Arc<dyn Fn(&PageEvent) + Send + Sync>;

/// A rejected asynchronous operation. Resolves to the rejection reason.
pub type Rejection = Shared<BoxFuture<'static, Value>>;

/// Event-specific payload
#[derive(Clone, Default)]
pub enum EventDetail {
    #[default]
    None,
    /// Uncaught synchronous error
    Error { message: String },
    /// Unhandled rejection; the reason is only available once awaited
    Rejection(Rejection),
}

impl fmt::Debug for EventDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventDetail::None => f.write_str("None"),
            EventDetail::Error { message } => {
                f.debug_struct("Error").field("message", message).finish()
            }
            EventDetail::Rejection(_) => f.write_str("Rejection(..)"),
        }
    }
}

/// Event dispatched on the page
#[derive(Debug, Clone)]
pub struct PageEvent {
    pub name: String,
    pub target: Option<Element>,
    pub detail: EventDetail,
}

impl PageEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: None,
            detail: EventDetail::None,
        }
    }

    pub fn with_target(mut self, target: Element) -> Self {
        self.target = Some(target);
        self
    }

    /// `error` event for an uncaught exception
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            name: ERROR.to_string(),
            target: None,
            detail: EventDetail::Error {
                message: message.into(),
            },
        }
    }

    /// `unhandledrejection` event. `rejection` yields the reason when awaited.
    pub fn unhandled_rejection<F>(rejection: F) -> Self
    where
        F: Future<Output = Value> + Send + 'static,
    {
        Self {
            name: UNHANDLED_REJECTION.to_string(),
            target: None,
            detail: EventDetail::Rejection(rejection.boxed().shared()),
        }
    }

    /// `unhandledrejection` for an operation that already failed with `reason`
    pub fn rejected(reason: impl Into<Value>) -> Self {
        Self::unhandled_rejection(futures_util::future::ready(reason.into()))
    }
}

/// The page's global event target
pub trait EventTarget: Send + Sync {
    /// Register a listener for events named `name`
    fn add_listener(&self, name: &str, listener: Listener) -> ListenerId;

    /// Remove a listener. Returns false if it was not registered.
    fn remove_listener(&self, name: &str, id: ListenerId) -> bool;

    /// Synchronously invoke every listener registered for `event.name`
    fn dispatch(&self, event: &PageEvent);
}

/// In-process event bus
pub struct PageEventBus {
    /// Monotonic listener ID counter
    next_id: AtomicU64,

    /// Key: event name, Value: listeners in registration order
    listeners: DashMap<String, Vec<(ListenerId, Listener)>>,
}

impl PageEventBus {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: DashMap::new(),
        }
    }

    /// Number of listeners registered for `name`
    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.get(name).map(|l| l.len()).unwrap_or(0)
    }

    /// Total number of registered listeners
    pub fn total_listeners(&self) -> usize {
        self.listeners.iter().map(|entry| entry.value().len()).sum()
    }
}

impl Default for PageEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventTarget for PageEventBus {
    fn add_listener(&self, name: &str, listener: Listener) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.listeners
            .entry(name.to_string())
            .or_default()
            .push((id, listener));
        id
    }

    fn remove_listener(&self, name: &str, id: ListenerId) -> bool {
        let Some(mut listeners) = self.listeners.get_mut(name) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        before != listeners.len()
    }

    fn dispatch(&self, event: &PageEvent) {
        // Snapshot first: listeners may dispatch or (un)subscribe re-entrantly
        let listeners: Vec<Listener> = match self.listeners.get(&event.name) {
            Some(entry) => entry.value().iter().map(|(_, l)| l.clone()).collect(),
            None => return,
        };

        for listener in listeners {
            listener(event);
        }
    }
}
