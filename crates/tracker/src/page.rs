//! Page - the host environment a tracker is embedded in
//!
//! Bundles the page's event target and its patchable history slot. Hosts that
//! drive a real document forward its events into `events`; everything else can
//! use `Page::new`, which wires the in-process bus and session history.

use serde_json::Value;
use std::sync::Arc;

use crate::dom::Element;
use crate::error::Result;
use crate::events::{EventTarget, PageEvent, PageEventBus, CLICK};
use crate::history::{History, HistorySlot, SessionHistory};

#[derive(Clone)]
pub struct Page {
    pub events: Arc<dyn EventTarget>,
    pub history: Arc<HistorySlot>,
}

impl Page {
    /// In-process page at `url`
    pub fn new(url: &str) -> Result<Self> {
        let events: Arc<dyn EventTarget> = Arc::new(PageEventBus::new());
        let history = SessionHistory::new(url, events.clone())?;
        Ok(Self {
            events,
            history: Arc::new(HistorySlot::new(Arc::new(history))),
        })
    }

    pub fn from_parts(events: Arc<dyn EventTarget>, history: Arc<HistorySlot>) -> Self {
        Self { events, history }
    }

    /// History as page code sees it (instrumented once a tracker is attached)
    pub fn history(&self) -> Arc<dyn History> {
        self.history.current()
    }

    pub fn dispatch(&self, event: &PageEvent) {
        self.events.dispatch(event);
    }

    /// Fire an interaction event at `target`
    pub fn interact(&self, event: &str, target: Element) {
        self.dispatch(&PageEvent::new(event).with_target(target));
    }

    pub fn click(&self, target: Element) {
        self.interact(CLICK, target);
    }

    /// Surface an uncaught error
    pub fn raise_error(&self, message: impl Into<String>) {
        self.dispatch(&PageEvent::error(message));
    }

    /// Surface an operation that was rejected with `reason` and never handled
    pub fn reject(&self, reason: impl Into<Value>) {
        self.dispatch(&PageEvent::rejected(reason));
    }
}
