//! Capture System - one listener set per tracker category
//!
//! Each category is a `Capture`: on attach it subscribes its listeners to the
//! page event bus and hands back the subscriptions it made. The manager keeps
//! those so the whole set can be removed again on dispose.

use std::sync::Arc;

use crate::captures::{DomCapture, HashCapture, HistoryCapture, JsErrorCapture};
use crate::config::Settings;
use crate::events::{EventTarget, ListenerId, PageEvent};
use crate::report::{Record, ReportSink};

/// A listener registered on the event bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub event: String,
    pub id: ListenerId,
}

/// Tracker category - decides which page events become reports
pub trait Capture: Send + Sync {
    /// Human-readable name for logging
    fn name(&self) -> &str;

    /// Subscribe to the bus. Every listener reports through `sink`.
    fn attach(&self, events: &Arc<dyn EventTarget>, sink: &Arc<dyn ReportSink>) -> Vec<Subscription>;
}

/// Register `handler` for `event` and remember the registration
pub fn listen<F>(events: &Arc<dyn EventTarget>, event: &str, handler: F) -> Subscription
where
    F: Fn(&PageEvent) + Send + Sync + 'static,
{
    let id = events.add_listener(event, Arc::new(handler));
    Subscription {
        event: event.to_string(),
        id,
    }
}

/// Report every occurrence of `names` as `{event, targetKey}`
pub fn capture_events(
    events: &Arc<dyn EventTarget>,
    sink: &Arc<dyn ReportSink>,
    names: &[&str],
    target_key: &'static str,
) -> Vec<Subscription> {
    names
        .iter()
        .map(|name| {
            let sink = sink.clone();
            listen(events, name, move |event| {
                sink.emit(Record::new(event.name.clone(), target_key));
            })
        })
        .collect()
}

/// Capture manager - owns the categories and their subscriptions
pub struct CaptureManager {
    captures: Vec<Box<dyn Capture>>,
    subscriptions: Vec<Subscription>,
}

impl CaptureManager {
    pub fn new() -> Self {
        Self {
            captures: Vec::new(),
            subscriptions: Vec::new(),
        }
    }

    /// Manager with every category the settings enable
    pub fn for_settings(settings: &Settings) -> Self {
        let mut manager = Self::new();
        if settings.history_tracker {
            manager.register(Box::new(HistoryCapture));
        }
        if settings.hash_tracker {
            manager.register(Box::new(HashCapture));
        }
        if settings.dom_tracker {
            manager.register(Box::new(DomCapture));
        }
        if settings.js_error {
            manager.register(Box::new(JsErrorCapture));
        }
        manager
    }

    /// Add a capture
    pub fn register(&mut self, capture: Box<dyn Capture>) {
        tracing::debug!("Registered capture: {}", capture.name());
        self.captures.push(capture);
    }

    /// Names of registered captures, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.captures.iter().map(|c| c.name()).collect()
    }

    /// Attach all captures
    pub fn attach_all(&mut self, events: &Arc<dyn EventTarget>, sink: &Arc<dyn ReportSink>) {
        for capture in &self.captures {
            let subscriptions = capture.attach(events, sink);
            tracing::debug!(
                "[{}] Subscribed to {} event(s)",
                capture.name(),
                subscriptions.len()
            );
            self.subscriptions.extend(subscriptions);
        }
    }

    /// Remove every listener the captures registered. Returns how many were removed.
    pub fn detach_all(&mut self, events: &Arc<dyn EventTarget>) -> usize {
        self.subscriptions
            .drain(..)
            .filter(|s| events.remove_listener(&s.event, s.id))
            .count()
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }
}

impl Default for CaptureManager {
    fn default() -> Self {
        Self::new()
    }
}
