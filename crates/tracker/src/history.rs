//! Navigation state and its instrumentation
//!
//! `push_state` and `replace_state` change the current entry without raising
//! any event; only traversal (`go`) raises `popstate`. `HistoryInstrumentation`
//! swaps the page's history for a wrapper that dispatches `pushState` /
//! `replaceState` after the original call returns, so all three transitions
//! become observable on the event bus.

use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use url::Url;

use crate::error::{Result, TrackerError};
use crate::events::{EventTarget, PageEvent, HASHCHANGE, POPSTATE, PUSH_STATE, REPLACE_STATE};

/// The page's navigation-state API
pub trait History: Send + Sync {
    /// Add a new entry after the current one, dropping any forward entries
    fn push_state(&self, state: Value, title: &str, url: Option<&str>) -> Result<()>;

    /// Overwrite the current entry
    fn replace_state(&self, state: Value, title: &str, url: Option<&str>) -> Result<()>;

    /// Traverse `delta` entries (negative is back). Out-of-range is a no-op.
    fn go(&self, delta: i64);

    /// Navigate to a fragment of the current document (`location.hash = ..`)
    fn set_hash(&self, hash: &str);

    /// State object of the current entry
    fn state(&self) -> Value;

    /// URL of the current entry
    fn location(&self) -> String;

    /// Number of entries in the session history
    fn length(&self) -> usize;

    fn back(&self) {
        self.go(-1);
    }

    fn forward(&self) {
        self.go(1);
    }
}

#[derive(Debug, Clone)]
struct Entry {
    url: Url,
    state: Value,
}

#[derive(Debug)]
struct Entries {
    list: Vec<Entry>,
    index: usize,
}

impl Entries {
    fn current(&self) -> &Entry {
        &self.list[self.index]
    }
}

/// In-memory session history for a single document
///
/// Traversal dispatches `popstate` (and `hashchange` when only the fragment
/// differs) on the page's event target, the way a browser does.
pub struct SessionHistory {
    entries: Mutex<Entries>,
    events: Arc<dyn EventTarget>,
}

impl SessionHistory {
    pub fn new(url: &str, events: Arc<dyn EventTarget>) -> Result<Self> {
        let url = Url::parse(url)?;
        Ok(Self {
            entries: Mutex::new(Entries {
                list: vec![Entry {
                    url,
                    state: Value::Null,
                }],
                index: 0,
            }),
            events,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Resolve `url` against the current entry. Cross-origin targets are refused.
    fn resolve(current: &Url, url: Option<&str>) -> Result<Url> {
        let Some(url) = url else {
            return Ok(current.clone());
        };
        let resolved = current.join(url)?;
        if resolved.origin() != current.origin() {
            return Err(TrackerError::Navigation(format!(
                "{} is not same-origin with {}",
                resolved, current
            )));
        }
        Ok(resolved)
    }
}

fn same_document(a: &Url, b: &Url) -> bool {
    let mut a = a.clone();
    let mut b = b.clone();
    a.set_fragment(None);
    b.set_fragment(None);
    a == b
}

impl History for SessionHistory {
    fn push_state(&self, state: Value, _title: &str, url: Option<&str>) -> Result<()> {
        let mut entries = self.lock();
        let url = Self::resolve(&entries.current().url, url)?;
        let next = entries.index + 1;
        entries.list.truncate(next);
        entries.list.push(Entry { url, state });
        entries.index = next;
        Ok(())
    }

    fn replace_state(&self, state: Value, _title: &str, url: Option<&str>) -> Result<()> {
        let mut entries = self.lock();
        let url = Self::resolve(&entries.current().url, url)?;
        let index = entries.index;
        entries.list[index] = Entry { url, state };
        Ok(())
    }

    fn go(&self, delta: i64) {
        let (from, to) = {
            let mut entries = self.lock();
            let target = match (entries.index as i64).checked_add(delta) {
                Some(target) if delta != 0 && target >= 0 && target < entries.list.len() as i64 => {
                    target
                }
                _ => return,
            };
            let from = entries.current().url.clone();
            entries.index = target as usize;
            (from, entries.current().url.clone())
        };

        // Lock released: listeners read location
        self.events.dispatch(&PageEvent::new(POPSTATE));
        if from != to && same_document(&from, &to) && from.fragment() != to.fragment() {
            self.events.dispatch(&PageEvent::new(HASHCHANGE));
        }
    }

    fn set_hash(&self, hash: &str) {
        {
            let mut entries = self.lock();
            let mut url = entries.current().url.clone();
            let fragment = hash.trim_start_matches('#');
            url.set_fragment(Some(fragment));
            if url == entries.current().url {
                return;
            }
            let next = entries.index + 1;
            entries.list.truncate(next);
            entries.list.push(Entry {
                url,
                state: Value::Null,
            });
            entries.index = next;
        }

        self.events.dispatch(&PageEvent::new(POPSTATE));
        self.events.dispatch(&PageEvent::new(HASHCHANGE));
    }

    fn state(&self) -> Value {
        self.lock().current().state.clone()
    }

    fn location(&self) -> String {
        self.lock().current().url.to_string()
    }

    fn length(&self) -> usize {
        self.lock().list.len()
    }
}

/// The page's `history` property
///
/// Whatever is in the slot is what page code calls. Sealing the slot models a
/// frozen, non-configurable property: nothing can be swapped in afterwards.
pub struct HistorySlot {
    current: RwLock<Arc<dyn History>>,
    sealed: AtomicBool,
    hook: Mutex<Hook>,
}

/// Shared push/replace hook: the history it wraps and how many handles use it
#[derive(Default)]
struct Hook {
    original: Option<Arc<dyn History>>,
    installs: usize,
}

impl HistorySlot {
    pub fn new(history: Arc<dyn History>) -> Self {
        Self {
            current: RwLock::new(history),
            sealed: AtomicBool::new(false),
            hook: Mutex::new(Hook::default()),
        }
    }

    /// History page code currently sees
    pub fn current(&self) -> Arc<dyn History> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Swap in a new history, returning the previous one
    pub fn replace(&self, history: Arc<dyn History>) -> Result<Arc<dyn History>> {
        if self.is_sealed() {
            return Err(TrackerError::HistoryNotWritable(
                "history slot is sealed".to_string(),
            ));
        }
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        Ok(std::mem::replace(&mut *current, history))
    }

    pub fn seal(&self) {
        self.sealed.store(true, Ordering::SeqCst);
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::SeqCst)
    }

    pub fn is_instrumented(&self) -> bool {
        self.install_count() > 0
    }

    /// Number of live instrumentation handles on this slot
    pub fn install_count(&self) -> usize {
        self.lock_hook().installs
    }

    fn lock_hook(&self) -> MutexGuard<'_, Hook> {
        self.hook.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// History wrapper that announces push/replace on the event bus
pub struct InstrumentedHistory {
    inner: Arc<dyn History>,
    events: Arc<dyn EventTarget>,
}

impl InstrumentedHistory {
    pub fn new(inner: Arc<dyn History>, events: Arc<dyn EventTarget>) -> Self {
        Self { inner, events }
    }
}

impl History for InstrumentedHistory {
    fn push_state(&self, state: Value, title: &str, url: Option<&str>) -> Result<()> {
        self.inner.push_state(state, title, url)?;
        self.events.dispatch(&PageEvent::new(PUSH_STATE));
        Ok(())
    }

    fn replace_state(&self, state: Value, title: &str, url: Option<&str>) -> Result<()> {
        self.inner.replace_state(state, title, url)?;
        self.events.dispatch(&PageEvent::new(REPLACE_STATE));
        Ok(())
    }

    fn go(&self, delta: i64) {
        self.inner.go(delta)
    }

    fn set_hash(&self, hash: &str) {
        self.inner.set_hash(hash)
    }

    fn state(&self) -> Value {
        self.inner.state()
    }

    fn location(&self) -> String {
        self.inner.location()
    }

    fn length(&self) -> usize {
        self.inner.length()
    }
}

/// Handle to the push/replace instrumentation of one history slot
///
/// At most one wrapper is ever active per slot. Every handle counts as one
/// install; the original history goes back only when the last handle is
/// uninstalled, so trackers sharing a page never silence each other.
pub struct HistoryInstrumentation {
    slot: Arc<HistorySlot>,
    installed: bool,
}

impl HistoryInstrumentation {
    pub fn install(slot: Arc<HistorySlot>, events: Arc<dyn EventTarget>) -> Result<Self> {
        {
            let mut hook = slot.lock_hook();
            if hook.installs > 0 {
                hook.installs += 1;
                tracing::debug!(
                    "[HistoryInstrumentation] Already installed, {} handle(s)",
                    hook.installs
                );
            } else {
                let original = slot.current();
                let wrapped = Arc::new(InstrumentedHistory::new(original.clone(), events));
                slot.replace(wrapped)?;
                hook.original = Some(original);
                hook.installs = 1;
                tracing::debug!("[HistoryInstrumentation] Installed pushState/replaceState hooks");
            }
        }

        Ok(Self {
            slot,
            installed: true,
        })
    }

    /// Whether this handle still counts towards the slot's installs
    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// Release this handle. The last one out puts the original history back.
    pub fn uninstall(&mut self) -> Result<()> {
        if !self.installed {
            return Ok(());
        }

        let mut hook = self.slot.lock_hook();
        if hook.installs > 1 {
            hook.installs -= 1;
            self.installed = false;
            return Ok(());
        }

        if let Some(original) = hook.original.clone() {
            self.slot.replace(original)?;
        }
        hook.original = None;
        hook.installs = 0;
        self.installed = false;
        tracing::debug!("[HistoryInstrumentation] Restored original history");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Listener, PageEventBus};

    fn recorder(bus: &PageEventBus, names: &[&str]) -> Arc<Mutex<Vec<String>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        for name in names {
            let seen = seen.clone();
            let listener: Listener = Arc::new(move |event| {
                seen.lock().unwrap().push(event.name.clone());
            });
            bus.add_listener(name, listener);
        }
        seen
    }

    fn page() -> (Arc<PageEventBus>, Arc<HistorySlot>) {
        let bus = Arc::new(PageEventBus::new());
        let history = SessionHistory::new("https://shop.test/", bus.clone()).unwrap();
        (bus, Arc::new(HistorySlot::new(Arc::new(history))))
    }

    #[test]
    fn test_push_state_is_silent_without_instrumentation() {
        let (bus, slot) = page();
        let seen = recorder(&bus, &[PUSH_STATE, POPSTATE]);

        slot.current()
            .push_state(Value::from(1), "", Some("/cart"))
            .unwrap();

        assert_eq!(slot.current().location(), "https://shop.test/cart");
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_instrumented_push_and_replace_dispatch_once() {
        let (bus, slot) = page();
        let seen = recorder(&bus, &[PUSH_STATE, REPLACE_STATE]);
        let _hooks = HistoryInstrumentation::install(slot.clone(), bus.clone()).unwrap();

        let history = slot.current();
        history
            .push_state(serde_json::json!({"step": 1}), "", Some("/checkout"))
            .unwrap();
        history.replace_state(Value::Null, "", Some("/checkout?x=1")).unwrap();

        assert_eq!(history.location(), "https://shop.test/checkout?x=1");
        assert_eq!(history.length(), 2);
        assert_eq!(*seen.lock().unwrap(), vec![PUSH_STATE, REPLACE_STATE]);
    }

    #[test]
    fn test_failed_push_does_not_dispatch() {
        let (bus, slot) = page();
        let seen = recorder(&bus, &[PUSH_STATE]);
        let _hooks = HistoryInstrumentation::install(slot.clone(), bus.clone()).unwrap();

        let result = slot
            .current()
            .push_state(Value::Null, "", Some("https://other.test/"));

        assert!(matches!(result, Err(TrackerError::Navigation(_))));
        assert_eq!(slot.current().length(), 1);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_traversal_dispatches_popstate() {
        let (bus, slot) = page();
        let seen = recorder(&bus, &[POPSTATE, HASHCHANGE]);
        let history = slot.current();

        history.push_state(Value::from("a"), "", Some("/a")).unwrap();
        history.back();
        assert_eq!(history.location(), "https://shop.test/");
        history.forward();
        assert_eq!(history.state(), Value::from("a"));
        history.go(5);

        assert_eq!(*seen.lock().unwrap(), vec![POPSTATE, POPSTATE]);
    }

    #[test]
    fn test_set_hash_dispatches_popstate_then_hashchange() {
        let (bus, slot) = page();
        let seen = recorder(&bus, &[POPSTATE, HASHCHANGE]);
        let history = slot.current();

        history.set_hash("#reviews");
        history.set_hash("reviews");

        assert_eq!(history.location(), "https://shop.test/#reviews");
        assert_eq!(*seen.lock().unwrap(), vec![POPSTATE, HASHCHANGE]);

        history.back();
        assert_eq!(
            *seen.lock().unwrap(),
            vec![POPSTATE, HASHCHANGE, POPSTATE, HASHCHANGE]
        );
    }

    #[test]
    fn test_install_is_idempotent() {
        let (bus, slot) = page();
        let seen = recorder(&bus, &[PUSH_STATE]);

        let mut first = HistoryInstrumentation::install(slot.clone(), bus.clone()).unwrap();
        let mut second = HistoryInstrumentation::install(slot.clone(), bus.clone()).unwrap();
        assert_eq!(slot.install_count(), 2);

        slot.current().push_state(Value::Null, "", None).unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);

        second.uninstall().unwrap();
        second.uninstall().unwrap();
        assert!(!second.is_installed());
        assert_eq!(slot.install_count(), 1);

        first.uninstall().unwrap();
        assert!(!slot.is_instrumented());
        slot.current().push_state(Value::Null, "", None).unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_first_uninstall_keeps_hook_for_remaining_handles() {
        let (bus, slot) = page();
        let seen = recorder(&bus, &[PUSH_STATE, REPLACE_STATE]);

        let mut first = HistoryInstrumentation::install(slot.clone(), bus.clone()).unwrap();
        let mut second = HistoryInstrumentation::install(slot.clone(), bus.clone()).unwrap();

        first.uninstall().unwrap();
        assert!(slot.is_instrumented());
        slot.current().push_state(Value::Null, "", Some("/a")).unwrap();
        slot.current().replace_state(Value::Null, "", Some("/b")).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![PUSH_STATE, REPLACE_STATE]);

        second.uninstall().unwrap();
        slot.current().push_state(Value::Null, "", Some("/c")).unwrap();
        assert_eq!(seen.lock().unwrap().len(), 2);
        assert_eq!(slot.current().location(), "https://shop.test/c");
    }

    #[test]
    fn test_go_with_extreme_delta_is_a_no_op() {
        let (bus, slot) = page();
        let seen = recorder(&bus, &[POPSTATE]);
        let history = slot.current();
        history.push_state(Value::Null, "", Some("/a")).unwrap();

        history.go(i64::MAX);
        history.go(i64::MIN);

        assert_eq!(history.location(), "https://shop.test/a");
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_sealed_slot_rejects_install() {
        let (bus, slot) = page();
        slot.seal();

        let result = HistoryInstrumentation::install(slot.clone(), bus);

        assert!(matches!(result, Err(TrackerError::HistoryNotWritable(_))));
        assert!(!slot.is_instrumented());
    }
}
