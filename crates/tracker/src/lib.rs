//! Page Behaviour Tracker
//!
//! Watches a page for interactions, navigation and runtime failures and
//! beacons each occurrence, stamped with the tracker's settings, to a
//! collector endpoint.
//!
//! # Architecture
//!
//! ```text
//! Options → Settings ─┐
//!                     ├─ HistoryInstrumentation (pushState/replaceState → bus)
//! Page ── EventTarget ┴─ CaptureManager ── Capture × N ──→ ReportSink::emit
//!                                                             ↓
//!                                         Reporter (settings ∪ record ∪ time)
//!                                                             ↓
//!                                                  Transport::send_beacon
//! ```
//!
//! 1. **Collaborators are injected**: the event target, history slot,
//!    transport and clock are traits, so the same tracker runs against a real
//!    host or an in-process page.
//! 2. **One way out**: DOM events, error channels and `send_tracker` all end
//!    in `ReportSink::emit`.
//! 3. **Invisible under failure**: nothing that goes wrong while reporting
//!    reaches the page.

pub mod agent;
pub mod capture;
pub mod captures;
pub mod config;
pub mod dom;
pub mod error;
pub mod events;
pub mod history;
pub mod page;
pub mod report;
pub mod transport;

#[cfg(test)]
mod testing;

pub use agent::{Tracker, TrackerBuilder};
pub use capture::{Capture, CaptureManager, Subscription};
pub use config::{Options, Settings, SDK_VERSION};
pub use dom::{Element, TARGET_KEY_ATTRIBUTE};
pub use error::{Result, TrackerError};
pub use events::{EventTarget, PageEvent, PageEventBus};
pub use history::{History, HistoryInstrumentation, HistorySlot, SessionHistory};
pub use page::Page;
pub use report::{Clock, Record, ReportSink, Reporter, SystemClock};
pub use transport::{Beacon, BeaconTransport, ContentType, Transport};
