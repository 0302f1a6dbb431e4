//! History category - page views from navigation state changes

use std::sync::Arc;

use crate::capture::{capture_events, Capture, Subscription};
use crate::events::{EventTarget, POPSTATE, PUSH_STATE, REPLACE_STATE};
use crate::report::ReportSink;

pub const HISTORY_TARGET_KEY: &str = "history-pv";

/// Reports `pushState`, `replaceState` and `popstate` as `history-pv`.
/// The first two only fire once the history hooks are installed.
pub struct HistoryCapture;

impl Capture for HistoryCapture {
    fn name(&self) -> &str {
        "HistoryCapture"
    }

    fn attach(&self, events: &Arc<dyn EventTarget>, sink: &Arc<dyn ReportSink>) -> Vec<Subscription> {
        capture_events(
            events,
            sink,
            &[PUSH_STATE, REPLACE_STATE, POPSTATE],
            HISTORY_TARGET_KEY,
        )
    }
}
