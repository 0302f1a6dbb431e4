//! Hash category

use std::sync::Arc;

use crate::capture::{capture_events, Capture, Subscription};
use crate::events::{EventTarget, HASHCHANGE};
use crate::report::ReportSink;

pub const HASH_TARGET_KEY: &str = "hash-pv";

pub struct HashCapture;

impl Capture for HashCapture {
    fn name(&self) -> &str {
        "HashCapture"
    }

    fn attach(&self, events: &Arc<dyn EventTarget>, sink: &Arc<dyn ReportSink>) -> Vec<Subscription> {
        capture_events(events, sink, &[HASHCHANGE], HASH_TARGET_KEY)
    }
}
