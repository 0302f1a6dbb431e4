//! DOM category - interactions on elements that opt in via `target-key`
//!
//! The attribute is the only filter: an interaction on an element without it
//! is not report-worthy and is dropped without a trace.

use std::sync::Arc;

use crate::capture::{listen, Capture, Subscription};
use crate::events::{EventTarget, MOUSE_EVENTS};
use crate::report::{Record, ReportSink};

pub struct DomCapture;

impl Capture for DomCapture {
    fn name(&self) -> &str {
        "DomCapture"
    }

    fn attach(&self, events: &Arc<dyn EventTarget>, sink: &Arc<dyn ReportSink>) -> Vec<Subscription> {
        MOUSE_EVENTS
            .iter()
            .map(|name| {
                let sink = sink.clone();
                listen(events, name, move |event| {
                    let target_key = event.target.as_ref().and_then(|t| t.target_key());
                    let Some(target_key) = target_key else {
                        return;
                    };
                    sink.emit(Record::new(event.name.clone(), target_key));
                })
            })
            .collect()
    }
}
