//! JS error category - uncaught errors and unhandled rejections
//!
//! The reports produced here describe failures elsewhere on the page. Building
//! or sending them never raises anything back onto the bus.

use futures_util::FutureExt;
use serde_json::Value;
use std::sync::Arc;

use crate::capture::{listen, Capture, Subscription};
use crate::events::{EventDetail, EventTarget, ERROR, UNHANDLED_REJECTION};
use crate::report::{Record, ReportSink};

pub const ERROR_TARGET_KEY: &str = "message";
pub const REJECT_TARGET_KEY: &str = "reject";

/// `event` value of rejection reports
pub const PROMISE_EVENT: &str = "promise";

pub struct JsErrorCapture;

impl JsErrorCapture {
    /// An `error` event forwarded without a message still counts; its
    /// `message` is null.
    fn error_event(events: &Arc<dyn EventTarget>, sink: &Arc<dyn ReportSink>) -> Subscription {
        let sink = sink.clone();
        listen(events, ERROR, move |event| {
            let message = match &event.detail {
                EventDetail::Error { message } => Value::String(message.clone()),
                _ => Value::Null,
            };
            sink.emit(Record::new(ERROR, ERROR_TARGET_KEY).with_message(message));
        })
    }

    /// Reports once the rejected operation hands over its reason, which happens
    /// on a later turn of the runtime rather than inside the listener. Without
    /// a runtime only reasons that are already settled can be reported.
    fn promise_reject(events: &Arc<dyn EventTarget>, sink: &Arc<dyn ReportSink>) -> Subscription {
        let sink = sink.clone();
        listen(events, UNHANDLED_REJECTION, move |event| {
            let EventDetail::Rejection(rejection) = &event.detail else {
                return;
            };
            let Ok(runtime) = tokio::runtime::Handle::try_current() else {
                let Some(reason) = rejection.clone().now_or_never() else {
                    tracing::debug!("[JsErrorCapture] No runtime, pending rejection dropped");
                    return;
                };
                sink.emit(Record::new(PROMISE_EVENT, REJECT_TARGET_KEY).with_message(reason));
                return;
            };

            let rejection = rejection.clone();
            let sink = sink.clone();
            runtime.spawn(async move {
                let reason = rejection.await;
                sink.emit(Record::new(PROMISE_EVENT, REJECT_TARGET_KEY).with_message(reason));
            });
        })
    }
}

impl Capture for JsErrorCapture {
    fn name(&self) -> &str {
        "JsErrorCapture"
    }

    fn attach(&self, events: &Arc<dyn EventTarget>, sink: &Arc<dyn ReportSink>) -> Vec<Subscription> {
        vec![
            Self::error_event(events, sink),
            Self::promise_reject(events, sink),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{PageEvent, PageEventBus};
    use crate::testing::CollectingSink;
    use serde_json::json;
    use std::time::Duration;

    fn attached() -> (Arc<PageEventBus>, Arc<CollectingSink>) {
        let bus = Arc::new(PageEventBus::new());
        let events: Arc<dyn EventTarget> = bus.clone();
        let collected = Arc::new(CollectingSink::default());
        let sink: Arc<dyn ReportSink> = collected.clone();
        JsErrorCapture.attach(&events, &sink);
        (bus, collected)
    }

    #[test]
    fn test_error_reported_synchronously() {
        let (bus, collected) = attached();

        bus.dispatch(&PageEvent::error("X is not defined"));

        assert_eq!(
            collected.records(),
            vec![Record::new("error", "message").with_message("X is not defined")]
        );
    }

    #[tokio::test]
    async fn test_rejection_reported_after_reason_resolves() {
        let (bus, collected) = attached();
        let (tx, rx) = tokio::sync::oneshot::channel::<Value>();

        bus.dispatch(&PageEvent::unhandled_rejection(async move {
            rx.await.unwrap_or(Value::Null)
        }));
        tokio::task::yield_now().await;
        assert!(collected.records().is_empty());

        tx.send(json!({"code": 503})).unwrap();
        for _ in 0..200 {
            if !collected.records().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(
            collected.records(),
            vec![Record::new("promise", "reject").with_message(json!({"code": 503}))]
        );
    }

    #[test]
    fn test_error_without_message_reports_null() {
        let (bus, collected) = attached();

        bus.dispatch(&PageEvent::new(ERROR));

        assert_eq!(
            collected.records(),
            vec![Record::new("error", "message").with_message(Value::Null)]
        );
    }

    #[test]
    fn test_settled_rejection_reported_without_runtime() {
        let (bus, collected) = attached();

        bus.dispatch(&PageEvent::rejected("Y"));

        assert_eq!(
            collected.records(),
            vec![Record::new("promise", "reject").with_message("Y")]
        );
    }

    #[test]
    fn test_pending_rejection_without_runtime_is_dropped() {
        let (bus, collected) = attached();

        bus.dispatch(&PageEvent::unhandled_rejection(
            futures_util::future::pending::<Value>(),
        ));

        assert!(collected.records().is_empty());
    }
}
