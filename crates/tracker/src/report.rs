//! Report records and the reporting sink
//!
//! Every capture path ends in `ReportSink::emit`. The sink merges the current
//! settings and a timestamp into the record, serialises it and hands the
//! bytes to the transport. Nothing here returns an error to the caller.

use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::{Arc, RwLock};

use crate::config::Settings;
use crate::error::{Result, TrackerError};
use crate::transport::{Beacon, ContentType, Transport};

/// Key of the capture timestamp in a delivered payload
pub const TIME_FIELD: &str = "time";

/// One observed occurrence, before settings are merged in
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new(event: impl Into<String>, target_key: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("event".to_string(), Value::String(event.into()));
        fields.insert("targetKey".to_string(), Value::String(target_key.into()));
        Self(fields)
    }

    pub fn with_message(mut self, message: impl Into<Value>) -> Self {
        self.0.insert("message".to_string(), message.into());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.0.insert("data".to_string(), data);
        self
    }

    /// Caller-built record. Must serialise to a JSON object.
    pub fn from_serialize<T: Serialize + ?Sized>(data: &T) -> Result<Self> {
        match serde_json::to_value(data)? {
            Value::Object(fields) => Ok(Self(fields)),
            Value::Null => Err(TrackerError::NotAnObject("null")),
            Value::Bool(_) => Err(TrackerError::NotAnObject("bool")),
            Value::Number(_) => Err(TrackerError::NotAnObject("number")),
            Value::String(_) => Err(TrackerError::NotAnObject("string")),
            Value::Array(_) => Err(TrackerError::NotAnObject("array")),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

/// Wall-clock source for report timestamps
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Single entry point every capture mechanism reports through
pub trait ReportSink: Send + Sync {
    fn emit(&self, record: Record);
}

/// Sink that beacons records to `Settings::request_url`
pub struct Reporter {
    settings: Arc<RwLock<Settings>>,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    content_type: ContentType,
}

impl Reporter {
    pub fn new(
        settings: Arc<RwLock<Settings>>,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            transport,
            clock,
            content_type: ContentType::default(),
        }
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    /// `settings ∪ record ∪ {time}`, later keys winning
    ///
    /// Settings are read at call time, so setter changes show up in every
    /// report built afterwards and never in one already built.
    pub fn build_payload(&self, record: Record) -> Result<(String, Map<String, Value>)> {
        let (url, mut payload) = {
            let settings = self.settings.read().unwrap_or_else(|e| e.into_inner());
            (settings.request_url.clone(), settings.to_map()?)
        };
        payload.extend(record.into_map());
        payload.insert(TIME_FIELD.to_string(), Value::from(self.clock.now_millis()));
        Ok((url, payload))
    }

    fn deliver(&self, record: Record) -> Result<()> {
        let (url, payload) = self.build_payload(record)?;
        let body = serde_json::to_string(&payload)?;
        let queued = self.transport.send_beacon(
            &url,
            Beacon {
                content_type: self.content_type,
                body,
            },
        );
        if queued {
            tracing::trace!("report queued for {}", url);
        } else {
            tracing::debug!("report to {} was not queued", url);
        }
        Ok(())
    }
}

impl ReportSink for Reporter {
    fn emit(&self, record: Record) {
        if let Err(e) = self.deliver(record) {
            tracing::debug!("report dropped: {}", e);
        }
    }
}
