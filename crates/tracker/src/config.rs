//! Tracker configuration
//!
//! `Options` is what the embedding page passes in; `Settings` is the resolved
//! record every report carries. Field names serialise in camelCase because
//! they travel to the collector verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, TrackerError};

/// Version stamped into every report as `sdkVersion`
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Caller-supplied options. Only `request_url` is required.
///
/// Unknown fields are kept in `passthrough` and end up in every report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    pub request_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_tracker: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_tracker: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dom_tracker: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub js_error: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
    #[serde(flatten)]
    pub passthrough: Map<String, Value>,
}

impl Options {
    pub fn new(request_url: impl Into<String>) -> Self {
        Self {
            request_url: request_url.into(),
            ..Default::default()
        }
    }

    /// Parse options from a JSON object, e.g. an embed snippet's config
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| TrackerError::Config(e.to_string()))
    }

    pub fn with_history_tracker(mut self, enabled: bool) -> Self {
        self.history_tracker = Some(enabled);
        self
    }

    pub fn with_hash_tracker(mut self, enabled: bool) -> Self {
        self.hash_tracker = Some(enabled);
        self
    }

    pub fn with_dom_tracker(mut self, enabled: bool) -> Self {
        self.dom_tracker = Some(enabled);
        self
    }

    pub fn with_js_error(mut self, enabled: bool) -> Self {
        self.js_error = Some(enabled);
        self
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    pub fn with_extra(mut self, extra: Value) -> Self {
        self.extra = Some(extra);
        self
    }

    /// Extra field copied into every report as-is
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.passthrough.insert(key.into(), value.into());
        self
    }

    /// Overlay these options onto the defaults
    ///
    /// The endpoint is only checked for presence; a malformed URL surfaces
    /// later as a beacon that never gets queued.
    pub fn resolve(self) -> Result<Settings> {
        if self.request_url.trim().is_empty() {
            return Err(TrackerError::Config("requestUrl is required".to_string()));
        }

        Ok(Settings {
            sdk_version: self.sdk_version.unwrap_or_else(|| SDK_VERSION.to_string()),
            history_tracker: self.history_tracker.unwrap_or(true),
            hash_tracker: self.hash_tracker.unwrap_or(true),
            dom_tracker: self.dom_tracker.unwrap_or(true),
            js_error: self.js_error.unwrap_or(true),
            request_url: self.request_url,
            uuid: self.uuid,
            extra: self.extra,
            passthrough: self.passthrough,
        })
    }
}

/// Resolved tracker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub sdk_version: String,
    pub history_tracker: bool,
    pub hash_tracker: bool,
    pub dom_tracker: bool,
    pub js_error: bool,
    pub request_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
    #[serde(flatten)]
    pub passthrough: Map<String, Value>,
}

impl Settings {
    /// Settings as the JSON object merged into reports
    pub fn to_map(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(TrackerError::NotAnObject("settings")),
        }
    }
}
