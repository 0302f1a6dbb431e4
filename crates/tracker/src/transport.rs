//! Beacon transport - fire-and-forget delivery to the collector
//!
//! `send_beacon` only queues. The request runs on a detached task, is never
//! awaited by the caller and its outcome is only traced.

use reqwest::header::CONTENT_TYPE;
use url::Url;

/// Content type label sent with each beacon
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentType {
    /// Body is JSON and labelled as such
    #[default]
    Json,
    /// JSON body labelled as a form post, for collectors that expect it
    LegacyFormUrlEncoded,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::LegacyFormUrlEncoded => "application/x-www-form-urlencoded",
        }
    }
}

/// Serialised report ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Beacon {
    pub content_type: ContentType,
    pub body: String,
}

/// Non-blocking, best-effort delivery primitive
pub trait Transport: Send + Sync {
    /// Queue `beacon` for delivery to `url`. Returns whether it was queued;
    /// delivery itself is never observable.
    fn send_beacon(&self, url: &str, beacon: Beacon) -> bool;
}

/// HTTP beacon transport
///
/// Each beacon is a POST spawned onto the current tokio runtime. The task is
/// detached, so it keeps running after the triggering handler returns.
pub struct BeaconTransport {
    client: reqwest::Client,
}

impl BeaconTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for BeaconTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for BeaconTransport {
    fn send_beacon(&self, url: &str, beacon: Beacon) -> bool {
        let url = match Url::parse(url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            Ok(url) => {
                tracing::debug!("[BeaconTransport] Unsupported scheme: {}", url.scheme());
                return false;
            }
            Err(e) => {
                tracing::debug!("[BeaconTransport] Invalid endpoint {}: {}", url, e);
                return false;
            }
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("[BeaconTransport] No runtime, beacon dropped");
            return false;
        };

        let request = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, beacon.content_type.as_str())
            .body(beacon.body);

        runtime.spawn(async move {
            match request.send().await {
                Ok(response) => {
                    tracing::trace!("[BeaconTransport] {} -> {}", url, response.status());
                }
                Err(e) => {
                    tracing::debug!("[BeaconTransport] Delivery to {} failed: {}", url, e);
                }
            }
        });

        true
    }
}
