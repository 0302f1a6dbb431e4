//! Tracker - the embeddable agent
//!
//! Construction resolves the settings, hooks the page's history and attaches
//! one capture per enabled category. From then on every captured occurrence,
//! and every `send_tracker` call, goes through the same reporter.

use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, RwLock};

use crate::capture::CaptureManager;
use crate::config::{Options, Settings};
use crate::error::Result;
use crate::history::HistoryInstrumentation;
use crate::page::Page;
use crate::report::{Clock, Record, ReportSink, Reporter, SystemClock};
use crate::transport::{BeaconTransport, ContentType, Transport};

/// Builder for trackers with non-default collaborators
pub struct TrackerBuilder {
    options: Options,
    transport: Option<Arc<dyn Transport>>,
    clock: Option<Arc<dyn Clock>>,
    content_type: ContentType,
}

impl TrackerBuilder {
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    /// Attach to `page`. Fails if the options lack an endpoint or the page's
    /// history cannot be hooked.
    pub fn build(self, page: Page) -> Result<Tracker> {
        let settings = self.options.resolve()?;
        let instrumentation =
            HistoryInstrumentation::install(page.history.clone(), page.events.clone())?;

        let mut captures = CaptureManager::for_settings(&settings);
        let settings = Arc::new(RwLock::new(settings));

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(BeaconTransport::new()),
        };
        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };
        let reporter = Arc::new(
            Reporter::new(settings.clone(), transport, clock).with_content_type(self.content_type),
        );

        let sink: Arc<dyn ReportSink> = reporter.clone();
        captures.attach_all(&page.events, &sink);

        tracing::info!(
            "Tracker attached: captures={:?}, subscriptions={}",
            captures.names(),
            captures.subscriptions().len()
        );

        Ok(Tracker {
            settings,
            reporter,
            page,
            instrumentation,
            captures,
        })
    }
}

/// Behaviour tracker attached to one page
pub struct Tracker {
    settings: Arc<RwLock<Settings>>,
    reporter: Arc<Reporter>,
    page: Page,
    instrumentation: HistoryInstrumentation,
    captures: CaptureManager,
}

impl Tracker {
    /// Tracker that beacons over HTTP with wall-clock timestamps
    pub fn new(options: Options, page: Page) -> Result<Self> {
        Self::builder(options).build(page)
    }

    pub fn builder(options: Options) -> TrackerBuilder {
        TrackerBuilder {
            options,
            transport: None,
            clock: None,
            content_type: ContentType::default(),
        }
    }

    /// Identify the user in every later report
    pub fn set_user_id(&self, uuid: impl Into<String>) {
        self.settings_mut().uuid = Some(uuid.into());
    }

    /// Replace the opaque `extra` payload carried by every later report
    pub fn set_extra(&self, extra: Value) {
        self.settings_mut().extra = Some(extra);
    }

    /// Report a caller-built record right away
    ///
    /// `data` must serialise to a JSON object; anything else is dropped.
    pub fn send_tracker<T: Serialize + ?Sized>(&self, data: &T) {
        match Record::from_serialize(data) {
            Ok(record) => self.reporter.emit(record),
            Err(e) => tracing::debug!("send_tracker ignored: {}", e),
        }
    }

    /// Snapshot of the current settings
    pub fn settings(&self) -> Settings {
        self.settings
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Remove every listener and put the original history back
    ///
    /// Reports already handed to the transport are unaffected.
    pub fn dispose(&mut self) -> Result<()> {
        let removed = self.captures.detach_all(&self.page.events);
        self.instrumentation.uninstall()?;
        tracing::info!("Tracker disposed: {} listener(s) removed", removed);
        Ok(())
    }

    fn settings_mut(&self) -> std::sync::RwLockWriteGuard<'_, Settings> {
        self.settings.write().unwrap_or_else(|e| e.into_inner())
    }
}
