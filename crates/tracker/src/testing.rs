//! Test doubles for the page collaborators

use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;

use crate::report::Clock;
use crate::transport::{Beacon, Transport};

/// Clock frozen at a fixed instant
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// Transport that keeps every beacon instead of sending it
pub struct RecordingTransport {
    beacons: Mutex<Vec<(String, Beacon)>>,
    accept: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            beacons: Mutex::new(Vec::new()),
            accept: true,
        }
    }

    /// Records beacons but reports them as not queued
    pub fn rejecting() -> Self {
        Self {
            beacons: Mutex::new(Vec::new()),
            accept: false,
        }
    }

    pub fn beacons(&self) -> Vec<(String, Beacon)> {
        self.beacons.lock().unwrap().clone()
    }

    /// Decoded bodies, oldest first
    pub fn payloads(&self) -> Vec<Value> {
        self.beacons()
            .into_iter()
            .map(|(_, beacon)| serde_json::from_str(&beacon.body).unwrap())
            .collect()
    }

    /// Payloads whose `targetKey` equals `key`
    pub fn with_target_key(&self, key: &str) -> Vec<Value> {
        self.payloads()
            .into_iter()
            .filter(|payload| payload["targetKey"] == key)
            .collect()
    }

    /// Wait until at least `count` beacons arrived (for spawned reports)
    pub async fn wait_for(&self, count: usize) {
        for _ in 0..200 {
            if self.beacons.lock().unwrap().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expected {} beacon(s), got {}", count, self.beacons().len());
    }
}

impl Transport for RecordingTransport {
    fn send_beacon(&self, url: &str, beacon: Beacon) -> bool {
        self.beacons.lock().unwrap().push((url.to_string(), beacon));
        self.accept
    }
}

/// Sink that keeps records instead of reporting them
#[derive(Default)]
pub struct CollectingSink(Mutex<Vec<crate::report::Record>>);

impl CollectingSink {
    pub fn records(&self) -> Vec<crate::report::Record> {
        self.0.lock().unwrap().clone()
    }
}

impl crate::report::ReportSink for CollectingSink {
    fn emit(&self, record: crate::report::Record) {
        self.0.lock().unwrap().push(record);
    }
}
