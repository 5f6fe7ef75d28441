//! Loop state carried between iterations.

use crate::remote::{DeviceConfig, INITIAL_VERSION};
use std::time::Instant;

/// Configuration state of the polling loop.
#[derive(Debug, Clone)]
pub struct PollState {
    /// Last version seen from the registry.
    version: String,
    /// Config currently in force.
    config: DeviceConfig,
    /// When the last capture was attempted.
    last_captured_at: Instant,
}

impl PollState {
    /// Fresh state: initial version, default config, capture clock
    /// starting at `started_at`.
    pub fn new(started_at: Instant) -> Self {
        Self {
            version: INITIAL_VERSION.to_string(),
            config: DeviceConfig::default(),
            last_captured_at: started_at,
        }
    }

    /// Last version seen.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Config in force.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// When the capture clock was last restarted.
    pub fn last_captured_at(&self) -> Instant {
        self.last_captured_at
    }

    /// True if `version` differs from the one held.
    pub fn is_new_version(&self, version: &str) -> bool {
        self.version != version
    }

    /// Replaces the config wholesale and records its version.
    pub fn apply(&mut self, version: String, config: DeviceConfig) {
        self.version = version;
        self.config = config;
    }

    /// Records a version whose payload was rejected; the config in force
    /// is kept.
    pub fn skip_version(&mut self, version: String) {
        self.version = version;
    }

    /// Capture fires strictly after `capture_interval` has elapsed.
    pub fn capture_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_captured_at) > self.config.capture_interval()
    }

    /// Restarts the capture clock at `now`.
    pub fn mark_captured(&mut self, now: Instant) {
        self.last_captured_at = now;
    }
}

/// Running totals kept by the loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchdogStats {
    /// Successful config fetches.
    pub config_fetches: u64,
    /// New versions applied.
    pub config_updates: u64,
    /// New versions whose payload was rejected.
    pub config_rejections: u64,
    /// Stills taken.
    pub captures: u64,
    /// Failed capture attempts.
    pub capture_failures: u64,
    /// Uploads acknowledged with HTTP 200.
    pub uploads: u64,
    /// Uploads rejected or not delivered.
    pub upload_failures: u64,
    /// Size of the most recent still.
    pub last_capture_bytes: usize,
}
