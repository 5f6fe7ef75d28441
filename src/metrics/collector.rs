//! Metrics collection and registry.

use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Metric registration or encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of agent state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Config fetches that returned HTTP 200.
    pub config_fetches: u64,
    /// Config versions applied to the camera.
    pub config_updates: u64,
    /// Config versions whose payload was rejected.
    pub config_rejections: u64,
    /// Stills taken.
    pub captures: u64,
    /// Capture attempts the camera failed.
    pub capture_failures: u64,
    /// Uploads acknowledged with HTTP 200.
    pub uploads: u64,
    /// Uploads that failed or returned non-200.
    pub upload_failures: u64,
    /// Current poll interval in seconds.
    pub config_interval_secs: f64,
    /// Current capture interval in seconds.
    pub capture_interval_secs: f64,
    /// Size of the most recent still.
    pub last_capture_bytes: usize,
}

/// Prometheus metrics registry for the camera agent.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,

    // Config metrics
    config_fetches_total: IntCounter,
    config_updates_total: IntCounter,
    config_rejections_total: IntCounter,
    config_interval_seconds: Gauge,

    // Capture metrics
    captures_total: IntCounter,
    capture_failures_total: IntCounter,
    capture_interval_seconds: Gauge,
    last_capture_bytes: IntGauge,

    // Upload metrics
    uploads_total: IntCounter,
    upload_failures_total: IntCounter,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all agent metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let config_fetches_total = IntCounter::new(
            "pi_camera_config_fetches_total",
            "Config fetches answered with HTTP 200",
        )?;
        let config_updates_total = IntCounter::new(
            "pi_camera_config_updates_total",
            "Config versions applied",
        )?;
        let config_rejections_total = IntCounter::new(
            "pi_camera_config_rejections_total",
            "Config versions whose payload failed to decode or validate",
        )?;
        let config_interval_seconds = Gauge::new(
            "pi_camera_config_interval_seconds",
            "Current sleep between config polls",
        )?;

        let captures_total =
            IntCounter::new("pi_camera_captures_total", "Still images captured")?;
        let capture_failures_total = IntCounter::new(
            "pi_camera_capture_failures_total",
            "Capture attempts that failed",
        )?;
        let capture_interval_seconds = Gauge::new(
            "pi_camera_capture_interval_seconds",
            "Current minimum time between stills",
        )?;
        let last_capture_bytes = IntGauge::new(
            "pi_camera_last_capture_bytes",
            "Size of the most recent still in bytes",
        )?;

        let uploads_total = IntCounter::new(
            "pi_camera_uploads_total",
            "Uploads acknowledged with HTTP 200",
        )?;
        let upload_failures_total = IntCounter::new(
            "pi_camera_upload_failures_total",
            "Uploads that failed or were rejected",
        )?;

        registry.register(Box::new(config_fetches_total.clone()))?;
        registry.register(Box::new(config_updates_total.clone()))?;
        registry.register(Box::new(config_rejections_total.clone()))?;
        registry.register(Box::new(config_interval_seconds.clone()))?;
        registry.register(Box::new(captures_total.clone()))?;
        registry.register(Box::new(capture_failures_total.clone()))?;
        registry.register(Box::new(capture_interval_seconds.clone()))?;
        registry.register(Box::new(last_capture_bytes.clone()))?;
        registry.register(Box::new(uploads_total.clone()))?;
        registry.register(Box::new(upload_failures_total.clone()))?;

        Ok(Self {
            registry,
            config_fetches_total,
            config_updates_total,
            config_rejections_total,
            config_interval_seconds,
            captures_total,
            capture_failures_total,
            capture_interval_seconds,
            last_capture_bytes,
            uploads_total,
            upload_failures_total,
        })
    }

    /// Updates all metrics from a snapshot of agent state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        // Counters only move forward: increment by the difference.
        advance(&self.config_fetches_total, snapshot.config_fetches);
        advance(&self.config_updates_total, snapshot.config_updates);
        advance(&self.config_rejections_total, snapshot.config_rejections);
        advance(&self.captures_total, snapshot.captures);
        advance(&self.capture_failures_total, snapshot.capture_failures);
        advance(&self.uploads_total, snapshot.uploads);
        advance(&self.upload_failures_total, snapshot.upload_failures);

        self.config_interval_seconds
            .set(snapshot.config_interval_secs);
        self.capture_interval_seconds
            .set(snapshot.capture_interval_secs);
        self.last_capture_bytes
            .set(snapshot.last_capture_bytes as i64);
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl MetricsSnapshot {
    /// Creates a snapshot from the polling loop's totals and current config.
    pub fn from_watchdog(
        stats: &crate::watchdog::WatchdogStats,
        config: &crate::remote::DeviceConfig,
    ) -> Self {
        Self {
            config_fetches: stats.config_fetches,
            config_updates: stats.config_updates,
            config_rejections: stats.config_rejections,
            captures: stats.captures,
            capture_failures: stats.capture_failures,
            uploads: stats.uploads,
            upload_failures: stats.upload_failures,
            config_interval_secs: config.config_interval().as_secs_f64(),
            capture_interval_secs: config.capture_interval().as_secs_f64(),
            last_capture_bytes: stats.last_capture_bytes,
        }
    }
}

fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}
