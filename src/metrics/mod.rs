//! Prometheus metrics exporter for the camera agent.
//!
//! # Metrics Exposed
//!
//! ## Config
//! - `pi_camera_config_fetches_total` - Config fetches answered with HTTP 200
//! - `pi_camera_config_updates_total` - Config versions applied
//! - `pi_camera_config_rejections_total` - Config versions with a bad payload
//! - `pi_camera_config_interval_seconds` - Current poll interval
//!
//! ## Capture
//! - `pi_camera_captures_total` - Stills captured
//! - `pi_camera_capture_failures_total` - Failed capture attempts
//! - `pi_camera_capture_interval_seconds` - Current capture interval
//! - `pi_camera_last_capture_bytes` - Size of the latest still
//!
//! ## Upload
//! - `pi_camera_uploads_total` - Uploads acknowledged with HTTP 200
//! - `pi_camera_upload_failures_total` - Uploads that failed or were rejected
//!
//! The exporter (`/metrics`, `/health`) is only built with the `metrics`
//! feature.

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, ServerError};
