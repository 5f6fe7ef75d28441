//! Pi Cloud Camera
//!
//! A Raspberry Pi agent that keeps a camera in step with a cloud device
//! registry: it polls the device's remote configuration, reconfigures the
//! camera when a new version arrives, and periodically captures a still
//! and publishes it as a telemetry event.
//!
//! # Architecture
//!
//! ```text
//! auth (JWT) ─┐
//!             ▼
//! api ──▶ remote config ──▶ watchdog ──▶ capture ──▶ api (publish)
//!                              │
//!                           metrics
//! ```
//!
//! # Design Principles
//!
//! - **Single actor**: one blocking loop owns all state; no locks.
//! - **Fresh credentials**: a new token is signed for every request.
//! - **Wholesale config**: a new version replaces every field; omitted
//!   fields fall back to defaults, not previous values.
//! - **Fetch failures are fatal, upload failures are not**.
//!
//! # Example
//!
//! ```no_run
//! use pi_cloud_camera::{
//!     api::HttpDeviceApi,
//!     auth::{SigningAlgorithm, TokenSigner},
//!     capture::{CameraConfig, RaspistillCamera},
//!     device::{DevicePath, DEFAULT_BASE_URL},
//!     watchdog::Watchdog,
//! };
//! use std::sync::atomic::AtomicBool;
//! use std::time::{Duration, Instant};
//!
//! let device = DevicePath::new("my-project", "asia-east1", "carts", "pi-01").unwrap();
//! let signer = TokenSigner::from_pem_file(
//!     "ec_private.pem",
//!     SigningAlgorithm::Es256,
//!     device.project_id.clone(),
//!     60,
//! )
//! .unwrap();
//! let api = HttpDeviceApi::new(DEFAULT_BASE_URL, device, Duration::from_secs(30));
//! let camera = RaspistillCamera::new(CameraConfig::default()).unwrap();
//!
//! let mut watchdog = Watchdog::new(camera, api, signer, Instant::now());
//! watchdog.run(&AtomicBool::new(false)).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod api;
pub mod auth;
pub mod capture;
pub mod config;
pub mod device;
pub mod metrics;
pub mod oneshot;
pub mod remote;
pub mod watchdog;

// Re-export commonly used types at crate root
pub use api::{DeviceApi, HttpDeviceApi, MockDeviceApi, PublishOutcome};
pub use auth::{SigningAlgorithm, TokenSigner};
pub use capture::{Camera, CameraSettings, Capture, MockCamera, RaspistillCamera};
pub use config::AgentConfig;
pub use device::DevicePath;
pub use remote::{ConfigResponse, DeviceConfig};
pub use watchdog::{Watchdog, WatchdogError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
