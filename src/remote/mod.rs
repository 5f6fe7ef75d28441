//! Remote device configuration.
//!
//! The registry hands out an opaque version string together with a
//! base64 blob. The blob decodes to JSON describing intervals and camera
//! parameters; every field is optional and falls back to a fixed default.

mod config;
mod response;

pub use config::{DeviceConfig, RemoteConfigError};
pub use response::{decode_payload, ConfigResponse, INITIAL_VERSION};
