//! Camera control and still capture.
//!
//! The camera is an external device driven through a trait so the polling
//! loop can be exercised without hardware. Stills are JPEG buffers that
//! live for a single loop iteration.

mod camera;
mod config;
mod still;

pub use camera::{Camera, CameraError, MockCamera, RaspistillCamera};
pub use config::{CameraConfig, CameraSettings, SettingsError};
pub use still::Capture;
