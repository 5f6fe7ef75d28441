//! Device identity and cloud endpoint URLs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default device API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://cloudiotdevice.googleapis.com/v1";

/// Invalid device identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// Named identifier is empty or blank.
    #[error("device identifier `{0}` must not be empty")]
    EmptyField(&'static str),
}

/// Fully-qualified location of one device in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePath {
    /// Cloud project id.
    pub project_id: String,
    /// Registry region, e.g. `asia-east1`.
    pub location: String,
    /// Device registry id.
    pub registry: String,
    /// Device id within the registry.
    pub device: String,
}

impl DevicePath {
    /// Creates a device path, rejecting empty identifiers.
    pub fn new(
        project_id: impl Into<String>,
        location: impl Into<String>,
        registry: impl Into<String>,
        device: impl Into<String>,
    ) -> Result<Self, DeviceError> {
        let path = Self {
            project_id: project_id.into(),
            location: location.into(),
            registry: registry.into(),
            device: device.into(),
        };
        path.validate()?;
        Ok(path)
    }

    /// Rejects empty or blank identifiers.
    pub fn validate(&self) -> Result<(), DeviceError> {
        let fields = [
            ("project_id", &self.project_id),
            ("location", &self.location),
            ("registry", &self.registry),
            ("device", &self.device),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(DeviceError::EmptyField(name));
            }
        }
        Ok(())
    }

    /// Resource path relative to the API root.
    fn resource(&self, base_url: &str) -> String {
        format!(
            "{}/projects/{}/locations/{}/registries/{}/devices/{}",
            base_url.trim_end_matches('/'),
            self.project_id,
            self.location,
            self.registry,
            self.device
        )
    }

    /// URL for fetching the device config. The caller adds the
    /// `local_version` query parameter.
    pub fn config_url(&self, base_url: &str) -> String {
        format!("{}/config", self.resource(base_url))
    }

    /// URL for publishing a telemetry event.
    pub fn publish_event_url(&self, base_url: &str) -> String {
        format!("{}:publishEvent", self.resource(base_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> DevicePath {
        DevicePath::new("proj", "asia-east1", "carts", "pi-01").unwrap()
    }

    #[test]
    fn test_config_url() {
        assert_eq!(
            path().config_url(DEFAULT_BASE_URL),
            "https://cloudiotdevice.googleapis.com/v1/projects/proj/locations/asia-east1\
             /registries/carts/devices/pi-01/config"
        );
    }

    #[test]
    fn test_publish_event_url_trailing_slash() {
        assert_eq!(
            path().publish_event_url("http://localhost:8080/v1/"),
            "http://localhost:8080/v1/projects/proj/locations/asia-east1\
             /registries/carts/devices/pi-01:publishEvent"
        );
    }

    #[test]
    fn test_empty_field_rejected() {
        assert_eq!(
            DevicePath::new("proj", "", "carts", "pi-01"),
            Err(DeviceError::EmptyField("location"))
        );
    }
}
