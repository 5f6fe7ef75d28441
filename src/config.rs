//! Agent configuration file.
//!
//! Everything the device needs that does not come from the registry:
//! identity, key material, endpoint, capture command and metrics port.
//! Command-line positionals override the file.

use crate::auth::{SigningAlgorithm, DEFAULT_TOKEN_TTL_MINUTES};
use crate::capture::{CameraConfig, SettingsError};
use crate::device::{DeviceError, DevicePath, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Longest token lifetime accepted by the registry.
const MAX_TOKEN_TTL_MINUTES: u32 = 24 * 60;

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// Config file is not valid TOML for this format.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
    /// Required setting left empty.
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
    /// Incomplete device identity.
    #[error(transparent)]
    Device(#[from] DeviceError),
    /// Initial camera settings out of range.
    #[error(transparent)]
    Camera(#[from] SettingsError),
    /// Token lifetime outside 1-1440 minutes.
    #[error("token_ttl_minutes must be 1-1440 (got {0})")]
    InvalidTokenTtl(u32),
    /// Zero HTTP timeout.
    #[error("http_timeout_secs must be positive")]
    InvalidTimeout,
}

/// Device identity and registry connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSection {
    /// Device API root.
    pub base_url: String,
    /// Cloud project id; also the token audience.
    pub project_id: String,
    /// Registry region.
    pub location: String,
    /// Device registry id.
    pub registry: String,
    /// Device id.
    pub device: String,
    /// PEM private key registered for this device.
    pub private_key: PathBuf,
    /// Algorithm matching `private_key`.
    pub algorithm: SigningAlgorithm,
    /// Lifetime of each signed token.
    pub token_ttl_minutes: u32,
    /// Per-request HTTP timeout.
    pub http_timeout_secs: u64,
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: String::new(),
            location: String::new(),
            registry: String::new(),
            device: String::new(),
            private_key: PathBuf::new(),
            algorithm: SigningAlgorithm::default(),
            token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
            http_timeout_secs: 30,
        }
    }
}

/// Metrics exporter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSection {
    /// Metrics server port (0 to disable).
    pub port: u16,
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AgentConfig {
    /// `[device]` table.
    #[serde(default)]
    pub device: DeviceSection,
    /// `[camera]` table.
    #[serde(default)]
    pub camera: CameraConfig,
    /// `[metrics]` table.
    #[serde(default)]
    pub metrics: MetricsSection,
}

impl AgentConfig {
    /// Loads configuration from a TOML file.
    ///
    /// The file may leave identity fields empty when they are supplied on
    /// the command line; call [`AgentConfig::validate`] once merged.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Checks the merged configuration is complete and in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.device_path()?;
        if self.device.private_key.as_os_str().is_empty() {
            return Err(ConfigError::Missing("device.private_key"));
        }
        if self.device.base_url.trim().is_empty() {
            return Err(ConfigError::Missing("device.base_url"));
        }
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&self.device.token_ttl_minutes) {
            return Err(ConfigError::InvalidTokenTtl(self.device.token_ttl_minutes));
        }
        if self.device.http_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        self.camera.validate()?;
        Ok(())
    }

    /// Device identity from the `[device]` table.
    pub fn device_path(&self) -> Result<DevicePath, ConfigError> {
        Ok(DevicePath::new(
            self.device.project_id.clone(),
            self.device.location.clone(),
            self.device.registry.clone(),
            self.device.device.clone(),
        )?)
    }

    /// HTTP timeout as a `Duration`.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.device.http_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn complete() -> AgentConfig {
        let mut config = AgentConfig::default();
        config.device.project_id = "proj".into();
        config.device.location = "asia-east1".into();
        config.device.registry = "carts".into();
        config.device.device = "pi-01".into();
        config.device.private_key = "/etc/pi-camera/ec_private.pem".into();
        config
    }

    #[test]
    fn test_default_needs_identity() {
        assert!(matches!(
            AgentConfig::default().validate(),
            Err(ConfigError::Device(DeviceError::EmptyField("project_id")))
        ));
        assert!(complete().validate().is_ok());
    }

    #[test]
    fn test_parse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[device]
project_id = "proj"
location = "asia-east1"
registry = "carts"
device = "pi-01"
private_key = "/etc/pi-camera/rsa_private.pem"
algorithm = "RS256"
token_ttl_minutes = 20

[camera]
output_path = "/run/still.jpg"
quality = 70

[camera.initial]
brightness = 50
hflip = true

[metrics]
port = 9100
"#
        )
        .unwrap();

        let config = AgentConfig::from_file(file.path()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.device.algorithm, SigningAlgorithm::Rs256);
        assert_eq!(config.device.token_ttl_minutes, 20);
        assert_eq!(config.device.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.camera.command, "raspistill");
        assert_eq!(config.camera.output_path, PathBuf::from("/run/still.jpg"));
        assert_eq!(config.camera.initial.brightness, 50);
        assert!(config.camera.initial.hflip);
        assert_eq!(config.camera.initial.contrast, 0);
        assert_eq!(config.metrics.port, 9100);
    }

    #[test]
    fn test_invalid_ranges() {
        let mut config = complete();
        config.device.token_ttl_minutes = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTokenTtl(0))));

        let mut config = complete();
        config.camera.initial.brightness = 120;
        assert!(matches!(config.validate(), Err(ConfigError::Camera(_))));

        let mut config = complete();
        config.device.private_key = PathBuf::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("device.private_key"))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            AgentConfig::from_file("/nonexistent/agent.toml"),
            Err(ConfigError::FileReadError(_))
        ));
    }
}
