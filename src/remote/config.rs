//! The decoded device configuration.

use crate::capture::{CameraSettings, SettingsError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors while decoding or validating a configuration payload.
#[derive(Debug, Error)]
pub enum RemoteConfigError {
    /// `binaryData` is not base64.
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// Decoded bytes are not UTF-8.
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    /// Decoded text is not a JSON object of the expected shape.
    #[error("payload is not a valid configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// Interval is negative, non-finite, too large, or a zero poll interval.
    #[error("{field} is not a usable number of seconds (got {value})")]
    InvalidInterval {
        /// Offending field.
        field: &'static str,
        /// Value as received.
        value: f64,
    },
    /// Camera parameter out of range.
    #[error(transparent)]
    Camera(#[from] SettingsError),
}

/// Converts validated seconds to a `Duration`, saturating at the ends of
/// its range.
fn saturating_secs(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(if secs > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}

/// Accepts positive seconds that fit in a `Duration`; `allow_zero` also
/// admits 0.
fn check_interval(
    field: &'static str,
    value: f64,
    allow_zero: bool,
) -> Result<(), RemoteConfigError> {
    let in_range = value > 0.0 || (allow_zero && value == 0.0);
    if !in_range || Duration::try_from_secs_f64(value).is_err() {
        return Err(RemoteConfigError::InvalidInterval { field, value });
    }
    Ok(())
}

fn default_config_interval() -> f64 {
    1.0
}

fn default_capture_interval() -> f64 {
    60.0
}

fn default_brightness() -> i32 {
    60
}

/// Intervals and camera parameters pushed by the registry.
///
/// A new config replaces the previous one wholesale. Any field missing
/// from the payload takes its default, not its previous value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Seconds to sleep between config polls.
    #[serde(default = "default_config_interval")]
    pub config_interval: f64,
    /// Minimum seconds between stills.
    #[serde(default = "default_capture_interval")]
    pub capture_interval: f64,
    /// Mirror horizontally.
    #[serde(default)]
    pub camera_hflip: bool,
    /// Flip vertically.
    #[serde(default)]
    pub camera_vflip: bool,
    /// 0-100.
    #[serde(default = "default_brightness")]
    pub camera_brightness: i32,
    /// -100-100.
    #[serde(default)]
    pub camera_sharpness: i32,
    /// -100-100.
    #[serde(default)]
    pub camera_contrast: i32,
    /// 0 for auto, otherwise 100-1600.
    #[serde(default)]
    pub camera_iso: i32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            config_interval: default_config_interval(),
            capture_interval: default_capture_interval(),
            camera_hflip: false,
            camera_vflip: false,
            camera_brightness: default_brightness(),
            camera_sharpness: 0,
            camera_contrast: 0,
            camera_iso: 0,
        }
    }
}

impl DeviceConfig {
    /// Parses a JSON document; an empty or blank document yields defaults.
    pub fn from_json(json: &str) -> Result<Self, RemoteConfigError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: DeviceConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks intervals and camera ranges.
    ///
    /// `config_interval` must be strictly positive so the loop never spins
    /// against the API; `capture_interval` may be zero.
    pub fn validate(&self) -> Result<(), RemoteConfigError> {
        check_interval("config_interval", self.config_interval, false)?;
        check_interval("capture_interval", self.capture_interval, true)?;
        self.camera_settings().validate()?;
        Ok(())
    }

    /// Camera parameters carried by this config.
    pub fn camera_settings(&self) -> CameraSettings {
        CameraSettings {
            hflip: self.camera_hflip,
            vflip: self.camera_vflip,
            brightness: self.camera_brightness,
            sharpness: self.camera_sharpness,
            contrast: self.camera_contrast,
            iso: self.camera_iso,
        }
    }

    /// Sleep between polls. Exact for any config that passed
    /// [`DeviceConfig::validate`].
    pub fn config_interval(&self) -> Duration {
        saturating_secs(self.config_interval)
    }

    /// Minimum time between stills.
    pub fn capture_interval(&self) -> Duration {
        saturating_secs(self.capture_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_defaults() {
        let config = DeviceConfig::default();
        assert_eq!(config.config_interval(), Duration::from_secs(1));
        assert_eq!(config.capture_interval(), Duration::from_secs(60));
        assert_eq!(config.camera_settings(), CameraSettings::default());
    }

    #[test]
    fn test_full_document() {
        let json = r#"{
            "config_interval": 5,
            "capture_interval": 30.5,
            "camera_hflip": true,
            "camera_vflip": true,
            "camera_brightness": 55,
            "camera_sharpness": 10,
            "camera_contrast": -20,
            "camera_iso": 400
        }"#;
        let config = DeviceConfig::from_json(json).unwrap();

        assert_eq!(config.config_interval(), Duration::from_secs(5));
        assert_eq!(config.capture_interval(), Duration::from_millis(30_500));
        assert_eq!(
            config.camera_settings(),
            CameraSettings {
                hflip: true,
                vflip: true,
                brightness: 55,
                sharpness: 10,
                contrast: -20,
                iso: 400,
            }
        );
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let config = DeviceConfig::from_json(r#"{"capture_interval": 10, "extra": 1}"#).unwrap();

        assert_eq!(config.capture_interval(), Duration::from_secs(10));
        assert_eq!(config.config_interval(), Duration::from_secs(1));
        assert_eq!(config.camera_brightness, 60);
        assert!(!config.camera_hflip);
    }

    #[test]
    fn test_blank_document_is_default() {
        assert_eq!(DeviceConfig::from_json("  ").unwrap(), DeviceConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            DeviceConfig::from_json(r#"{"config_interval": 0}"#),
            Err(RemoteConfigError::InvalidInterval { field: "config_interval", .. })
        ));
        assert!(matches!(
            DeviceConfig::from_json(r#"{"capture_interval": -1}"#),
            Err(RemoteConfigError::InvalidInterval { field: "capture_interval", .. })
        ));
        assert!(matches!(
            DeviceConfig::from_json(r#"{"camera_brightness": 300}"#),
            Err(RemoteConfigError::Camera(SettingsError::Brightness(300)))
        ));
        assert!(matches!(
            DeviceConfig::from_json("not json"),
            Err(RemoteConfigError::Json(_))
        ));
    }

    #[test]
    fn test_intervals_beyond_duration_rejected() {
        assert!(matches!(
            DeviceConfig::from_json(r#"{"config_interval": 1e20}"#),
            Err(RemoteConfigError::InvalidInterval { field: "config_interval", .. })
        ));
        assert!(matches!(
            DeviceConfig::from_json(r#"{"config_interval": 5, "capture_interval": 1e300}"#),
            Err(RemoteConfigError::InvalidInterval { field: "capture_interval", .. })
        ));
    }

    #[test]
    fn test_unvalidated_intervals_saturate() {
        let config = DeviceConfig {
            config_interval: 1e20,
            capture_interval: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(config.config_interval(), Duration::MAX);
        assert_eq!(config.capture_interval(), Duration::ZERO);
    }

    proptest! {
        #[test]
        fn prop_valid_documents_round_trip_values(
            config_interval in 1u32..3600,
            capture_interval in 0u32..86_400,
            brightness in 0i32..=100,
            contrast in -100i32..=100,
            hflip in any::<bool>(),
        ) {
            let json = format!(
                r#"{{"config_interval": {config_interval}, "capture_interval": {capture_interval},
                    "camera_brightness": {brightness}, "camera_contrast": {contrast},
                    "camera_hflip": {hflip}}}"#
            );
            let config = DeviceConfig::from_json(&json).unwrap();

            prop_assert_eq!(config.config_interval(), Duration::from_secs(config_interval.into()));
            prop_assert_eq!(config.capture_interval(), Duration::from_secs(capture_interval.into()));
            prop_assert_eq!(config.camera_brightness, brightness);
            prop_assert_eq!(config.camera_contrast, contrast);
            prop_assert_eq!(config.camera_hflip, hflip);
            prop_assert_eq!(config.camera_sharpness, 0);
        }
    }
}
