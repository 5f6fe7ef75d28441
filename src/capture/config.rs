//! Camera parameters and still-capture configuration.
//!
//! `CameraSettings` are the image parameters the remote device config is
//! allowed to change. `CameraConfig` is the local, file-backed part: which
//! capture command to run, where the still lands, and at what size.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Image parameters applied to the camera before each still.
///
/// Ranges follow the Pi camera firmware: brightness 0..=100,
/// sharpness and contrast -100..=100, ISO 0 (auto) or 100..=1600.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Mirror the image horizontally.
    pub hflip: bool,
    /// Flip the image vertically.
    pub vflip: bool,
    /// Brightness, 0..=100.
    pub brightness: i32,
    /// Sharpness, -100..=100.
    pub sharpness: i32,
    /// Contrast, -100..=100.
    pub contrast: i32,
    /// Sensor ISO; 0 lets the firmware choose.
    pub iso: i32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            hflip: false,
            vflip: false,
            brightness: 60,
            sharpness: 0,
            contrast: 0,
            iso: 0,
        }
    }
}

impl CameraSettings {
    /// Validates every parameter against the firmware ranges.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(0..=100).contains(&self.brightness) {
            return Err(SettingsError::Brightness(self.brightness));
        }
        if !(-100..=100).contains(&self.sharpness) {
            return Err(SettingsError::Sharpness(self.sharpness));
        }
        if !(-100..=100).contains(&self.contrast) {
            return Err(SettingsError::Contrast(self.contrast));
        }
        if self.iso != 0 && !(100..=1600).contains(&self.iso) {
            return Err(SettingsError::Iso(self.iso));
        }
        Ok(())
    }
}

/// Out-of-range camera parameter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// Brightness outside 0-100.
    #[error("brightness {0} out of range (0-100)")]
    Brightness(i32),
    /// Sharpness outside -100-100.
    #[error("sharpness {0} out of range (-100-100)")]
    Sharpness(i32),
    /// Contrast outside -100-100.
    #[error("contrast {0} out of range (-100-100)")]
    Contrast(i32),
    /// ISO neither 0 nor within 100-1600.
    #[error("iso {0} out of range (0 or 100-1600)")]
    Iso(i32),
    /// JPEG quality outside 1-100.
    #[error("jpeg quality {0} out of range (1-100)")]
    Quality(u8),
}

/// Local configuration for the still-capture command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Still-capture executable.
    pub command: String,
    /// File the still is written to before being read back.
    pub output_path: PathBuf,
    /// Image width in pixels; 0 keeps the sensor default.
    pub width: u32,
    /// Image height in pixels; 0 keeps the sensor default.
    pub height: u32,
    /// JPEG quality, 1..=100.
    pub quality: u8,
    /// Settings applied before the first remote config arrives.
    pub initial: CameraSettings,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            command: "raspistill".to_string(),
            output_path: PathBuf::from("/tmp/image.jpg"),
            width: 0,
            height: 0,
            quality: 85,
            initial: CameraSettings::default(),
        }
    }
}

impl CameraConfig {
    /// Validates the capture parameters.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(1..=100).contains(&self.quality) {
            return Err(SettingsError::Quality(self.quality));
        }
        self.initial.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_valid() {
        let settings = CameraSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.brightness, 60);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut settings = CameraSettings::default();
        settings.brightness = 101;
        assert_eq!(settings.validate(), Err(SettingsError::Brightness(101)));

        let mut settings = CameraSettings::default();
        settings.contrast = -101;
        assert_eq!(settings.validate(), Err(SettingsError::Contrast(-101)));

        let mut settings = CameraSettings::default();
        settings.iso = 50;
        assert_eq!(settings.validate(), Err(SettingsError::Iso(50)));
    }

    #[test]
    fn test_iso_auto_and_range() {
        let mut settings = CameraSettings::default();
        settings.iso = 0;
        assert!(settings.validate().is_ok());
        settings.iso = 800;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_camera_config_defaults() {
        let config = CameraConfig::default();
        assert_eq!(config.command, "raspistill");
        assert_eq!(config.output_path, PathBuf::from("/tmp/image.jpg"));
        assert!(config.validate().is_ok());
    }
}
