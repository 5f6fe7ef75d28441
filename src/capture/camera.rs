//! Camera abstraction for still capture.
//!
//! This module provides a trait-based abstraction over the camera,
//! allowing the Pi's still-capture tool to be swapped for a mock in tests.

use super::{CameraConfig, CameraSettings, Capture};
use std::process::Command;
use thiserror::Error;

/// Errors that can occur during camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    /// Parameter out of range.
    #[error("invalid camera settings: {0}")]
    InvalidSettings(#[from] super::SettingsError),
    /// Capture command could not be started.
    #[error("failed to run capture command `{command}`: {source}")]
    Spawn {
        /// Program that was run.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Capture command exited unsuccessfully or wrote no image.
    #[error("failed to capture still: {0}")]
    CaptureFailed(String),
    /// Still could not be read back from disk.
    #[error("failed to read still from disk: {0}")]
    ReadFailed(#[from] std::io::Error),
}

/// Trait for camera implementations.
pub trait Camera {
    /// Applies new image parameters. Takes effect from the next capture.
    fn configure(&mut self, settings: &CameraSettings) -> Result<(), CameraError>;

    /// Captures a single JPEG still.
    fn capture(&mut self) -> Result<Capture, CameraError>;

    /// Returns the parameters currently applied.
    fn settings(&self) -> &CameraSettings;
}

/// Pi camera driven through the `raspistill` still-capture tool.
#[derive(Debug)]
pub struct RaspistillCamera {
    config: CameraConfig,
    settings: CameraSettings,
    sequence: u64,
}

impl RaspistillCamera {
    /// Creates a camera using the initial settings from `config`.
    pub fn new(config: CameraConfig) -> Result<Self, CameraError> {
        config.validate()?;
        let settings = config.initial;
        Ok(Self {
            config,
            settings,
            sequence: 0,
        })
    }

    /// Builds the argument list for one still.
    pub fn command_args(&self) -> Vec<String> {
        let mut args = vec![
            "-n".to_string(),
            "-t".to_string(),
            "1".to_string(),
            "-q".to_string(),
            self.config.quality.to_string(),
            "-o".to_string(),
            self.config.output_path.display().to_string(),
        ];

        if self.config.width > 0 && self.config.height > 0 {
            args.extend([
                "-w".to_string(),
                self.config.width.to_string(),
                "-h".to_string(),
                self.config.height.to_string(),
            ]);
        }

        if self.settings.hflip {
            args.push("-hf".to_string());
        }
        if self.settings.vflip {
            args.push("-vf".to_string());
        }
        args.extend([
            "-br".to_string(),
            self.settings.brightness.to_string(),
            "-sh".to_string(),
            self.settings.sharpness.to_string(),
            "-co".to_string(),
            self.settings.contrast.to_string(),
        ]);
        // ISO 0 is auto: leave it to the firmware.
        if self.settings.iso != 0 {
            args.extend(["-ISO".to_string(), self.settings.iso.to_string()]);
        }

        args
    }
}

impl Camera for RaspistillCamera {
    fn configure(&mut self, settings: &CameraSettings) -> Result<(), CameraError> {
        settings.validate()?;
        self.settings = *settings;
        tracing::debug!(?settings, "Camera settings updated");
        Ok(())
    }

    fn capture(&mut self) -> Result<Capture, CameraError> {
        let output = Command::new(&self.config.command)
            .args(self.command_args())
            .output()
            .map_err(|source| CameraError::Spawn {
                command: self.config.command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CameraError::CaptureFailed(format!(
                "{} exited with {}: {}",
                self.config.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let jpeg = std::fs::read(&self.config.output_path)?;
        self.sequence += 1;
        let capture = Capture::new(jpeg, self.sequence);
        if !capture.is_jpeg() {
            return Err(CameraError::CaptureFailed(format!(
                "{} is not a JPEG image",
                self.config.output_path.display()
            )));
        }

        Ok(capture)
    }

    fn settings(&self) -> &CameraSettings {
        &self.settings
    }
}

/// Mock camera for testing that produces a tiny synthetic JPEG.
#[derive(Debug, Default)]
pub struct MockCamera {
    settings: CameraSettings,
    sequence: u64,
    configure_calls: u64,
    fail_captures: bool,
}

impl MockCamera {
    /// Mock with default settings that captures successfully.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent capture fail.
    pub fn fail_captures(&mut self, fail: bool) {
        self.fail_captures = fail;
    }

    /// Number of stills taken so far.
    pub fn captures(&self) -> u64 {
        self.sequence
    }

    /// Number of times settings were applied.
    pub fn configure_calls(&self) -> u64 {
        self.configure_calls
    }
}

impl Camera for MockCamera {
    fn configure(&mut self, settings: &CameraSettings) -> Result<(), CameraError> {
        settings.validate()?;
        self.settings = *settings;
        self.configure_calls += 1;
        Ok(())
    }

    fn capture(&mut self) -> Result<Capture, CameraError> {
        if self.fail_captures {
            return Err(CameraError::CaptureFailed("mock failure".to_string()));
        }

        self.sequence += 1;
        // SOI, the sequence number as payload, EOI.
        let mut jpeg = vec![0xFF, 0xD8];
        jpeg.extend_from_slice(&self.sequence.to_be_bytes());
        jpeg.extend_from_slice(&[0xFF, 0xD9]);
        Ok(Capture::new(jpeg, self.sequence))
    }

    fn settings(&self) -> &CameraSettings {
        &self.settings
    }
}
