//! The polling loop itself.

use super::{PollState, WatchdogStats};
use crate::api::{ApiError, DeviceApi};
use crate::auth::{AuthError, TokenSigner};
use crate::capture::Camera;
use crate::metrics::{MetricsRegistry, MetricsSnapshot};
use crate::remote::ConfigResponse;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors that stop the loop.
#[derive(Debug, Error)]
pub enum WatchdogError {
    /// Config fetch failed or returned a non-200 status.
    #[error("config fetch failed: {0}")]
    ConfigFetch(#[source] ApiError),
    /// Config request token could not be signed.
    #[error("failed to sign config request: {0}")]
    Auth(#[from] AuthError),
}

/// What happened to a capture attempt. None of these stop the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureResult {
    /// Still uploaded and acknowledged with HTTP 200.
    Uploaded { bytes: usize },
    /// Upload answered with a non-200 status.
    Rejected { status: u16, body: String },
    /// Camera, signing or transport failure.
    Failed(String),
}

/// Result of one loop iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// A new config version was applied.
    pub config_applied: bool,
    /// Present if a capture was due this iteration.
    pub capture: Option<CaptureResult>,
    /// How long to sleep before the next iteration.
    pub sleep: Duration,
}

/// Polls device config and periodically captures and uploads stills.
///
/// Single-threaded: the only blocking points are the HTTP calls, the
/// capture command and the sleep between iterations.
pub struct Watchdog<C, A> {
    camera: C,
    api: A,
    signer: TokenSigner,
    state: PollState,
    stats: WatchdogStats,
    metrics: Option<MetricsRegistry>,
}

impl<C: Camera, A: DeviceApi> Watchdog<C, A> {
    /// Creates a loop whose capture clock starts at `started_at`.
    pub fn new(camera: C, api: A, signer: TokenSigner, started_at: Instant) -> Self {
        Self {
            camera,
            api,
            signer,
            state: PollState::new(started_at),
            stats: WatchdogStats::default(),
            metrics: None,
        }
    }

    /// Publishes loop totals to `registry` after every iteration.
    pub fn with_metrics(mut self, registry: MetricsRegistry) -> Self {
        self.metrics = Some(registry);
        self
    }

    /// Config version and capture clock.
    pub fn state(&self) -> &PollState {
        &self.state
    }

    /// Running totals since start.
    pub fn stats(&self) -> &WatchdogStats {
        &self.stats
    }

    /// The camera being driven.
    pub fn camera(&self) -> &C {
        &self.camera
    }

    /// The device API client.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Runs one iteration at time `now` without sleeping.
    ///
    /// Returns an error only when the config fetch fails; that error is
    /// meant to end the process.
    pub fn step(&mut self, now: Instant) -> Result<StepOutcome, WatchdogError> {
        let bearer = self.signer.bearer()?;
        let response = self
            .api
            .get_config(&bearer, self.state.version())
            .map_err(|e| {
                error!(error = %e, version = self.state.version(), "Error getting config");
                WatchdogError::ConfigFetch(e)
            })?;
        self.stats.config_fetches += 1;

        let config_applied = self.maybe_apply(response);

        let capture = if self.state.capture_due(now) {
            let result = self.capture_and_upload();
            // Measured from the iteration start, not from when the upload
            // returned.
            self.state.mark_captured(now);
            Some(result)
        } else {
            None
        };

        self.publish_metrics();

        Ok(StepOutcome {
            config_applied,
            capture,
            sleep: self.state.config().config_interval(),
        })
    }

    /// Loops until `shutdown` is set or a config fetch fails.
    ///
    /// The flag is checked between iterations; a sleep in progress is not
    /// interrupted.
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<(), WatchdogError> {
        info!(
            version = self.state.version(),
            capture_interval = ?self.state.config().capture_interval(),
            "Watchdog started"
        );

        while !shutdown.load(Ordering::Relaxed) {
            let outcome = self.step(Instant::now())?;
            std::thread::sleep(outcome.sleep);
        }

        info!(stats = ?self.stats, "Shutdown requested, watchdog stopped");
        Ok(())
    }

    fn maybe_apply(&mut self, response: ConfigResponse) -> bool {
        if !self.state.is_new_version(&response.version) {
            debug!(version = %response.version, "Config unchanged");
            return false;
        }

        let decoded = response
            .device_config()
            .map_err(|e| e.to_string())
            .and_then(|config| {
                self.camera
                    .configure(&config.camera_settings())
                    .map_err(|e| e.to_string())?;
                Ok(config)
            });

        match decoded {
            Ok(config) => {
                info!(
                    version = %response.version,
                    config = ?config,
                    "Configuration update"
                );
                self.state.apply(response.version, config);
                self.stats.config_updates += 1;
                true
            }
            Err(e) => {
                warn!(
                    version = %response.version,
                    error = %e,
                    "Rejected configuration update, keeping current config"
                );
                self.state.skip_version(response.version);
                self.stats.config_rejections += 1;
                false
            }
        }
    }

    fn capture_and_upload(&mut self) -> CaptureResult {
        let capture = match self.camera.capture() {
            Ok(capture) => capture,
            Err(e) => {
                warn!(error = %e, "Still capture failed");
                self.stats.capture_failures += 1;
                return CaptureResult::Failed(e.to_string());
            }
        };
        self.stats.captures += 1;
        self.stats.last_capture_bytes = capture.len();
        info!(bytes = capture.len(), sequence = capture.sequence(), "Still image captured.");

        let bearer = match self.signer.bearer() {
            Ok(bearer) => bearer,
            Err(e) => {
                warn!(error = %e, "Failed to sign upload request");
                self.stats.upload_failures += 1;
                return CaptureResult::Failed(e.to_string());
            }
        };

        match self.api.publish_event(&bearer, &capture.to_base64()) {
            Ok(outcome) if outcome.is_success() => {
                info!(status = outcome.status, "Upload complete");
                self.stats.uploads += 1;
                CaptureResult::Uploaded {
                    bytes: capture.len(),
                }
            }
            Ok(outcome) => {
                warn!(status = outcome.status, body = %outcome.body, "Upload rejected");
                self.stats.upload_failures += 1;
                CaptureResult::Rejected {
                    status: outcome.status,
                    body: outcome.body,
                }
            }
            Err(e) => {
                warn!(error = %e, "Upload failed");
                self.stats.upload_failures += 1;
                CaptureResult::Failed(e.to_string())
            }
        }
    }

    fn publish_metrics(&self) {
        if let Some(registry) = &self.metrics {
            registry.update(&MetricsSnapshot::from_watchdog(
                &self.stats,
                self.state.config(),
            ));
        }
    }
}
