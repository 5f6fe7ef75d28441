//! Single capture and upload.

use crate::api::{ApiError, DeviceApi, PublishOutcome};
use crate::auth::{AuthError, TokenSigner};
use crate::capture::{Camera, CameraError};
use thiserror::Error;

/// Errors from a single capture and upload.
#[derive(Debug, Error)]
pub enum OneshotError {
    /// Still could not be taken.
    #[error(transparent)]
    Camera(#[from] CameraError),
    /// Upload token could not be signed.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// Upload did not reach the server.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Takes one still and publishes it.
///
/// A non-200 publish status is returned as an outcome for the caller to
/// report; only capture, signing and transport failures are errors.
pub fn capture_once<C: Camera, A: DeviceApi>(
    camera: &mut C,
    api: &A,
    signer: &TokenSigner,
) -> Result<PublishOutcome, OneshotError> {
    let capture = camera.capture()?;
    tracing::info!(bytes = capture.len(), "Still image captured.");

    let bearer = signer.bearer()?;
    let outcome = api.publish_event(&bearer, &capture.to_base64())?;
    tracing::info!(status = outcome.status, "POST complete");
    Ok(outcome)
}
