//! Device API transport.
//!
//! Two calls are used: fetching the device config and publishing a
//! telemetry event. Both are blocking and carry a bearer token minted by
//! the caller.

mod http;
mod mock;

pub use http::HttpDeviceApi;
pub use mock::MockDeviceApi;

use crate::remote::ConfigResponse;
use thiserror::Error;

/// Errors from the device API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Server answered with a status other than the one expected.
    #[error("device API returned HTTP {code}: {body}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// Response body, possibly empty.
        body: String,
    },
    /// Connection, TLS or timeout failure.
    #[error("device API request failed: {0}")]
    Transport(String),
    /// Response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(#[from] std::io::Error),
    /// Response or request body is not the expected JSON.
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result of a publish call. A non-200 status is an outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    /// HTTP status code.
    pub status: u16,
    /// Response body, possibly empty.
    pub body: String,
}

impl PublishOutcome {
    /// True for HTTP 200 only.
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Operations the agent needs from the device registry.
pub trait DeviceApi {
    /// Fetches the device config. Anything but HTTP 200 is an error.
    fn get_config(&self, bearer: &str, local_version: &str) -> Result<ConfigResponse, ApiError>;

    /// Publishes a base64 payload as a telemetry event.
    fn publish_event(&self, bearer: &str, binary_data: &str) -> Result<PublishOutcome, ApiError>;
}
