//! The registry's config response.

use super::{DeviceConfig, RemoteConfigError};
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize};

/// Version held by a device that has never received a config.
pub const INITIAL_VERSION: &str = "0";

/// Standard alphabet, padding optional. URL-safe input is mapped onto it
/// before decoding so both encodings are accepted.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Body of a successful `GET .../config` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigResponse {
    /// Opaque change-detection token.
    #[serde(deserialize_with = "opaque_version")]
    pub version: String,
    /// Base64-encoded JSON configuration.
    #[serde(rename = "binaryData", default)]
    pub binary_data: Option<String>,
}

impl ConfigResponse {
    /// Decodes the carried configuration. A missing payload means defaults.
    pub fn device_config(&self) -> Result<DeviceConfig, RemoteConfigError> {
        match &self.binary_data {
            Some(data) => decode_payload(data),
            None => Ok(DeviceConfig::default()),
        }
    }
}

/// Decodes a base64 `binaryData` blob into a validated [`DeviceConfig`].
pub fn decode_payload(binary_data: &str) -> Result<DeviceConfig, RemoteConfigError> {
    let normalized: String = binary_data
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    let bytes = PAYLOAD_ENGINE.decode(normalized)?;
    let json = String::from_utf8(bytes)?;
    DeviceConfig::from_json(&json)
}

/// Accepts the version as either a JSON string or a number.
fn opaque_version<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Version {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Version::deserialize(deserializer)? {
        Version::Text(text) => text,
        Version::Number(number) => number.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
    use std::time::Duration;

    #[test]
    fn test_parse_response() {
        let body = r#"{"version": "3", "cloudUpdateTime": "2018-01-01T00:00:00Z", "binaryData": "e30="}"#;
        let response: ConfigResponse = serde_json::from_str(body).unwrap();

        assert_eq!(response.version, "3");
        assert_eq!(response.device_config().unwrap(), DeviceConfig::default());
    }

    #[test]
    fn test_numeric_version() {
        let response: ConfigResponse = serde_json::from_str(r#"{"version": 12}"#).unwrap();
        assert_eq!(response.version, "12");
        assert_eq!(response.binary_data, None);
        assert_eq!(response.device_config().unwrap(), DeviceConfig::default());
    }

    #[test]
    fn test_decode_both_alphabets() {
        // '>' and '?' bytes encode to the characters that differ between alphabets.
        let json = r#"{"capture_interval": 15, "note": ">>>???"}"#;

        let standard = decode_payload(&STANDARD.encode(json)).unwrap();
        let url_safe = decode_payload(&URL_SAFE_NO_PAD.encode(json)).unwrap();

        assert_eq!(standard.capture_interval(), Duration::from_secs(15));
        assert_eq!(standard, url_safe);
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            decode_payload("!!!"),
            Err(RemoteConfigError::Base64(_))
        ));
        assert!(matches!(
            decode_payload(&STANDARD.encode([0xFFu8, 0xFE])),
            Err(RemoteConfigError::Utf8(_))
        ));
    }

    #[test]
    fn test_empty_payload_is_default() {
        assert_eq!(decode_payload("").unwrap(), DeviceConfig::default());
    }
}
