//! JWT bearer tokens for the device API.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Default token lifetime.
pub const DEFAULT_TOKEN_TTL_MINUTES: u32 = 60;

/// Errors that can occur while loading keys or minting tokens.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Key file could not be read.
    #[error("failed to read private key {path}: {source}")]
    KeyRead {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// PEM does not hold a key for the chosen algorithm.
    #[error("invalid {algorithm} private key: {source}")]
    InvalidKey {
        /// Algorithm the key was parsed for.
        algorithm: SigningAlgorithm,
        /// Parser error.
        #[source]
        source: jsonwebtoken::errors::Error,
    },
    /// Algorithm name other than ES256 or RS256.
    #[error("unsupported signing algorithm `{0}` (expected ES256 or RS256)")]
    UnsupportedAlgorithm(String),
    /// Zero token lifetime.
    #[error("token lifetime must be positive")]
    InvalidTtl,
    /// Signing itself failed.
    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Algorithms accepted by the device registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    /// ECDSA P-256 with SHA-256.
    #[serde(rename = "ES256")]
    Es256,
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    #[serde(rename = "RS256")]
    Rs256,
}

impl Default for SigningAlgorithm {
    fn default() -> Self {
        Self::Es256
    }
}

impl SigningAlgorithm {
    fn jwt_algorithm(self) -> Algorithm {
        match self {
            Self::Es256 => Algorithm::ES256,
            Self::Rs256 => Algorithm::RS256,
        }
    }

    fn encoding_key(self, pem: &[u8]) -> Result<EncodingKey, AuthError> {
        let key = match self {
            Self::Es256 => EncodingKey::from_ec_pem(pem),
            Self::Rs256 => EncodingKey::from_rsa_pem(pem),
        };
        key.map_err(|source| AuthError::InvalidKey {
            algorithm: self,
            source,
        })
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Es256 => f.write_str("ES256"),
            Self::Rs256 => f.write_str("RS256"),
        }
    }
}

impl FromStr for SigningAlgorithm {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ES256" => Ok(Self::Es256),
            "RS256" => Ok(Self::Rs256),
            _ => Err(AuthError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

/// Registered claims the device registry checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issued at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
    /// Audience: the cloud project id.
    pub aud: String,
}

/// Mints bearer tokens from a device private key.
///
/// The key is parsed once; each call to [`TokenSigner::bearer`] signs a
/// new token with `iat` set to the current time.
pub struct TokenSigner {
    key: EncodingKey,
    /// Algorithm the key was parsed for.
    algorithm: SigningAlgorithm,
    audience: String,
    ttl: Duration,
}

impl TokenSigner {
    /// Creates a signer from PEM-encoded key material.
    pub fn from_pem(
        pem: &[u8],
        // Algorithm the key was parsed for.
        algorithm: SigningAlgorithm,
        audience: impl Into<String>,
        ttl_minutes: u32,
    ) -> Result<Self, AuthError> {
        if ttl_minutes == 0 {
            return Err(AuthError::InvalidTtl);
        }
        Ok(Self {
            key: algorithm.encoding_key(pem)?,
            algorithm,
            audience: audience.into(),
            ttl: Duration::minutes(i64::from(ttl_minutes)),
        })
    }

    /// Creates a signer from a PEM key file.
    pub fn from_pem_file(
        path: impl AsRef<Path>,
        // Algorithm the key was parsed for.
        algorithm: SigningAlgorithm,
        audience: impl Into<String>,
        ttl_minutes: u32,
    ) -> Result<Self, AuthError> {
        let path = path.as_ref();
        let pem = std::fs::read(path).map_err(|source| AuthError::KeyRead {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(
            algorithm = %algorithm,
            key = %path.display(),
            "Loaded device private key"
        );
        Self::from_pem(&pem, algorithm, audience, ttl_minutes)
    }

    /// Builds the claims for a token issued at `now`.
    pub fn claims_at(&self, now: DateTime<Utc>) -> Claims {
        Claims {
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            aud: self.audience.clone(),
        }
    }

    /// Signs a token issued at `now`.
    pub fn sign_at(&self, now: DateTime<Utc>) -> Result<String, AuthError> {
        let header = Header::new(self.algorithm.jwt_algorithm());
        Ok(encode(&header, &self.claims_at(now), &self.key)?)
    }

    /// Signs a fresh token.
    pub fn sign(&self) -> Result<String, AuthError> {
        self.sign_at(Utc::now())
    }

    /// Returns an `Authorization` header value with a fresh token.
    pub fn bearer(&self) -> Result<String, AuthError> {
        Ok(format!("Bearer {}", self.sign()?))
    }
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("algorithm", &self.algorithm)
            .field("audience", &self.audience)
            .field("ttl_minutes", &self.ttl.num_minutes())
            .finish_non_exhaustive()
    }
}
