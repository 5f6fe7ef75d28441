//! Device credentials.
//!
//! Every request to the device API carries a short-lived JWT signed with
//! the device's private key. Tokens are never cached: a fresh one is
//! minted per request.

mod token;

pub use token::{AuthError, Claims, SigningAlgorithm, TokenSigner, DEFAULT_TOKEN_TTL_MINUTES};
