//! Authentication error types.
//!
//! The `Display` output of [`AuthError`] and [`OriginError`] is exactly what
//! goes back to the caller. [`TokenRejection`] is the internal reason a token
//! failed and is only ever logged.

use thiserror::Error;

/// Authentication failure at the transport boundary (HTTP 401)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization` header on the request
    #[error("Authorization header missing")]
    MissingHeader,

    /// Header present but not `Bearer <token>`
    #[error("Invalid Authorization header format")]
    MalformedHeader,

    /// Token failed one of the validation checks
    #[error("Invalid token")]
    InvalidToken(TokenRejection),
}

/// Why a bearer token was rejected. Never sent to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenRejection {
    /// Not a decodable JWT
    #[error("malformed token: {0}")]
    Malformed(String),

    /// Header names an algorithm outside the allowlist
    #[error("algorithm {0} not allowed")]
    Algorithm(String),

    /// Signature does not verify against the configured key
    #[error("signature verification failed")]
    Signature,

    /// `exp` is in the past (beyond leeway)
    #[error("token expired")]
    Expired,

    /// `nbf` is in the future (beyond leeway)
    #[error("token not yet valid")]
    NotYetValid,

    /// `iss` does not match the expected issuer
    #[error("issuer mismatch")]
    Issuer,

    /// `aud` does not contain an accepted audience
    #[error("audience mismatch")]
    Audience,

    /// `azp` does not match the expected authorized party
    #[error("authorized party mismatch")]
    AuthorizedParty,

    /// A required claim is missing
    #[error("missing required claim: {0}")]
    MissingClaim(String),
}

/// Origin guard denial (HTTP 403)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OriginError {
    /// Origin header required but absent
    #[error("Origin header is required")]
    Missing,

    /// Origin present but not on the allowlist
    #[error("Origin '{0}' is not allowed. Only localhost and 127.0.0.1 are permitted.")]
    NotAllowed(String),
}

/// Failure loading verification key material at startup
#[derive(Error, Debug)]
pub enum KeyError {
    /// Key file could not be read
    #[error("Failed to read public key {path}: {source}")]
    Read {
        /// Path that was read
        path: std::path::PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// PEM did not contain an RSA public key
    #[error("Invalid RSA public key: {0}")]
    InvalidKey(String),
}
