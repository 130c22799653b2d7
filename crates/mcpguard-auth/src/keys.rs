//! Verification key material.
//!
//! The server validates tokens against exactly one RSA public key, loaded once
//! at startup. The same key is published as a single-entry JWK set.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, DecodingKey};
use rsa::RsaPublicKey;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::traits::PublicKeyParts;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::KeyError;

/// A single JSON Web Key (RFC 7517), RSA members only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type, always `RSA`
    pub kty: String,
    /// Public key use
    #[serde(rename = "use")]
    pub key_use: String,
    /// Key ID
    pub kid: String,
    /// Algorithm
    pub alg: String,
    /// Modulus, base64url without padding
    pub n: String,
    /// Exponent, base64url without padding
    pub e: String,
}

/// JWK set document served at `/.well-known/jwks.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    /// Keys
    pub keys: Vec<Jwk>,
}

/// RSA public key ready for signature verification
#[derive(Clone)]
pub struct VerificationKey {
    decoding_key: DecodingKey,
    jwk: Jwk,
}

impl std::fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationKey")
            .field("kid", &self.jwk.kid)
            .field("alg", &self.jwk.alg)
            .finish_non_exhaustive()
    }
}

impl VerificationKey {
    /// Parse a PEM-encoded RSA public key (SPKI `PUBLIC KEY` or PKCS#1
    /// `RSA PUBLIC KEY`).
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidKey`] if the PEM is not an RSA public key.
    pub fn from_pem(pem: &str, kid: impl Into<String>) -> Result<Self, KeyError> {
        let public_key = RsaPublicKey::from_public_key_pem(pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
            .map_err(|e| KeyError::InvalidKey(e.to_string()))?;

        let n = URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be());
        let e = URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be());

        let decoding_key = DecodingKey::from_rsa_components(&n, &e)
            .map_err(|e| KeyError::InvalidKey(e.to_string()))?;

        Ok(Self {
            decoding_key,
            jwk: Jwk {
                kty: "RSA".to_string(),
                key_use: "sig".to_string(),
                kid: kid.into(),
                alg: "RS256".to_string(),
                n,
                e,
            },
        })
    }

    /// Read and parse a PEM file.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Read`] if the file cannot be read, or
    /// [`KeyError::InvalidKey`] if it does not hold an RSA public key.
    pub fn from_pem_file(path: impl AsRef<Path>, kid: impl Into<String>) -> Result<Self, KeyError> {
        let path = path.as_ref();
        let pem = std::fs::read_to_string(path).map_err(|source| KeyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let key = Self::from_pem(&pem, kid)?;
        info!(path = %path.display(), kid = %key.jwk.kid, "Loaded token verification key");
        Ok(key)
    }

    /// Key for `jsonwebtoken::decode`
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    /// Signing algorithm this key verifies
    pub fn algorithm(&self) -> Algorithm {
        Algorithm::RS256
    }

    /// Single-entry JWK set
    pub fn jwk_set(&self) -> JwkSet {
        JwkSet {
            keys: vec![self.jwk.clone()],
        }
    }
}
