//! Common test utilities for token validation tests
//!
//! Generates one RSA key pair per test binary and signs tokens with it.

#![allow(dead_code)]

use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use mcpguard_auth::{TokenValidator, VerificationKey};
use serde_json::json;

pub const ISSUER: &str = "mcp-simple-auth";
pub const AUDIENCE: &str = "mcp-server";
pub const KID: &str = "mcp-key-1";

/// PEM-encoded (private, public) key pair
pub struct TestKeys {
    pub private_pem: Vec<u8>,
    pub public_pem: String,
}

/// Shared key pair, generated on first use
pub fn keys() -> &'static TestKeys {
    static KEYS: OnceLock<TestKeys> = OnceLock::new();
    KEYS.get_or_init(|| {
        let (private_pem, public_pem) = generate_test_rsa_keypair();
        TestKeys {
            private_pem,
            public_pem: String::from_utf8(public_pem).expect("PEM is ASCII"),
        }
    })
}

/// A second, unrelated key pair for bad-signature tests
pub fn foreign_keys() -> &'static TestKeys {
    static KEYS: OnceLock<TestKeys> = OnceLock::new();
    KEYS.get_or_init(|| {
        let (private_pem, public_pem) = generate_test_rsa_keypair();
        TestKeys {
            private_pem,
            public_pem: String::from_utf8(public_pem).expect("PEM is ASCII"),
        }
    })
}

/// Generate a test RSA key pair (PEM format)
pub fn generate_test_rsa_keypair() -> (Vec<u8>, Vec<u8>) {
    use rsa::RsaPrivateKey;
    use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};

    let mut rng = rand::thread_rng();
    let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("Failed to generate RSA key");
    let public_key = private_key.to_public_key();

    let private_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .expect("Failed to encode private key")
        .as_bytes()
        .to_vec();
    let public_pem = public_key
        .to_public_key_pem(LineEnding::LF)
        .expect("Failed to encode public key")
        .into_bytes();

    (private_pem, public_pem)
}

/// Validator trusting [`keys`]
pub fn validator() -> TokenValidator {
    let key = VerificationKey::from_pem(&keys().public_pem, KID).expect("valid test key");
    TokenValidator::new(key, ISSUER, vec![AUDIENCE.to_string()])
}

/// Sign `claims` with the given private key
pub fn sign_with(claims: &serde_json::Value, private_pem: &[u8]) -> String {
    let key = EncodingKey::from_rsa_pem(private_pem).expect("Invalid RSA key");
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(KID.to_string());
    encode(&header, claims, &key).expect("Failed to encode test JWT")
}

/// Sign `claims` with the shared test key
pub fn sign(claims: &serde_json::Value) -> String {
    sign_with(claims, &keys().private_pem)
}

/// Get current Unix timestamp
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs()
}

/// Standard claims valid for an hour
pub fn valid_claims(sub: &str, scope: &str) -> serde_json::Value {
    let now = current_timestamp();
    json!({
        "sub": sub,
        "iss": ISSUER,
        "aud": AUDIENCE,
        "exp": now + 3600,
        "iat": now,
        "scope": scope,
    })
}

/// Bearer header value for a token
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
