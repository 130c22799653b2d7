//! Common test utilities for HTTP transport tests
//!
//! Builds the real router around a generated RSA key and drives it with
//! `tower::ServiceExt::oneshot`, no sockets involved.

#![allow(dead_code)]

use std::sync::{Arc, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use mcpguard_auth::VerificationKey;
use mcpguard_server::{AppState, MCP_PATH, ServerConfig, router};
use serde_json::{Value, json};
use tower::ServiceExt;

pub const ISSUER: &str = "mcp-simple-auth";
pub const AUDIENCE: &str = "mcp-server";
pub const KID: &str = "mcp-key-1";
pub const ORIGIN: &str = "http://localhost:3000";

/// PEM-encoded (private, public) key pair
pub struct TestKeys {
    pub private_pem: Vec<u8>,
    pub public_pem: String,
}

/// Shared key pair, generated on first use
pub fn keys() -> &'static TestKeys {
    static KEYS: OnceLock<TestKeys> = OnceLock::new();
    KEYS.get_or_init(generate_keys)
}

/// A second, unrelated key pair for bad-signature tests
pub fn foreign_keys() -> &'static TestKeys {
    static KEYS: OnceLock<TestKeys> = OnceLock::new();
    KEYS.get_or_init(generate_keys)
}

fn generate_keys() -> TestKeys {
    use rsa::RsaPrivateKey;
    use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};

    let mut rng = rand::thread_rng();
    let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("Failed to generate RSA key");
    let public_key = private_key.to_public_key();

    TestKeys {
        private_pem: private_key
            .to_pkcs8_pem(LineEnding::LF)
            .expect("Failed to encode private key")
            .as_bytes()
            .to_vec(),
        public_pem: public_key
            .to_public_key_pem(LineEnding::LF)
            .expect("Failed to encode public key"),
    }
}

/// Router with default configuration
pub fn app() -> Router {
    app_with(ServerConfig::default())
}

/// Router with a custom configuration
pub fn app_with(config: ServerConfig) -> Router {
    let key = VerificationKey::from_pem(&keys().public_pem, KID).expect("valid test key");
    let state = AppState::with_key(&config, key).expect("valid test state");
    router(Arc::new(state))
}

/// Get current Unix timestamp
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs()
}

/// Standard claims valid for an hour
pub fn valid_claims(scope: &str) -> Value {
    let now = current_timestamp();
    json!({
        "sub": "user-123",
        "preferred_username": "alice",
        "iss": ISSUER,
        "aud": AUDIENCE,
        "exp": now + 3600,
        "iat": now,
        "scope": scope,
    })
}

/// Sign `claims` with the given private key
pub fn sign_with(claims: &Value, private_pem: &[u8]) -> String {
    let key = EncodingKey::from_rsa_pem(private_pem).expect("Invalid RSA key");
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(KID.to_string());
    encode(&header, claims, &key).expect("Failed to encode test JWT")
}

/// Token carrying `scope`, signed with the trusted key
pub fn token(scope: &str) -> String {
    sign_with(&valid_claims(scope), &keys().private_pem)
}

/// Token holding every scope
pub fn full_token() -> String {
    token("mcp:read mcp:tools mcp:prompts")
}

/// POST /mcp with optional bearer token and Origin
pub fn post_mcp(body: impl Into<Body>, token: Option<&str>, origin: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(MCP_PATH).header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    if let Some(origin) = origin {
        builder = builder.header(header::ORIGIN, origin);
    }
    builder.body(body.into()).expect("valid request")
}

/// JSON-RPC request body
pub fn rpc(id: Value, method: &str, params: Value) -> String {
    json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }).to_string()
}

/// Response parts with the body parsed as JSON (`Value::Null` when empty)
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub raw: Vec<u8>,
}

/// Send one request through a fresh router
pub async fn send(app: Router, request: Request<Body>) -> TestResponse {
    let response = app.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let raw = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body")
        .to_vec();
    let body = if raw.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&raw).unwrap_or(Value::Null)
    };
    TestResponse {
        status,
        headers,
        body,
        raw,
    }
}

/// Authenticated JSON-RPC call from an allowed origin
pub async fn call(scope: &str, id: Value, method: &str, params: Value) -> TestResponse {
    let token = token(scope);
    send(
        app(),
        post_mcp(rpc(id, method, params), Some(&token), Some(ORIGIN)),
    )
    .await
}
