//! HTTP transport
//!
//! Routes:
//!
//! | Route                                      | Origin guard | Auth |
//! |--------------------------------------------|--------------|------|
//! | `POST /mcp`                                | yes          | yes  |
//! | `GET /mcp` (always 405)                    | yes          | no   |
//! | `GET /health`                              | no           | no   |
//! | `GET /.well-known/jwks.json`               | no           | no   |
//! | `GET /.well-known/oauth-protected-resource`| no           | no   |
//! | `GET /.well-known/oauth-authorization-server` | no        | no   |
//!
//! The origin guard runs as route middleware, so it answers before the
//! bearer token is looked at. Authentication is an extractor on the POST
//! handler and runs before the body is parsed.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, FromRequestParts, Request, State},
    http::{StatusCode, header, request::Parts},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use mcpguard_auth::metadata::{AUTHORIZATION_SERVER_PATH, JWKS_PATH, PROTECTED_RESOURCE_PATH};
use mcpguard_auth::{
    AuthError, MetadataPublisher, OriginPolicy, Principal, TokenValidator, VerificationKey,
};
use mcpguard_core::{JsonRpcRequest, JsonRpcResponse};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::dispatcher::Dispatcher;
use crate::error::{ServerError, ServerResult};
use crate::operations::default_registry;

/// JSON-RPC endpoint path
pub const MCP_PATH: &str = "/mcp";
/// Health check path
pub const HEALTH_PATH: &str = "/health";

/// Shared, read-only application state
#[derive(Debug)]
pub struct AppState {
    /// Bearer token validator
    pub validator: TokenValidator,
    /// Origin guard policy
    pub origin_policy: OriginPolicy,
    /// JSON-RPC dispatcher
    pub dispatcher: Dispatcher,
    /// Discovery documents
    pub metadata: MetadataPublisher,
    /// Largest accepted request body in bytes
    pub max_body_bytes: usize,
}

impl AppState {
    /// Build the state from configuration, loading the verification key from disk.
    ///
    /// # Errors
    ///
    /// Fails if the key cannot be read, a URL is invalid, or the registry
    /// cannot be built.
    pub fn from_config(config: &ServerConfig) -> ServerResult<Self> {
        let key = VerificationKey::from_pem_file(&config.auth.public_key_path, &config.auth.key_id)?;
        Self::with_key(config, key)
    }

    /// Build the state around an already loaded key
    ///
    /// # Errors
    ///
    /// Fails if a URL is invalid or the registry cannot be built.
    pub fn with_key(config: &ServerConfig, key: VerificationKey) -> ServerResult<Self> {
        let auth = &config.auth;
        let metadata = MetadataPublisher::new(
            &config.base_url,
            &auth.issuer,
            auth.authorization_server.as_deref(),
            auth.scopes_supported.clone(),
            &key,
        )?
        .with_issuer_endpoints(
            auth.authorization_endpoint.as_deref(),
            auth.token_endpoint.as_deref(),
        )?;

        let mut validator = TokenValidator::new(key, &auth.issuer, auth.audiences.clone())
            .with_clock_skew(Duration::from_secs(auth.leeway_secs));
        if let Some(party) = &auth.authorized_party {
            validator = validator.with_authorized_party(party);
        }

        Ok(Self {
            validator,
            origin_policy: config.origin.clone(),
            dispatcher: Dispatcher::new(default_registry()?),
            metadata,
            max_body_bytes: config.max_body_bytes,
        })
    }
}

/// Build the axum router
pub fn router(state: Arc<AppState>) -> Router {
    let max_body_bytes = state.max_body_bytes;

    let mcp = Router::new()
        .route(MCP_PATH, post(handle_mcp_post).get(handle_mcp_get))
        .route_layer(middleware::from_fn_with_state(state.clone(), origin_guard));

    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(JWKS_PATH, get(jwks))
        .route(PROTECTED_RESOURCE_PATH, get(protected_resource_metadata))
        .route(AUTHORIZATION_SERVER_PATH, get(authorization_server_metadata))
        .merge(mcp)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C or SIGTERM
///
/// # Errors
///
/// Fails if the address cannot be bound or the server loop errors.
pub async fn serve(state: Arc<AppState>, bind_address: &str) -> ServerResult<()> {
    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(|source| ServerError::Bind {
            address: bind_address.to_string(),
            source,
        })?;

    info!(
        address = %listener.local_addr()?,
        base_url = %state.metadata.base_url(),
        issuer = %state.validator.expected_issuer(),
        "MCP server listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("MCP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl+C received, initiating shutdown"),
            Err(e) => {
                warn!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("SIGTERM received, initiating shutdown");
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

/// Authentication failure with `WWW-Authenticate` challenge
#[derive(Debug)]
struct AuthRejection {
    www_authenticate: String,
    body: Value,
}

impl AuthRejection {
    fn new(error: &AuthError, metadata: &MetadataPublisher) -> Self {
        Self {
            www_authenticate: metadata.www_authenticate(error),
            body: json!({ "detail": error.to_string() }),
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let mut resp = (StatusCode::UNAUTHORIZED, Json(self.body)).into_response();

        if let Ok(value) = header::HeaderValue::from_str(&self.www_authenticate) {
            resp.headers_mut().insert(header::WWW_AUTHENTICATE, value);
        }

        resp
    }
}

/// Caller authenticated from the `Authorization` header
#[derive(Debug, Clone)]
struct Authenticated(Principal);

impl FromRequestParts<Arc<AppState>> for Authenticated {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        // A header that is not visible ASCII can never be `Bearer <token>`
        let authorization = parts
            .headers
            .get(header::AUTHORIZATION)
            .map(|value| value.to_str().unwrap_or_default());

        state
            .validator
            .validate(authorization)
            .map(Authenticated)
            .map_err(|e| AuthRejection::new(&e, &state.metadata))
    }
}

async fn origin_guard(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .map(|value| value.to_str().unwrap_or_default());

    if let Err(err) = state.origin_policy.validate(origin) {
        warn!(error = %err, path = %request.uri().path(), "Origin rejected");
        return (StatusCode::FORBIDDEN, Json(json!({ "detail": err.to_string() }))).into_response();
    }

    next.run(request).await
}

async fn handle_mcp_post(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
    body: Bytes,
) -> Response {
    let request = match JsonRpcRequest::parse(&body) {
        Ok(request) => request,
        Err(rejected) => {
            debug!(error = %rejected.error, "Unusable JSON-RPC envelope");
            return Json(JsonRpcResponse::from(rejected)).into_response();
        }
    };

    match state.dispatcher.dispatch(&principal, request).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn handle_mcp_get() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "detail": "Method Not Allowed - This server does not support server-initiated streaming"
        })),
    )
        .into_response()
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let metadata = &state.metadata;
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "jwt_enabled": true,
        "jwks_available": !metadata.jwks().keys.is_empty(),
        "auth_required": true,
        "scope_based_auth": true,
        "oauth_metadata": {
            "protected_resource": metadata.url_for(PROTECTED_RESOURCE_PATH),
            "authorization_server": metadata.url_for(AUTHORIZATION_SERVER_PATH),
            "jwks": metadata.url_for(JWKS_PATH),
        },
    }))
}

async fn jwks(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.metadata.jwks().clone())
}

async fn protected_resource_metadata(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.metadata.protected_resource().clone())
}

async fn authorization_server_metadata(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.metadata.authorization_server().clone())
}
