//! Discovery documents and the `WWW-Authenticate` challenge
//!
//! - Protected Resource Metadata (RFC 9728) at
//!   `/.well-known/oauth-protected-resource`
//! - Authorization Server Metadata (RFC 8414) at
//!   `/.well-known/oauth-authorization-server`
//! - the JWK set at `/.well-known/jwks.json`
//!
//! The documents are static: they are computed once from configuration and
//! served as-is. This server never issues tokens; the authorization server
//! document only points clients at the issuer, and lists its authorization
//! and token endpoints only when they are configured.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::AuthError;
use crate::keys::{JwkSet, VerificationKey};

/// MCP protocol revision advertised in discovery documents
pub const MCP_PROTOCOL_VERSION: &str = "2025-06-18";

/// Path of the protected resource metadata document
pub const PROTECTED_RESOURCE_PATH: &str = "/.well-known/oauth-protected-resource";
/// Path of the authorization server metadata document
pub const AUTHORIZATION_SERVER_PATH: &str = "/.well-known/oauth-authorization-server";
/// Path of the JWK set
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// RFC 9728 Protected Resource Metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedResourceMetadata {
    /// Resource identifier
    pub resource: String,
    /// Authorization servers able to issue tokens for this resource
    pub authorization_servers: Vec<String>,
    /// Scopes this resource understands
    pub scopes_supported: Vec<String>,
    /// How bearer tokens may be presented
    pub bearer_methods_supported: Vec<String>,
    /// Human-readable documentation
    pub resource_documentation: String,
    /// MCP protocol revision
    pub mcp_protocol_version: String,
    /// Resource type tag
    pub resource_type: String,
}

/// RFC 8414 Authorization Server Metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationServerMetadata {
    /// Issuer identifier, matches the `iss` claim of accepted tokens
    pub issuer: String,
    /// Authorization endpoint of the external issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_endpoint: Option<String>,
    /// Token endpoint of the external issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,
    /// JWK set location
    pub jwks_uri: String,
    /// Scopes the issuer can grant
    pub scopes_supported: Vec<String>,
    /// Supported response types
    pub response_types_supported: Vec<String>,
    /// Supported grant types
    pub grant_types_supported: Vec<String>,
    /// Supported client authentication methods
    pub token_endpoint_auth_methods_supported: Vec<String>,
    /// RFC 8707 resource indicators
    pub resource_indicators_supported: bool,
}

/// Builds and holds the discovery documents
#[derive(Debug, Clone)]
pub struct MetadataPublisher {
    base_url: String,
    protected_resource: ProtectedResourceMetadata,
    authorization_server: AuthorizationServerMetadata,
    jwks: JwkSet,
}

impl MetadataPublisher {
    /// Build the documents.
    ///
    /// `base_url` is the externally visible URL of this server; it is also the
    /// resource identifier. When `authorization_server` is `None` the server
    /// advertises itself.
    ///
    /// # Errors
    ///
    /// Returns a parse error if either URL is not absolute.
    pub fn new(
        base_url: &str,
        issuer: &str,
        authorization_server: Option<&str>,
        scopes_supported: Vec<String>,
        key: &VerificationKey,
    ) -> Result<Self, url::ParseError> {
        let base_url = normalize(base_url)?;
        let authorization_server = match authorization_server {
            Some(server) => normalize(server)?,
            None => base_url.clone(),
        };

        let protected_resource = ProtectedResourceMetadata {
            resource: base_url.clone(),
            authorization_servers: vec![authorization_server],
            scopes_supported: scopes_supported.clone(),
            bearer_methods_supported: vec!["header".to_string()],
            resource_documentation: format!("{base_url}/docs"),
            mcp_protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            resource_type: "mcp-server".to_string(),
        };

        let authorization_server = AuthorizationServerMetadata {
            issuer: issuer.to_string(),
            authorization_endpoint: None,
            token_endpoint: None,
            jwks_uri: format!("{base_url}{JWKS_PATH}"),
            scopes_supported,
            response_types_supported: vec!["token".to_string()],
            grant_types_supported: vec!["password".to_string()],
            token_endpoint_auth_methods_supported: vec!["none".to_string()],
            resource_indicators_supported: true,
        };

        Ok(Self {
            base_url,
            protected_resource,
            authorization_server,
            jwks: key.jwk_set(),
        })
    }

    /// Advertise the issuer's authorization and token endpoints
    ///
    /// # Errors
    ///
    /// Returns a parse error if a given endpoint is not an absolute URL.
    pub fn with_issuer_endpoints(
        mut self,
        authorization_endpoint: Option<&str>,
        token_endpoint: Option<&str>,
    ) -> Result<Self, url::ParseError> {
        self.authorization_server.authorization_endpoint =
            authorization_endpoint.map(normalize).transpose()?;
        self.authorization_server.token_endpoint = token_endpoint.map(normalize).transpose()?;
        Ok(self)
    }

    /// Externally visible base URL, without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of a path on this server
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Protected resource metadata
    pub fn protected_resource(&self) -> &ProtectedResourceMetadata {
        &self.protected_resource
    }

    /// Authorization server metadata
    pub fn authorization_server(&self) -> &AuthorizationServerMetadata {
        &self.authorization_server
    }

    /// JWK set
    pub fn jwks(&self) -> &JwkSet {
        &self.jwks
    }

    /// `WWW-Authenticate` challenge for a 401 response.
    ///
    /// A request that carried no credentials gets no error code (RFC 6750 §3.1).
    pub fn www_authenticate(&self, failure: &AuthError) -> String {
        let builder = WwwAuthenticateBuilder::new(self.url_for(PROTECTED_RESOURCE_PATH))
            .with_realm("mcp-server");
        match failure {
            AuthError::MissingHeader => builder,
            AuthError::MalformedHeader => builder.with_error("invalid_request"),
            AuthError::InvalidToken(_) => builder.with_error("invalid_token"),
        }
        .build()
    }
}

fn normalize(raw: &str) -> Result<String, url::ParseError> {
    let url = Url::parse(raw)?;
    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// WWW-Authenticate header builder for 401 Unauthorized responses (RFC 9728 §5.1)
#[derive(Debug, Clone)]
pub struct WwwAuthenticateBuilder {
    metadata_uri: String,
    realm: Option<String>,
    error: Option<String>,
}

impl WwwAuthenticateBuilder {
    /// Create a builder pointing at the resource metadata document
    pub fn new(metadata_uri: impl Into<String>) -> Self {
        Self {
            metadata_uri: metadata_uri.into(),
            realm: None,
            error: None,
        }
    }

    /// Set the protection realm
    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = Some(realm.into());
        self
    }

    /// Set an RFC 6750 error code such as `invalid_token`
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Produces e.g.
    /// `Bearer realm="mcp-server", resource_metadata="http://localhost:9000/.well-known/oauth-protected-resource"`
    pub fn build(self) -> String {
        let mut parts = Vec::new();
        if let Some(realm) = self.realm {
            parts.push(format!("realm=\"{}\"", realm));
        }
        parts.push(format!("resource_metadata=\"{}\"", self.metadata_uri));
        if let Some(error) = self.error {
            parts.push(format!("error=\"{}\"", error));
        }
        format!("Bearer {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_www_authenticate_format() {
        let header = WwwAuthenticateBuilder::new("http://localhost:9000/.well-known/x")
            .with_realm("mcp-server")
            .with_error("invalid_token")
            .build();
        assert_eq!(
            header,
            "Bearer realm=\"mcp-server\", resource_metadata=\"http://localhost:9000/.well-known/x\", error=\"invalid_token\""
        );
    }

    fn test_key() -> VerificationKey {
        use rsa::RsaPrivateKey;
        use rsa::pkcs8::{EncodePublicKey, LineEnding};

        let private_key = RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
        let pem = private_key
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .unwrap();
        VerificationKey::from_pem(&pem, "test-key").unwrap()
    }

    fn scopes() -> Vec<String> {
        vec!["mcp:read".to_string()]
    }

    #[test]
    fn test_issuer_endpoints_omitted_by_default() {
        let publisher =
            MetadataPublisher::new("http://localhost:9000", "issuer", None, scopes(), &test_key())
                .unwrap();
        let document = serde_json::to_value(publisher.authorization_server()).unwrap();
        assert!(document.get("authorization_endpoint").is_none());
        assert!(document.get("token_endpoint").is_none());
        assert_eq!(document["jwks_uri"], "http://localhost:9000/.well-known/jwks.json");
    }

    #[test]
    fn test_external_issuer_endpoints() {
        let publisher = MetadataPublisher::new(
            "http://localhost:9000",
            "https://issuer.example",
            Some("https://issuer.example/"),
            scopes(),
            &test_key(),
        )
        .unwrap()
        .with_issuer_endpoints(
            Some("https://issuer.example/oauth/authorize"),
            Some("https://issuer.example/oauth/token"),
        )
        .unwrap();

        assert_eq!(
            publisher.protected_resource().authorization_servers,
            vec!["https://issuer.example"]
        );
        let document = publisher.authorization_server();
        assert_eq!(
            document.authorization_endpoint.as_deref(),
            Some("https://issuer.example/oauth/authorize")
        );
        assert_eq!(
            document.token_endpoint.as_deref(),
            Some("https://issuer.example/oauth/token")
        );
    }

    #[test]
    fn test_relative_issuer_endpoint_rejected() {
        let publisher =
            MetadataPublisher::new("http://localhost:9000", "issuer", None, scopes(), &test_key())
                .unwrap();
        assert!(publisher.with_issuer_endpoints(None, Some("/token")).is_err());
    }

    #[test]
    fn test_normalize_strips_trailing_slash() {
        assert_eq!(normalize("http://localhost:9000/").unwrap(), "http://localhost:9000");
        assert_eq!(normalize("http://localhost:9000").unwrap(), "http://localhost:9000");
        assert!(normalize("not a url").is_err());
    }
}
