//! Bearer token validation.
//!
//! Turns the raw `Authorization` header into a [`Principal`] or an
//! [`AuthError`]. Checks run in a fixed order and stop at the first failure:
//!
//! 1. signature against the configured public key
//! 2. expiry (`exp`), with a small leeway for clock skew
//! 3. issuer (`iss`)
//! 4. audience (`aud`, string or array)
//! 5. authorized party (`azp`), only when configured
//!
//! Callers only ever learn that the token was invalid; the specific reason is
//! logged at `warn`.

use std::collections::HashSet;
use std::time::Duration;

use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, TokenData, Validation, decode, decode_header};
use tracing::{debug, warn};

use crate::claims::{Claims, Principal};
use crate::error::{AuthError, TokenRejection};
use crate::keys::VerificationKey;

/// Default clock skew tolerance
pub const DEFAULT_LEEWAY: Duration = Duration::from_secs(30);

/// Validates bearer tokens against one fixed RSA key
///
/// # Example
///
/// ```rust,no_run
/// # use mcpguard_auth::{TokenValidator, VerificationKey};
/// # fn demo(key: VerificationKey) {
/// let validator = TokenValidator::new(key, "mcp-simple-auth", vec!["mcp-server".into()]);
/// match validator.validate(Some("Bearer eyJ0eXAi...")) {
///     Ok(principal) => println!("authenticated {}", principal.subject),
///     Err(e) => println!("rejected: {e}"),
/// }
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TokenValidator {
    key: VerificationKey,
    /// Expected issuer (iss claim)
    expected_issuer: String,
    /// Accepted audiences; a token matches if any of its audiences is listed
    accepted_audiences: Vec<String>,
    /// Expected authorized party (azp claim), unchecked when `None`
    expected_authorized_party: Option<String>,
    /// Clock skew tolerance
    clock_skew_leeway: Duration,
    /// Allowed signing algorithms
    allowed_algorithms: Vec<Algorithm>,
}

impl TokenValidator {
    /// Create a validator
    pub fn new(
        key: VerificationKey,
        expected_issuer: impl Into<String>,
        accepted_audiences: Vec<String>,
    ) -> Self {
        let allowed_algorithms = vec![key.algorithm()];
        Self {
            key,
            expected_issuer: expected_issuer.into(),
            accepted_audiences,
            expected_authorized_party: None,
            clock_skew_leeway: DEFAULT_LEEWAY,
            allowed_algorithms,
        }
    }

    /// Require `azp` to equal `party`
    pub fn with_authorized_party(mut self, party: impl Into<String>) -> Self {
        self.expected_authorized_party = Some(party.into());
        self
    }

    /// Set clock skew tolerance
    pub fn with_clock_skew(mut self, leeway: Duration) -> Self {
        self.clock_skew_leeway = leeway;
        self
    }

    /// Expected issuer
    pub fn expected_issuer(&self) -> &str {
        &self.expected_issuer
    }

    /// Validate the value of an `Authorization` header.
    ///
    /// # Errors
    ///
    /// - [`AuthError::MissingHeader`] when `authorization_header` is `None`
    /// - [`AuthError::MalformedHeader`] when it is not `Bearer <token>`
    /// - [`AuthError::InvalidToken`] when any token check fails
    pub fn validate(&self, authorization_header: Option<&str>) -> Result<Principal, AuthError> {
        let header = authorization_header.ok_or(AuthError::MissingHeader)?;
        let token = extract_bearer(header).ok_or(AuthError::MalformedHeader)?;

        let claims = self.validate_token(token).map_err(|reason| {
            warn!(
                reason = %reason,
                issuer = %self.expected_issuer,
                "Bearer token rejected"
            );
            AuthError::InvalidToken(reason)
        })?;

        let principal = Principal::from_claims(&claims);
        debug!(
            subject = %principal.subject,
            scopes = %principal.scopes,
            "Bearer token accepted"
        );
        Ok(principal)
    }

    /// Run every token check and return the verified claims.
    ///
    /// # Errors
    ///
    /// Returns the first [`TokenRejection`] encountered.
    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenRejection> {
        let header =
            decode_header(token).map_err(|e| TokenRejection::Malformed(e.to_string()))?;

        if !self.allowed_algorithms.contains(&header.alg) {
            return Err(TokenRejection::Algorithm(format!("{:?}", header.alg)));
        }

        let mut validation = Validation::new(header.alg);
        validation.leeway = self.clock_skew_leeway.as_secs();
        validation.required_spec_claims =
            HashSet::from(["exp", "iss", "aud", "sub"].map(String::from));
        validation.set_issuer(&[&self.expected_issuer]);
        validation.set_audience(self.accepted_audiences.as_slice());

        let data: TokenData<Claims> = decode(token, self.key.decoding_key(), &validation)
            .map_err(|e| match e.kind() {
                JwtErrorKind::InvalidSignature => TokenRejection::Signature,
                JwtErrorKind::ExpiredSignature => TokenRejection::Expired,
                JwtErrorKind::ImmatureSignature => TokenRejection::NotYetValid,
                JwtErrorKind::InvalidIssuer => TokenRejection::Issuer,
                JwtErrorKind::InvalidAudience => TokenRejection::Audience,
                JwtErrorKind::InvalidAlgorithm => {
                    TokenRejection::Algorithm(format!("{:?}", header.alg))
                }
                JwtErrorKind::MissingRequiredClaim(claim) => {
                    TokenRejection::MissingClaim(claim.clone())
                }
                _ => TokenRejection::Malformed(e.to_string()),
            })?;

        if let Some(expected) = &self.expected_authorized_party
            && data.claims.azp.as_deref() != Some(expected.as_str())
        {
            return Err(TokenRejection::AuthorizedParty);
        }

        Ok(data.claims)
    }
}

/// Extract the token from a `Bearer <token>` header value.
///
/// The scheme is matched case-insensitively; the token must be a single
/// non-empty segment.
pub fn extract_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() || token.contains(' ') {
        return None;
    }
    Some(token)
}
