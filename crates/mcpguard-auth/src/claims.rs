//! Token claims and the authenticated principal.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::scope::ScopeSet;

/// Audience claim (`aud`): RFC 7519 allows a single string or an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// Single audience
    Single(String),
    /// Multiple audiences
    Multiple(Vec<String>),
}

/// Claims decoded from a verified bearer token
///
/// The scope members are kept as raw JSON so that a malformed claim degrades
/// to an empty scope set instead of failing deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub)
    pub sub: String,

    /// Issuer (iss)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience (aud)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,

    /// Expiration time (exp), Unix seconds. RFC 7519 NumericDate may be fractional.
    pub exp: f64,

    /// Issued at (iat), Unix seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<f64>,

    /// Authorized party (azp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,

    /// Space-delimited scope string (RFC 8693 `scope`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Value>,

    /// Array form used by some issuers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Value>,

    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
}

impl Claims {
    /// Resolve the granted scopes.
    ///
    /// `scope` wins when present; otherwise `scopes` is consulted. Anything
    /// that is not the expected shape grants nothing.
    pub fn scope_set(&self) -> ScopeSet {
        match (&self.scope, &self.scopes) {
            (Some(scope), _) => ScopeSet::from_claim_string(scope.as_str().unwrap_or_default()),
            (None, Some(Value::Array(items))) => {
                let strings: Option<Vec<&str>> = items.iter().map(Value::as_str).collect();
                strings
                    .map(|s| s.into_iter().collect::<ScopeSet>())
                    .unwrap_or_default()
            }
            _ => ScopeSet::default(),
        }
    }
}

/// Authenticated caller, valid for the lifetime of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Token subject
    pub subject: String,
    /// Granted scopes
    pub scopes: ScopeSet,
    /// Human-readable name, when the issuer supplied one
    pub username: Option<String>,
}

impl Principal {
    /// Create a principal from validated claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            subject: claims.sub.clone(),
            scopes: claims.scope_set(),
            username: claims.preferred_username.clone(),
        }
    }

    /// Name to show in responses: the username when known, else the subject
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims(extra: Value) -> Claims {
        let mut base = json!({ "sub": "alice", "exp": 0 });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        serde_json::from_value(base).unwrap()
    }

    #[test]
    fn test_scope_string_is_split_on_whitespace() {
        let scopes = claims(json!({ "scope": "mcp:read  mcp:tools\tmcp:prompts" })).scope_set();
        assert_eq!(scopes.len(), 3);
        assert!(scopes.contains("mcp:tools"));
    }

    #[test]
    fn test_scopes_array_fallback() {
        let scopes = claims(json!({ "scopes": ["mcp:tools"] })).scope_set();
        assert!(scopes.contains("mcp:tools"));
    }

    #[test]
    fn test_malformed_scope_claims_fail_closed() {
        assert!(claims(json!({ "scope": 42 })).scope_set().is_empty());
        assert!(claims(json!({ "scope": ["mcp:tools"] })).scope_set().is_empty());
        assert!(claims(json!({ "scopes": ["mcp:tools", 7] })).scope_set().is_empty());
        assert!(claims(json!({ "scopes": "mcp:tools" })).scope_set().is_empty());
        assert!(claims(json!({})).scope_set().is_empty());
    }

    #[test]
    fn test_malformed_scope_does_not_fall_back_to_array() {
        let scopes = claims(json!({ "scope": 1, "scopes": ["mcp:tools"] })).scope_set();
        assert!(scopes.is_empty());
    }

    #[test]
    fn test_audience_forms() {
        let single = claims(json!({ "aud": "mcp-server" }));
        assert_eq!(single.aud, Some(Audience::Single("mcp-server".into())));

        let multi = claims(json!({ "aud": ["a", "mcp-server"] }));
        assert_eq!(
            multi.aud,
            Some(Audience::Multiple(vec!["a".into(), "mcp-server".into()]))
        );
    }

    #[test]
    fn test_fractional_timestamps() {
        let fractional = claims(json!({ "exp": 1_900_000_000.5, "iat": 1_899_996_400.25 }));
        assert_eq!(fractional.exp, 1_900_000_000.5);
        assert_eq!(fractional.iat, Some(1_899_996_400.25));

        let integral = claims(json!({ "exp": 1_900_000_000u64 }));
        assert_eq!(integral.exp, 1_900_000_000.0);
    }

    #[test]
    fn test_principal_display_name() {
        let principal =
            Principal::from_claims(&claims(json!({ "preferred_username": "Alice A." })));
        assert_eq!(principal.display_name(), "Alice A.");
        assert_eq!(principal.subject, "alice");
    }
}
