//! Origin header validation for DNS rebinding protection
//!
//! Browser-originated requests always carry an `Origin`. The guard accepts
//! plain-HTTP loopback origins (`http://localhost:<port>`,
//! `http://127.0.0.1:<port>`) plus any origin listed verbatim in the policy.
//! The header is parsed as a URL, so prefix tricks such as
//! `http://localhost.evil.example` do not pass.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use url::{Host, Url};

use crate::error::OriginError;

/// Origin validation policy
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginPolicy {
    /// Extra origins accepted by exact string match
    pub allowed_origins: HashSet<String>,
    /// Reject requests that carry no Origin header at all
    pub require_origin: bool,
}

impl Default for OriginPolicy {
    fn default() -> Self {
        Self {
            allowed_origins: HashSet::new(),
            require_origin: true,
        }
    }
}

impl OriginPolicy {
    /// Create the default policy (loopback only, header required)
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an allowed origin
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.allowed_origins.insert(origin.into());
        self
    }

    /// Validate the value of an `Origin` header.
    ///
    /// # Errors
    ///
    /// Returns [`OriginError::Missing`] when the header is required but absent
    /// and [`OriginError::NotAllowed`] for anything off the allowlist.
    pub fn validate(&self, origin: Option<&str>) -> Result<(), OriginError> {
        let Some(origin) = origin else {
            return if self.require_origin {
                Err(OriginError::Missing)
            } else {
                Ok(())
            };
        };

        if self.allowed_origins.contains(origin) || is_loopback_http(origin) {
            Ok(())
        } else {
            Err(OriginError::NotAllowed(origin.to_string()))
        }
    }
}

/// `http` scheme with host `localhost` or `127.0.0.1`, any port, no path.
fn is_loopback_http(origin: &str) -> bool {
    let Ok(url) = Url::parse(origin) else {
        return false;
    };
    if url.scheme() != "http" || !url.username().is_empty() || url.password().is_some() {
        return false;
    }
    // An origin is scheme://host[:port]; Url normalizes an empty path to "/"
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return false;
    }
    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => ip == std::net::Ipv4Addr::LOCALHOST,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_policy_default() {
        let policy = OriginPolicy::default();
        assert!(policy.require_origin);
        assert!(policy.allowed_origins.is_empty());
    }

    #[test]
    fn test_allows_loopback_http_any_port() {
        let policy = OriginPolicy::default();
        for origin in [
            "http://localhost",
            "http://localhost:3000",
            "http://127.0.0.1:8080",
            "http://LOCALHOST:1",
        ] {
            assert!(policy.validate(Some(origin)).is_ok(), "{origin}");
        }
    }

    #[test]
    fn test_blocks_https_and_lookalikes() {
        let policy = OriginPolicy::default();
        for origin in [
            "https://localhost:3000",
            "https://127.0.0.1",
            "http://localhost.evil.example",
            "http://127.0.0.1.nip.io",
            "http://evil.com",
            "http://[::1]:3000",
            "http://127.0.0.2",
            "http://user@localhost:3000",
            "http://localhost:3000/path",
            "null",
            "",
        ] {
            assert!(
                matches!(policy.validate(Some(origin)), Err(OriginError::NotAllowed(_))),
                "{origin}"
            );
        }
    }

    #[test]
    fn test_missing_origin() {
        assert_eq!(
            OriginPolicy::default().validate(None),
            Err(OriginError::Missing)
        );

        let lenient = OriginPolicy {
            require_origin: false,
            ..Default::default()
        };
        assert!(lenient.validate(None).is_ok());
    }

    #[test]
    fn test_configured_origin_exact_match() {
        let policy = OriginPolicy::default().with_origin("https://app.example.com");
        assert!(policy.validate(Some("https://app.example.com")).is_ok());
        assert!(policy.validate(Some("https://app.example.com:444")).is_err());
    }
}
