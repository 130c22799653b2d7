//! # mcpguard auth
//!
//! Access control for the mcpguard dispatcher:
//!
//! - [`validator`] - bearer token validation (signature, expiry, issuer, audience)
//! - [`scope`] - scope sets and the exact-match authorization decision
//! - [`origin`] - `Origin` header allowlist for DNS rebinding protection
//! - [`keys`] - the RSA verification key and its JWK form
//! - [`metadata`] - OAuth discovery documents and `WWW-Authenticate` challenges
//!
//! Everything here is synchronous and pure: key material is loaded once at
//! startup and never fetched again.

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

pub mod claims;
pub mod error;
pub mod keys;
pub mod metadata;
pub mod origin;
pub mod scope;
pub mod validator;

pub use claims::{Audience, Claims, Principal};
pub use error::{AuthError, KeyError, OriginError, TokenRejection};
pub use keys::{Jwk, JwkSet, VerificationKey};
pub use metadata::MetadataPublisher;
pub use origin::OriginPolicy;
pub use scope::{OperationKind, ScopeSet, authorize, require_scope};
pub use validator::TokenValidator;
