//! Server startup errors
//!
//! Request-time failures never surface here: they become JSON-RPC errors or
//! HTTP rejections at the transport boundary.

use mcpguard_auth::KeyError;

use crate::config::ConfigError;
use crate::registry::RegistryError;

/// Result type for server startup
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that prevent the server from starting or keep it from running
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Verification key could not be loaded
    #[error("Failed to load verification key: {0}")]
    Key(#[from] KeyError),

    /// Base URL or authorization server URL is not absolute
    #[error("Invalid URL in configuration: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Operation registry could not be built
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Listener could not be bound
    #[error("Failed to bind {address}: {source}")]
    Bind {
        /// Requested address
        address: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Server loop failed
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}
