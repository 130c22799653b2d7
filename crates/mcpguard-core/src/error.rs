//! Unified error handling.
//!
//! Every failure that is reported to a caller inside a JSON-RPC envelope is an
//! [`McpError`]. Authentication and origin failures never get this far: they
//! are answered at the HTTP layer by the auth crate's own error types.
//!
//! ## Example
//!
//! ```rust
//! use mcpguard_core::error::{ErrorKind, McpError, McpResult};
//!
//! fn lookup(name: &str) -> McpResult<()> {
//!     Err(McpError::invalid_params(format!("Unknown tool: {name}")))
//! }
//!
//! let err = lookup("calculator").unwrap_err();
//! assert_eq!(err.kind, ErrorKind::InvalidParams);
//! assert_eq!(err.jsonrpc_code(), -32602);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type alias for dispatch operations
pub type McpResult<T> = Result<T, McpError>;

/// Unified error type carried through the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpError {
    /// Error classification
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Operation being performed when the error occurred.
    /// Never serialized to clients.
    #[serde(skip)]
    pub operation: Option<String>,
}

/// Error classification for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Body was not valid JSON (-32700)
    ParseError,
    /// Body was JSON but not a valid 2.0 request object (-32600)
    InvalidRequest,
    /// Method not found (-32601)
    MethodNotFound,
    /// Invalid params (-32602)
    InvalidParams,
    /// Internal error (-32603)
    Internal,
    /// Authenticated caller lacks the required scope (-32001)
    Forbidden,
}

impl McpError {
    /// Create a new error with kind and message
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            operation: None,
        }
    }

    /// Create a parse error
    #[must_use]
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseError, message)
    }

    /// Create an invalid request error
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message)
    }

    /// Create a method not found error
    #[must_use]
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::MethodNotFound,
            format!("Method not found: {}", method.into()),
        )
    }

    /// Create a validation/invalid params error
    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParams, message)
    }

    /// Create an internal error
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Create a forbidden error. The detail ends up in the error's `data`.
    #[must_use]
    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, detail)
    }

    /// Set the operation context
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Replace internal details with a generic message.
    ///
    /// Call this before returning errors to clients; only internal errors are
    /// rewritten, the other kinds already carry caller-facing text.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        if self.kind == ErrorKind::Internal {
            self.message = ErrorKind::Internal.description().to_string();
        }
        self
    }

    /// Get the JSON-RPC error code for this error
    #[must_use]
    pub const fn jsonrpc_code(&self) -> i32 {
        self.kind.jsonrpc_code()
    }
}

impl ErrorKind {
    /// JSON-RPC code for this kind
    #[must_use]
    pub const fn jsonrpc_code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::Internal => -32603,
            Self::Forbidden => -32001,
        }
    }

    /// Get a human-readable description
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::InvalidRequest => "Invalid Request",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::Internal => "Internal error",
            Self::Forbidden => "Forbidden",
        }
    }
}

impl fmt::Display for McpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(op) = &self.operation {
            write!(f, " (operation: {})", op)?;
        }
        Ok(())
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl std::error::Error for McpError {}
