//! # mcpguard server
//!
//! OAuth-protected MCP server: JSON-RPC 2.0 over HTTP, with every request
//! passing through an origin guard, bearer token validation and a per-operation
//! scope check before any tool or prompt runs.
//!
//! ```text
//! POST /mcp ─► origin guard ─► token validator ─► envelope parse
//!           ─► method ─► scope gate ─► registry lookup ─► operation
//! ```
//!
//! ## Embedding
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mcpguard_server::{AppState, ServerConfig, router};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::load(None)?;
//! let app = router(Arc::new(AppState::from_config(&config)?));
//! let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod method;
pub mod operations;
pub mod registry;
pub mod transport;

pub use config::{AuthSettings, ConfigError, LoggingConfig, ServerConfig};
pub use dispatcher::{Dispatcher, ServerInfo};
pub use error::{ServerError, ServerResult};
pub use method::McpMethod;
pub use operations::default_registry;
pub use registry::{OperationContext, OperationDescriptor, OperationRegistry, RegistryError};
pub use transport::{AppState, MCP_PATH, router, serve};
