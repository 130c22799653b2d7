//! Network transports

pub mod http;

pub use http::{AppState, MCP_PATH, router, serve};
