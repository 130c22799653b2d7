//! # mcpguard core
//!
//! Foundation types shared by the mcpguard crates:
//!
//! - [`jsonrpc`] - JSON-RPC 2.0 envelope parsing and response assembly
//! - [`error`] - the unified [`McpError`] type and its JSON-RPC code mapping
//!
//! The crate has no async or transport dependencies. The server crate feeds it
//! raw request bodies and serializes whatever it hands back.

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

pub mod error;
pub mod jsonrpc;

pub use error::{ErrorKind, McpError, McpResult};
pub use jsonrpc::{
    EnvelopeError, JSONRPC_VERSION, JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId,
};
