//! JSON-RPC request dispatcher
//!
//! Runs after the transport has checked the origin and authenticated the
//! caller. For every request the dispatcher resolves the method, enforces the
//! scope gate, runs the operation and shapes exactly one response carrying the
//! request's id. Notifications run nothing and produce no response.

use std::sync::Arc;

use mcpguard_auth::metadata::MCP_PROTOCOL_VERSION;
use mcpguard_auth::{OperationKind, Principal, require_scope};
use mcpguard_core::{ErrorKind, JsonRpcRequest, JsonRpcResponse, McpError, McpResult};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, error, info};

use crate::method::McpMethod;
use crate::registry::{OperationContext, OperationRegistry};

/// Name and version reported by `initialize`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    /// Server name
    pub name: String,
    /// Server version
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// `params` of `tools/call` and `prompts/get`
#[derive(Debug, Deserialize)]
struct InvocationParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

/// Routes authenticated requests to operations
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<OperationRegistry>,
    info: ServerInfo,
}

impl Dispatcher {
    /// Create a dispatcher over a frozen registry
    pub fn new(registry: Arc<OperationRegistry>) -> Self {
        Self {
            registry,
            info: ServerInfo::default(),
        }
    }

    /// Handle one request. Returns `None` for notifications.
    pub async fn dispatch(
        &self,
        principal: &Principal,
        request: JsonRpcRequest,
    ) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            debug!(method = %request.method, "Notification acknowledged");
            return None;
        };

        let method = request.method.clone();
        let response = match self.handle(principal, request).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => {
                if err.kind == ErrorKind::Internal {
                    error!(method = %method, request_id = %id, error = %err, "Operation failed");
                } else {
                    debug!(method = %method, request_id = %id, error = %err, "Request rejected");
                }
                JsonRpcResponse::error(id, err.sanitized())
            }
        };
        Some(response)
    }

    async fn handle(
        &self,
        principal: &Principal,
        request: JsonRpcRequest,
    ) -> McpResult<Value> {
        let method: McpMethod = request.method.parse()?;

        if let Some(kind) = method.operation_kind() {
            require_scope(principal, kind.category_scope(), kind.denial_detail())?;
        }

        match method {
            McpMethod::Initialize => Ok(self.initialize_result(principal)),
            McpMethod::Ping => Ok(json!({
                "pong": true,
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "user": principal.display_name(),
                "authenticated": true,
            })),
            McpMethod::ToolsList => Ok(json!({ "tools": self.listings(OperationKind::Tool) })),
            McpMethod::PromptsList => {
                Ok(json!({ "prompts": self.listings(OperationKind::Prompt) }))
            }
            McpMethod::ToolsCall => {
                self.invoke(OperationKind::Tool, principal, request.params).await
            }
            McpMethod::PromptsGet => {
                self.invoke(OperationKind::Prompt, principal, request.params).await
            }
        }
    }

    async fn invoke(
        &self,
        kind: OperationKind,
        principal: &Principal,
        params: Option<Value>,
    ) -> McpResult<Value> {
        let params = params.ok_or_else(|| McpError::invalid_params("Missing params"))?;
        let InvocationParams { name, arguments } = serde_json::from_value(params)
            .map_err(|e| McpError::invalid_params(format!("Invalid params: {e}")))?;

        let arguments = match arguments {
            None | Some(Value::Null) => json!({}),
            Some(args @ Value::Object(_)) => args,
            Some(_) => return Err(McpError::invalid_params("arguments must be an object")),
        };

        let descriptor = self
            .registry
            .lookup(kind, &name)
            .ok_or_else(|| McpError::invalid_params(format!("Unknown {kind}: {name}")))?;

        require_scope(principal, &descriptor.required_scope, kind.denial_detail())?;

        info!(subject = %principal.subject, %kind, operation = %name, "Invoking operation");
        let ctx = OperationContext {
            principal: principal.clone(),
        };
        descriptor
            .invoke(arguments, ctx)
            .await
            .map_err(|e| e.with_operation(name))
    }

    fn listings(&self, kind: OperationKind) -> Vec<Value> {
        self.registry
            .list_all(kind)
            .map(|descriptor| descriptor.listing())
            .collect()
    }

    fn initialize_result(&self, principal: &Principal) -> Value {
        json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {
                "tools": { "listChanged": false },
                "prompts": { "listChanged": false },
            },
            "serverInfo": {
                "name": self.info.name,
                "version": self.info.version,
                "authenticatedUser": principal.display_name(),
                "userScopes": principal.scopes.iter().collect::<Vec<_>>(),
            },
        })
    }
}
