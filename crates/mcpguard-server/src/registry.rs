//! Operation registry.
//!
//! A static table of tools and prompts, each tagged with the scope a caller
//! must hold to invoke it. The table is assembled once with
//! [`RegistryBuilder`], frozen into an [`OperationRegistry`], and shared
//! read-only behind an `Arc` for the life of the process.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use mcpguard_auth::{OperationKind, Principal};
use mcpguard_core::McpResult;
use serde_json::{Value, json};

/// Per-call context handed to operation handlers
#[derive(Debug, Clone)]
pub struct OperationContext {
    /// Authenticated caller
    pub principal: Principal,
}

/// Boxed async handler: arguments in, result value out
pub type OperationHandler =
    Arc<dyn Fn(Value, OperationContext) -> BoxFuture<'static, McpResult<Value>> + Send + Sync>;

/// One registered tool or prompt
#[derive(Clone)]
pub struct OperationDescriptor {
    /// Unique name within its kind
    pub name: String,
    /// Tool or prompt
    pub kind: OperationKind,
    /// Scope required to invoke this operation
    pub required_scope: String,
    /// Short display title
    pub title: Option<String>,
    /// Human-readable description
    pub description: String,
    /// Tools: JSON Schema of the arguments. Prompts: the argument list.
    pub schema: Value,
    /// Implementation
    pub handler: OperationHandler,
}

impl std::fmt::Debug for OperationDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("required_scope", &self.required_scope)
            .finish_non_exhaustive()
    }
}

impl OperationDescriptor {
    /// Create a descriptor gated by the kind's category scope
    pub fn new<F, Fut>(
        kind: OperationKind,
        name: impl Into<String>,
        description: impl Into<String>,
        schema: Value,
        handler: F,
    ) -> Self
    where
        F: Fn(Value, OperationContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = McpResult<Value>> + Send + 'static,
    {
        let handler: OperationHandler =
            Arc::new(move |args, ctx| Box::pin(handler(args, ctx)) as BoxFuture<'static, _>);
        Self {
            name: name.into(),
            kind,
            required_scope: kind.category_scope().to_string(),
            title: None,
            description: description.into(),
            schema,
            handler,
        }
    }

    /// Set the display title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Override the required scope
    pub fn with_required_scope(mut self, scope: impl Into<String>) -> Self {
        self.required_scope = scope.into();
        self
    }

    /// Run the handler
    pub async fn invoke(&self, arguments: Value, ctx: OperationContext) -> McpResult<Value> {
        (self.handler)(arguments, ctx).await
    }

    /// Entry for `tools/list` or `prompts/list`
    pub fn listing(&self) -> Value {
        match self.kind {
            OperationKind::Tool => {
                let mut entry = json!({
                    "name": self.name,
                    "description": self.description,
                    "inputSchema": self.schema,
                    "annotations": {
                        "readOnlyHint": true,
                        "openWorldHint": false,
                    },
                });
                if let Some(title) = &self.title {
                    entry["title"] = json!(title);
                }
                entry
            }
            OperationKind::Prompt => json!({
                "name": self.name,
                "description": self.description,
                "arguments": self.schema,
            }),
        }
    }
}

/// Registration failure
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Name already taken within the same kind
    #[error("Duplicate {kind} name: {name}")]
    Duplicate {
        /// Kind of the clashing operation
        kind: OperationKind,
        /// Clashing name
        name: String,
    },
}

/// Mutable registry used during startup
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    operations: BTreeMap<(OperationKind, String), OperationDescriptor>,
}

impl RegistryBuilder {
    /// Add an operation.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] if the name is already registered
    /// for the same kind.
    pub fn register(mut self, descriptor: OperationDescriptor) -> Result<Self, RegistryError> {
        let key = (descriptor.kind, descriptor.name.clone());
        if self.operations.contains_key(&key) {
            return Err(RegistryError::Duplicate {
                kind: descriptor.kind,
                name: descriptor.name,
            });
        }
        self.operations.insert(key, descriptor);
        Ok(self)
    }

    /// Freeze the table
    pub fn build(self) -> Arc<OperationRegistry> {
        Arc::new(OperationRegistry {
            operations: self.operations,
        })
    }
}

/// Immutable operation table
#[derive(Debug)]
pub struct OperationRegistry {
    operations: BTreeMap<(OperationKind, String), OperationDescriptor>,
}

impl OperationRegistry {
    /// Start building a registry
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Find an operation by kind and name
    pub fn lookup(&self, kind: OperationKind, name: &str) -> Option<&OperationDescriptor> {
        self.operations.get(&(kind, name.to_string()))
    }

    /// All operations of a kind, ordered by name
    pub fn list_all(&self, kind: OperationKind) -> impl Iterator<Item = &OperationDescriptor> {
        self.operations
            .iter()
            .filter(move |((k, _), _)| *k == kind)
            .map(|(_, descriptor)| descriptor)
    }

    /// Number of registered operations
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
