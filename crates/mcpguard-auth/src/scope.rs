//! Scope sets and the authorization decision.
//!
//! Scopes are opaque strings compared exactly. There is no hierarchy and no
//! wildcard: holding `mcp:tools` says nothing about `mcp:tools:echo`, and `*`
//! is just another string.

use std::collections::BTreeSet;
use std::fmt;

use mcpguard_core::{McpError, McpResult};
use tracing::debug;

use crate::claims::Principal;

/// Read access (advertised, not required by any built-in operation)
pub const SCOPE_READ: &str = "mcp:read";
/// Required to list or call tools
pub const SCOPE_TOOLS: &str = "mcp:tools";
/// Required to list or get prompts
pub const SCOPE_PROMPTS: &str = "mcp:prompts";

/// Category of a registered operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationKind {
    /// Invoked through `tools/call`
    Tool,
    /// Fetched through `prompts/get`
    Prompt,
}

impl OperationKind {
    /// Scope gating every operation of this kind, including enumeration
    pub const fn category_scope(self) -> &'static str {
        match self {
            Self::Tool => SCOPE_TOOLS,
            Self::Prompt => SCOPE_PROMPTS,
        }
    }

    /// Detail returned to callers denied access to this category
    pub const fn denial_detail(self) -> &'static str {
        match self {
            Self::Tool => "Insufficient permissions for tool execution",
            Self::Prompt => "Insufficient permissions for prompt access",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tool => f.write_str("tool"),
            Self::Prompt => f.write_str("prompt"),
        }
    }
}

/// Set of granted scope strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSet(BTreeSet<String>);

impl ScopeSet {
    /// Parse a space-delimited scope claim. Empty segments are dropped.
    pub fn from_claim_string(claim: &str) -> Self {
        claim.split_whitespace().collect()
    }

    /// Exact membership test
    pub fn contains(&self, scope: &str) -> bool {
        self.0.contains(scope)
    }

    /// Number of distinct scopes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no scope was granted
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate scopes in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<'a> FromIterator<&'a str> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_owned).collect())
    }
}

impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        f.write_str(&joined.join(" "))
    }
}

/// Whether `principal` holds `required_scope`
pub fn authorize(principal: &Principal, required_scope: &str) -> bool {
    principal.scopes.contains(required_scope)
}

/// Require `required_scope`, failing with a JSON-RPC `Forbidden` error.
///
/// # Errors
///
/// Returns [`McpError::forbidden`] with `detail` when the scope is missing.
pub fn require_scope(principal: &Principal, required_scope: &str, detail: &str) -> McpResult<()> {
    if authorize(principal, required_scope) {
        Ok(())
    } else {
        debug!(
            subject = %principal.subject,
            required = required_scope,
            granted = %principal.scopes,
            "Scope check denied"
        );
        Err(McpError::forbidden(detail))
    }
}
