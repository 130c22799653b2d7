//! Supported JSON-RPC methods

use std::fmt;
use std::str::FromStr;

use mcpguard_auth::OperationKind;
use mcpguard_core::McpError;

/// Closed set of methods this server answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum McpMethod {
    /// `initialize`
    Initialize,
    /// `ping`
    Ping,
    /// `tools/list`
    ToolsList,
    /// `tools/call`
    ToolsCall,
    /// `prompts/list`
    PromptsList,
    /// `prompts/get`
    PromptsGet,
}

impl McpMethod {
    /// Wire name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Ping => "ping",
            Self::ToolsList => "tools/list",
            Self::ToolsCall => "tools/call",
            Self::PromptsList => "prompts/list",
            Self::PromptsGet => "prompts/get",
        }
    }

    /// Operation category this method touches, if any
    pub const fn operation_kind(self) -> Option<OperationKind> {
        match self {
            Self::Initialize | Self::Ping => None,
            Self::ToolsList | Self::ToolsCall => Some(OperationKind::Tool),
            Self::PromptsList | Self::PromptsGet => Some(OperationKind::Prompt),
        }
    }
}

impl FromStr for McpMethod {
    type Err = McpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initialize" => Ok(Self::Initialize),
            "ping" => Ok(Self::Ping),
            "tools/list" => Ok(Self::ToolsList),
            "tools/call" => Ok(Self::ToolsCall),
            "prompts/list" => Ok(Self::PromptsList),
            "prompts/get" => Ok(Self::PromptsGet),
            other => Err(McpError::method_not_found(other)),
        }
    }
}

impl fmt::Display for McpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
