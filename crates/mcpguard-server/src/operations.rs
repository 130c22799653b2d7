//! Built-in tools and prompts.

use std::sync::Arc;

use mcpguard_auth::OperationKind;
use mcpguard_core::{McpError, McpResult};
use schemars::JsonSchema;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::registry::{OperationContext, OperationDescriptor, OperationRegistry, RegistryError};

/// Largest accepted `repeat_count`
pub const MAX_REPEAT_COUNT: i64 = 10;

/// Arguments of the `echo` tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct EchoArgs {
    /// Message to echo back
    pub message: String,
    /// Number of times to repeat the message
    #[serde(default = "default_repeat_count")]
    #[schemars(range(min = 1, max = 10))]
    pub repeat_count: i64,
}

fn default_repeat_count() -> i64 {
    1
}

/// Arguments of the `echo_prompt` prompt
#[derive(Debug, Deserialize)]
pub struct EchoPromptArgs {
    /// Message to embed in the prompt
    #[serde(default = "default_prompt_message")]
    pub message: String,
}

fn default_prompt_message() -> String {
    "Hello".to_string()
}

/// Registry holding every built-in operation
///
/// # Errors
///
/// Only fails if two built-ins share a name.
pub fn default_registry() -> Result<Arc<OperationRegistry>, RegistryError> {
    Ok(OperationRegistry::builder()
        .register(echo_tool())?
        .register(whoami_tool())?
        .register(echo_prompt())?
        .build())
}

/// `echo`: repeat a message `repeat_count` times
pub fn echo_tool() -> OperationDescriptor {
    OperationDescriptor::new(
        OperationKind::Tool,
        "echo",
        "Echo a message back, optionally repeated",
        input_schema::<EchoArgs>(),
        |args, _ctx| async move {
            let args: EchoArgs = parse_arguments(args)?;
            if !(1..=MAX_REPEAT_COUNT).contains(&args.repeat_count) {
                return Err(McpError::invalid_params(format!(
                    "repeat_count must be between 1 and {MAX_REPEAT_COUNT}, got {}",
                    args.repeat_count
                )));
            }
            let text = args.message.repeat(args.repeat_count as usize);
            Ok(text_content(text))
        },
    )
    .with_title("Echo")
}

/// `whoami`: describe the authenticated caller
pub fn whoami_tool() -> OperationDescriptor {
    OperationDescriptor::new(
        OperationKind::Tool,
        "whoami",
        "Show the authenticated user and granted scopes",
        json!({ "type": "object", "properties": {} }),
        |_args, ctx: OperationContext| async move {
            let principal = &ctx.principal;
            let text = format!(
                "User: {}\nSubject: {}\nScopes: {}",
                principal.display_name(),
                principal.subject,
                principal.scopes
            );
            Ok(text_content(text))
        },
    )
    .with_title("Who am I")
}

/// `echo_prompt`: ask the model to echo a message
pub fn echo_prompt() -> OperationDescriptor {
    OperationDescriptor::new(
        OperationKind::Prompt,
        "echo_prompt",
        "Prompt asking the assistant to echo a message",
        json!([
            {
                "name": "message",
                "description": "Message to echo (defaults to \"Hello\")",
                "required": false,
            }
        ]),
        |args, _ctx| async move {
            let args: EchoPromptArgs = parse_arguments(args)?;
            Ok(json!({
                "description": "Echo prompt",
                "messages": [
                    {
                        "role": "user",
                        "content": {
                            "type": "text",
                            "text": format!("Please echo: {}", args.message),
                        }
                    }
                ]
            }))
        },
    )
}

fn input_schema<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or_else(|_| json!({ "type": "object" }))
}

fn parse_arguments<T: DeserializeOwned>(args: Value) -> McpResult<T> {
    serde_json::from_value(args).map_err(|e| McpError::invalid_params(format!("Invalid arguments: {e}")))
}

fn text_content(text: String) -> Value {
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": false,
    })
}
