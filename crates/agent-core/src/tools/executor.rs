use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;
use thiserror::Error;

use crate::tools::{ToolArgs, ToolCall, ToolSchema, ValidationError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Arguments are not a JSON object: {0}")]
    ArgumentsNotJson(String),

    #[error("Invalid arguments: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution failed: {0}")]
    Execution(String),
}

pub type Result<T> = std::result::Result<T, ToolError>;

/// Anything that can run a finalized tool call and advertise its tool definitions.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, call: &ToolCall) -> Result<String>;
    fn list_tools(&self) -> Vec<ToolSchema>;
}

/// Parse raw argument text into a key/value mapping.
///
/// Blank text is treated as an empty object, since models send `""` for tools without
/// parameters.
pub fn parse_tool_args(arguments: &str) -> Result<ToolArgs> {
    let args_raw = arguments.trim();

    if args_raw.is_empty() {
        return Ok(ToolArgs::new());
    }

    match serde_json::from_str::<serde_json::Value>(args_raw) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(ToolError::ArgumentsNotJson(format!(
            "expected an object, got {}",
            crate::tools::validator::value_type_name(&other)
        ))),
        Err(error) => Err(ToolError::ArgumentsNotJson(error.to_string())),
    }
}

/// Run one tool call, turning a panicking executor into [`ToolError::Execution`].
pub async fn execute_tool_call(tool_call: &ToolCall, tools: &dyn ToolExecutor) -> Result<String> {
    match AssertUnwindSafe(tools.execute(tool_call))
        .catch_unwind()
        .await
    {
        Ok(result) => result,
        Err(_) => {
            log::error!(
                "Tool '{}' ({}) panicked during execution",
                tool_call.function.name,
                tool_call.id
            );
            Err(ToolError::Execution(format!(
                "tool '{}' panicked",
                tool_call.function.name
            )))
        }
    }
}
