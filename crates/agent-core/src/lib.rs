pub mod agent;
pub mod tools;

pub use agent::events::{AgentEvent, TokenUsage};
pub use agent::types::{Message, Role, Session};
pub use agent::AgentError;
pub use tools::{
    execute_tool_call, parse_tool_args, validate_arguments, ParameterSpec, ParameterType,
    ToolArgs, ToolCall, ToolCallAccumulator, ToolCallDelta, ToolDescriptor, ToolError,
    ToolExecutor, ToolRegistry, ToolSchema, ValidationError,
};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
