pub mod accumulator;
pub mod executor;
pub mod registry;
pub mod schema;
pub mod types;
pub mod validator;

pub use accumulator::{PendingToolCall, ToolCallAccumulator, ToolCallDelta};
pub use executor::{execute_tool_call, parse_tool_args, ToolError, ToolExecutor};
pub use registry::{RegistryError, ToolDescriptor, ToolHandler, ToolRegistry};
pub use schema::{ParameterSpec, ParameterType};
pub use types::{FunctionCall, FunctionSchema, ToolArgs, ToolCall, ToolSchema};
pub use validator::{validate_arguments, ValidationError};
