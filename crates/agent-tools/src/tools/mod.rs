pub mod calculate;
pub mod current_time;
pub mod weather;

pub use calculate::CalculateTool;
pub use current_time::CurrentTimeTool;
pub use weather::WeatherTool;

use agent_core::tools::{ToolArgs, ToolError};
use serde::de::DeserializeOwned;

/// Decode validated arguments into a tool's typed argument struct.
pub(crate) fn decode_args<T: DeserializeOwned>(args: ToolArgs) -> Result<T, ToolError> {
    serde_json::from_value(serde_json::Value::Object(args))
        .map_err(|e| ToolError::Execution(format!("invalid arguments: {e}")))
}
