//! Demo tools: mock weather, current time and a calculator.
//!
//! Each tool is a plain `async fn(ToolArgs)` registered through a [`ToolDescriptor`];
//! arguments reach it already validated against the declared parameters.
//!
//! [`ToolDescriptor`]: agent_core::tools::ToolDescriptor

mod executor;
pub mod tools;

pub use executor::{default_registry, DEMO_TOOL_NAMES};
pub use tools::{CalculateTool, CurrentTimeTool, WeatherTool};
