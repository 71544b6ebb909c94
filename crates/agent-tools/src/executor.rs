use agent_core::tools::ToolRegistry;

use crate::tools::{CalculateTool, CurrentTimeTool, WeatherTool};

/// Names of the tools registered by [`default_registry`]
pub const DEMO_TOOL_NAMES: [&str; 3] = [
    CalculateTool::NAME,
    CurrentTimeTool::NAME,
    WeatherTool::NAME,
];

/// A registry holding every demo tool.
pub fn default_registry() -> ToolRegistry {
    let registry = ToolRegistry::new();

    for descriptor in [
        WeatherTool::descriptor(),
        CurrentTimeTool::descriptor(),
        CalculateTool::descriptor(),
    ] {
        let name = descriptor.name.clone();
        if let Err(error) = registry.register(descriptor) {
            log::error!("Failed to register tool '{}': {}", name, error);
        }
    }

    log::debug!("Registered {} demo tools", registry.len());
    registry
}
