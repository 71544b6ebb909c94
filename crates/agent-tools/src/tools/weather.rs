//! Mock weather lookup.

use agent_core::tools::{ParameterSpec, ParameterType, ToolArgs, ToolDescriptor, ToolError};
use serde::Deserialize;

use super::decode_args;

const CONDITIONS: [&str; 5] = ["sunny", "cloudy", "light rain", "overcast", "windy"];

pub struct WeatherTool;

#[derive(Debug, Deserialize)]
pub struct WeatherArgs {
    pub location: String,
}

impl WeatherTool {
    pub const NAME: &'static str = "get_weather";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            "Get the current weather for a city. Returns the condition and temperature.",
            Self::execute,
        )
        .with_parameter(ParameterSpec::required(
            "location",
            ParameterType::String,
            "City name, e.g. 北京 or Paris",
        ))
    }

    pub async fn execute(args: ToolArgs) -> Result<String, ToolError> {
        let args: WeatherArgs = decode_args(args)?;
        let location = args.location.trim();
        if location.is_empty() {
            return Err(ToolError::Execution("location cannot be empty".to_string()));
        }

        log::debug!("Looking up weather for {}", location);
        Ok(Self::report(location))
    }

    /// Same city, same report.
    pub fn report(location: &str) -> String {
        let seed = location
            .chars()
            .fold(0u32, |acc, c| acc.wrapping_mul(31).wrapping_add(c as u32));
        let condition = CONDITIONS[(seed % CONDITIONS.len() as u32) as usize];
        let temperature = 10 + (seed / 7 % 21) as i32;
        format!("{location}: {condition}, {temperature}°C")
    }
}
