use agent_core::tools::{ParameterSpec, ParameterType, ToolArgs, ToolDescriptor, ToolError};
use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};
use serde::Deserialize;

use super::decode_args;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %:z";

pub struct CurrentTimeTool;

#[derive(Debug, Deserialize)]
pub struct CurrentTimeArgs {
    /// Whole hours; accepted as a number so `8.0` decodes as well as `8`
    #[serde(default)]
    pub timezone_offset_hours: Option<f64>,
}

impl CurrentTimeTool {
    pub const NAME: &'static str = "get_current_time";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            "Get the current date and time. Without an offset the local time zone is used.",
            Self::execute,
        )
        .with_parameter(ParameterSpec::optional(
            "timezone_offset_hours",
            ParameterType::Integer,
            "UTC offset in hours, from -12 to 14 (e.g. 8 for Beijing)",
        ))
    }

    pub async fn execute(args: ToolArgs) -> Result<String, ToolError> {
        let args: CurrentTimeArgs = decode_args(args)?;

        match args.timezone_offset_hours {
            Some(hours) => Self::format_at_offset(Utc::now(), hours),
            None => Ok(Local::now().format(TIME_FORMAT).to_string()),
        }
    }

    pub fn format_at_offset(now: DateTime<Utc>, hours: f64) -> Result<String, ToolError> {
        if !(-12.0..=14.0).contains(&hours) || hours.fract() != 0.0 {
            return Err(ToolError::Execution(format!(
                "timezone_offset_hours must be a whole number between -12 and 14, got {hours}"
            )));
        }

        let offset = FixedOffset::east_opt(hours as i32 * 3600).ok_or_else(|| {
            ToolError::Execution(format!("invalid timezone offset: {hours}"))
        })?;
        Ok(offset
            .from_utc_datetime(&now.naive_utc())
            .format(TIME_FORMAT)
            .to_string())
    }
}
