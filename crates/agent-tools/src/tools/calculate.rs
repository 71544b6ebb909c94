//! Basic arithmetic on two numbers.

use agent_core::tools::{ParameterSpec, ParameterType, ToolArgs, ToolDescriptor, ToolError};
use serde::Deserialize;

use super::decode_args;

pub struct CalculateTool;

#[derive(Debug, Deserialize)]
pub struct CalculateArgs {
    pub a: f64,
    pub b: f64,
    pub operator: String,
}

impl CalculateTool {
    pub const NAME: &'static str = "calculate";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            "Apply an arithmetic operator to two numbers.",
            Self::execute,
        )
        .with_parameter(ParameterSpec::required(
            "a",
            ParameterType::Number,
            "Left operand",
        ))
        .with_parameter(ParameterSpec::required(
            "b",
            ParameterType::Number,
            "Right operand",
        ))
        .with_parameter(ParameterSpec::required(
            "operator",
            ParameterType::String,
            "One of +, -, *, / (or add, subtract, multiply, divide)",
        ))
    }

    pub async fn execute(args: ToolArgs) -> Result<String, ToolError> {
        let args: CalculateArgs = decode_args(args)?;
        let result = Self::apply(args.a, args.b, &args.operator)?;
        Ok(format!("{} {} {} = {}", args.a, args.operator.trim(), args.b, result))
    }

    pub fn apply(a: f64, b: f64, operator: &str) -> Result<f64, ToolError> {
        match operator.trim().to_ascii_lowercase().as_str() {
            "+" | "add" | "plus" => Ok(a + b),
            "-" | "subtract" | "minus" => Ok(a - b),
            "*" | "x" | "multiply" | "times" => Ok(a * b),
            "/" | "divide" => {
                if b == 0.0 {
                    Err(ToolError::Execution("division by zero".to_string()))
                } else {
                    Ok(a / b)
                }
            }
            other => Err(ToolError::Execution(format!(
                "unsupported operator '{other}'"
            ))),
        }
    }
}
