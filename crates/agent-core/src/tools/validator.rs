//! Structural validation of tool arguments.
//!
//! Checks run in a fixed order and stop at the first failure: missing required
//! parameters, then unknown keys, then type mismatches. Range, format and length
//! constraints are not checked here.

use serde_json::Value;
use thiserror::Error;

use crate::tools::{ParameterSpec, ToolArgs};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required parameter '{0}'")]
    MissingRequiredParameter(String),

    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("parameter '{name}' expected {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },
}

pub fn validate_arguments(
    parameters: &[ParameterSpec],
    arguments: &ToolArgs,
) -> Result<(), ValidationError> {
    if let Some(missing) = parameters
        .iter()
        .find(|parameter| parameter.required && !arguments.contains_key(&parameter.name))
    {
        return Err(ValidationError::MissingRequiredParameter(
            missing.name.clone(),
        ));
    }

    // Sorted so the reported key does not depend on map iteration order.
    let mut keys: Vec<&String> = arguments.keys().collect();
    keys.sort();

    if let Some(unknown) = keys
        .iter()
        .find(|key| !parameters.iter().any(|parameter| &parameter.name == **key))
    {
        return Err(ValidationError::UnknownParameter((*unknown).clone()));
    }

    for parameter in parameters {
        let Some(value) = arguments.get(&parameter.name) else {
            continue;
        };
        if !parameter.param_type.accepts(value) {
            return Err(ValidationError::TypeMismatch {
                name: parameter.name.clone(),
                expected: parameter.param_type.to_string(),
                actual: value_type_name(value).to_string(),
            });
        }
    }

    Ok(())
}

/// JSON type name of a runtime value, distinguishing integers from other numbers.
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(number) if number.is_i64() || number.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ParameterType;
    use serde_json::json;

    fn weather_params() -> Vec<ParameterSpec> {
        vec![ParameterSpec::required(
            "location",
            ParameterType::String,
            "City name",
        )]
    }

    fn args(value: Value) -> ToolArgs {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn valid_arguments_pass() {
        let result = validate_arguments(&weather_params(), &args(json!({"location": "北京"})));
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn missing_required_parameter_is_reported() {
        let result = validate_arguments(&weather_params(), &args(json!({})));
        assert_eq!(
            result,
            Err(ValidationError::MissingRequiredParameter("location".to_string()))
        );
    }

    #[test]
    fn wrong_type_is_reported_with_actual_type() {
        let result = validate_arguments(&weather_params(), &args(json!({"location": 123})));
        assert_eq!(
            result,
            Err(ValidationError::TypeMismatch {
                name: "location".to_string(),
                expected: "string".to_string(),
                actual: "integer".to_string(),
            })
        );
    }

    #[test]
    fn unknown_parameter_is_reported() {
        let result = validate_arguments(
            &weather_params(),
            &args(json!({"location": "北京", "extra": "x"})),
        );
        assert_eq!(
            result,
            Err(ValidationError::UnknownParameter("extra".to_string()))
        );
    }

    #[test]
    fn missing_is_checked_before_unknown_and_type() {
        let params = vec![
            ParameterSpec::required("a", ParameterType::String, ""),
            ParameterSpec::required("b", ParameterType::Integer, ""),
        ];
        let result = validate_arguments(&params, &args(json!({"a": 1, "zzz": true})));
        assert_eq!(
            result,
            Err(ValidationError::MissingRequiredParameter("b".to_string()))
        );
    }

    #[test]
    fn unknown_is_checked_before_type() {
        let params = vec![ParameterSpec::required("a", ParameterType::String, "")];
        let result = validate_arguments(&params, &args(json!({"a": 1, "other": 2})));
        assert_eq!(
            result,
            Err(ValidationError::UnknownParameter("other".to_string()))
        );
    }

    #[test]
    fn optional_parameters_may_be_absent() {
        let params = vec![
            ParameterSpec::required("a", ParameterType::Number, ""),
            ParameterSpec::optional("b", ParameterType::Boolean, ""),
        ];
        assert_eq!(validate_arguments(&params, &args(json!({"a": 1.5}))), Ok(()));
        assert!(validate_arguments(&params, &args(json!({"a": 1.5, "b": "yes"}))).is_err());
    }

    #[test]
    fn fractional_number_fails_integer_check() {
        let params = vec![ParameterSpec::required("n", ParameterType::Integer, "")];
        let result = validate_arguments(&params, &args(json!({"n": 1.5})));
        assert_eq!(
            result,
            Err(ValidationError::TypeMismatch {
                name: "n".to_string(),
                expected: "integer".to_string(),
                actual: "number".to_string(),
            })
        );
    }

    #[test]
    fn array_and_object_types_are_checked() {
        let params = vec![
            ParameterSpec::required("items", ParameterType::Array, ""),
            ParameterSpec::required("meta", ParameterType::Object, ""),
        ];
        assert_eq!(
            validate_arguments(&params, &args(json!({"items": [1, 2], "meta": {"k": "v"}}))),
            Ok(())
        );
        assert!(matches!(
            validate_arguments(&params, &args(json!({"items": {}, "meta": {}}))),
            Err(ValidationError::TypeMismatch { name, .. }) if name == "items"
        ));
    }

    #[test]
    fn null_is_not_accepted_for_any_type() {
        let params = vec![ParameterSpec::required("a", ParameterType::String, "")];
        let result = validate_arguments(&params, &args(json!({"a": null})));
        assert!(matches!(
            result,
            Err(ValidationError::TypeMismatch { actual, .. }) if actual == "null"
        ));
    }
}
