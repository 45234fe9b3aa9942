//! Argument extraction for tool inputs

use serde_json::{Map, Value};

use super::ToolError;

/// Required, non-empty string argument
pub fn require_str<'a>(input: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    match input.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s),
        Some(Value::String(_)) => Err(ToolError::InvalidArgument(format!("{} must not be empty", key))),
        Some(Value::Null) | None => Err(ToolError::InvalidArgument(format!("Missing required parameter: {}", key))),
        Some(_) => Err(ToolError::InvalidArgument(format!("{} must be a string", key))),
    }
}

/// Required string argument that may be empty (verb source, expressions)
pub fn require_text<'a>(input: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    match input.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(Value::Null) | None => Err(ToolError::InvalidArgument(format!("Missing required parameter: {}", key))),
        Some(_) => Err(ToolError::InvalidArgument(format!("{} must be a string", key))),
    }
}

pub fn optional_str<'a>(input: &'a Value, key: &str) -> Result<Option<&'a str>, ToolError> {
    match input.get(key) {
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Null) | None => Ok(None),
        Some(_) => Err(ToolError::InvalidArgument(format!("{} must be a string", key))),
    }
}

pub fn optional_bool(input: &Value, key: &str, default: bool) -> Result<bool, ToolError> {
    match input.get(key) {
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::Null) | None => Ok(default),
        Some(_) => Err(ToolError::InvalidArgument(format!("{} must be a boolean", key))),
    }
}

pub fn optional_u64(input: &Value, key: &str) -> Result<Option<u64>, ToolError> {
    match input.get(key) {
        Some(Value::Null) | None => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| ToolError::InvalidArgument(format!("{} must be a non-negative integer", key))),
    }
}

/// Present argument of any JSON type, `null` included
pub fn require_value<'a>(input: &'a Value, key: &str) -> Result<&'a Value, ToolError> {
    input
        .get(key)
        .ok_or_else(|| ToolError::InvalidArgument(format!("Missing required parameter: {}", key)))
}

pub fn optional_array<'a>(input: &'a Value, key: &str) -> Result<&'a [Value], ToolError> {
    match input.get(key) {
        Some(Value::Array(items)) => Ok(items),
        Some(Value::Null) | None => Ok(&[]),
        Some(_) => Err(ToolError::InvalidArgument(format!("{} must be a list", key))),
    }
}

pub fn optional_string_list(input: &Value, key: &str) -> Result<Option<Vec<String>>, ToolError> {
    match input.get(key) {
        Some(Value::Null) | None => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ToolError::InvalidArgument(format!("{} must be a list of strings", key)))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(ToolError::InvalidArgument(format!("{} must be a list of strings", key))),
    }
}

pub fn optional_object<'a>(input: &'a Value, key: &str) -> Result<Option<&'a Map<String, Value>>, ToolError> {
    match input.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(Value::Null) | None => Ok(None),
        Some(_) => Err(ToolError::InvalidArgument(format!("{} must be an object", key))),
    }
}
