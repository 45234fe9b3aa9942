//! Tool error types

use moorrest::MoorError;
use serde_json::{Value, json};
use thiserror::Error;

/// Errors that can occur during tool execution
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {name}")]
    UnknownTool { name: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Moor(#[from] MoorError),
}

impl ToolError {
    /// Structured form reported back to the client
    pub fn to_json(&self) -> Value {
        match self {
            Self::UnknownTool { name } => json!({
                "kind": "UnknownTool",
                "message": self.to_string(),
                "tool": name,
            }),
            Self::InvalidArgument(message) => MoorError::invalid_argument(message.clone()).to_json(),
            Self::Moor(e) => e.to_json(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tool_names_the_tool() {
        let err = ToolError::UnknownTool {
            name: "moor_fly".to_string(),
        };
        let json = err.to_json();
        assert_eq!(json["tool"], "moor_fly");
        assert!(json["message"].as_str().unwrap().contains("moor_fly"));
    }

    #[test]
    fn test_invalid_argument_kind() {
        let json = ToolError::InvalidArgument("missing object".to_string()).to_json();
        assert_eq!(json["kind"], "InvalidArgument");
        assert_eq!(json["message"], "missing object");
    }

    #[test]
    fn test_moor_error_passes_through() {
        let err: ToolError = MoorError::authentication_required().into();
        assert_eq!(err.to_json()["kind"], "AuthenticationRequired");
        assert!(err.to_string().contains("AuthenticationRequired"));
    }
}
