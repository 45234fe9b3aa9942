//! Tool trait definition

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::context::ToolContext;
use super::error::ToolError;

/// A tool that can be called by an MCP client
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name as advertised in `tools/list`
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> Value;

    /// Execute the tool
    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult;
}

/// Result of a tool execution
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub content: Value,
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(content: impl Into<Value>) -> Self {
        debug!("ToolResult::success: called");
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    /// Create an error result
    pub fn error(content: impl Into<Value>) -> Self {
        debug!("ToolResult::error: called");
        Self {
            content: content.into(),
            is_error: true,
        }
    }

    /// Content as text: strings verbatim, everything else as pretty JSON
    pub fn text(&self) -> String {
        match &self.content {
            Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        }
    }
}

impl From<Result<Value, ToolError>> for ToolResult {
    fn from(result: Result<Value, ToolError>) -> Self {
        match result {
            Ok(value) => Self::success(value),
            Err(e) => Self::error(e.to_json()),
        }
    }
}
