//! Event history and presentation tools

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolError, ToolResult, args};

/// Read the player's recent event history
pub struct GetHistoryTool;

#[async_trait]
impl Tool for GetHistoryTool {
    fn name(&self) -> &'static str {
        "moor_get_history"
    }

    fn description(&self) -> &'static str {
        "Fetch recent narrative events for the connected player."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "since_seconds": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Only events from the last N seconds"
                },
                "limit": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Maximum number of events"
                }
            }
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "GetHistoryTool::execute: called");
        ToolResult::from(history(&input, ctx).await)
    }
}

async fn history(input: &Value, ctx: &ToolContext) -> Result<Value, ToolError> {
    let since_seconds = args::optional_u64(input, "since_seconds")?;
    let limit = args::optional_u64(input, "limit")?;
    Ok(ctx.client.get_history(since_seconds, limit).await?)
}

/// List active presentations
pub struct ListPresentationsTool;

#[async_trait]
impl Tool for ListPresentationsTool {
    fn name(&self) -> &'static str {
        "moor_list_presentations"
    }

    fn description(&self) -> &'static str {
        "List the presentations (panels, windows) currently shown to the player."
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _input: Value, ctx: &ToolContext) -> ToolResult {
        debug!("ListPresentationsTool::execute: called");
        ToolResult::from(ctx.client.list_presentations().await.map_err(ToolError::from))
    }
}

/// Dismiss a presentation
pub struct DismissPresentationTool;

#[async_trait]
impl Tool for DismissPresentationTool {
    fn name(&self) -> &'static str {
        "moor_dismiss_presentation"
    }

    fn description(&self) -> &'static str {
        "Dismiss a presentation by id."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "presentation_id": { "type": "string", "description": "Presentation id" }
            },
            "required": ["presentation_id"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "DismissPresentationTool::execute: called");
        ToolResult::from(dismiss(&input, ctx).await)
    }
}

async fn dismiss(input: &Value, ctx: &ToolContext) -> Result<Value, ToolError> {
    let id = args::require_str(input, "presentation_id")?;
    Ok(ctx.client.dismiss_presentation(id).await?)
}
