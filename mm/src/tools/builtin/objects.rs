//! Object lifecycle tools

use async_trait::async_trait;
use moorrest::MoorError;
use serde_json::{Value, json};
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolError, ToolResult, args};

const OBJECT_HELP: &str = "Object reference: oid:<n>, sysobj:<name>, #<n>, $<name>, or a name to match";

/// Create a child object
pub struct CreateObjectTool;

#[async_trait]
impl Tool for CreateObjectTool {
    fn name(&self) -> &'static str {
        "moor_create_object"
    }

    fn description(&self) -> &'static str {
        "Create a new object with the given parent and owner, optionally setting initial property values."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "parent": { "type": "string", "description": OBJECT_HELP },
                "owner": { "type": "string", "description": OBJECT_HELP },
                "properties": {
                    "type": "object",
                    "description": "Property values to set on the new object; {\"obj\": \"oid:<n>\"} denotes an object"
                }
            },
            "required": ["parent", "owner"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "CreateObjectTool::execute: called");
        ToolResult::from(create(&input, ctx).await)
    }
}

async fn create(input: &Value, ctx: &ToolContext) -> Result<Value, ToolError> {
    let parent = args::require_str(input, "parent")?;
    let owner = args::require_str(input, "owner")?;
    let properties = args::optional_object(input, "properties")?;
    Ok(ctx.client.create_object(parent, owner, properties).await?)
}

/// Move an object into a new location
pub struct MoveObjectTool;

#[async_trait]
impl Tool for MoveObjectTool {
    fn name(&self) -> &'static str {
        "moor_move_object"
    }

    fn description(&self) -> &'static str {
        "Move an object into a destination object."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "object": { "type": "string", "description": OBJECT_HELP },
                "destination": { "type": "string", "description": OBJECT_HELP }
            },
            "required": ["object", "destination"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "MoveObjectTool::execute: called");
        ToolResult::from(move_object(&input, ctx).await)
    }
}

async fn move_object(input: &Value, ctx: &ToolContext) -> Result<Value, ToolError> {
    let object = args::require_str(input, "object")?;
    let destination = args::require_str(input, "destination")?;
    Ok(ctx.client.move_object(object, destination).await?)
}

/// Destroy an object
pub struct RecycleObjectTool;

#[async_trait]
impl Tool for RecycleObjectTool {
    fn name(&self) -> &'static str {
        "moor_recycle_object"
    }

    fn description(&self) -> &'static str {
        "Recycle (destroy) an object."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "object": { "type": "string", "description": OBJECT_HELP }
            },
            "required": ["object"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "RecycleObjectTool::execute: called");
        ToolResult::from(recycle(&input, ctx).await)
    }
}

async fn recycle(input: &Value, ctx: &ToolContext) -> Result<Value, ToolError> {
    let object = args::require_str(input, "object")?;
    Ok(ctx.client.recycle_object(object).await?)
}

/// Resolve a reference to its canonical CURIE
pub struct ResolveObjectTool;

#[async_trait]
impl Tool for ResolveObjectTool {
    fn name(&self) -> &'static str {
        "moor_resolve_object"
    }

    fn description(&self) -> &'static str {
        "Resolve any object reference to the server's canonical CURIE (e.g. oid:42)."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "object": { "type": "string", "description": OBJECT_HELP }
            },
            "required": ["object"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "ResolveObjectTool::execute: called");
        ToolResult::from(resolve(&input, ctx).await)
    }
}

async fn resolve(input: &Value, ctx: &ToolContext) -> Result<Value, ToolError> {
    let object = args::require_str(input, "object")?;
    match ctx.client.resolve_object(object).await? {
        Some(curie) => Ok(Value::String(curie)),
        None => Err(MoorError::request_failed("object could not be resolved")
            .with_status(404)
            .into()),
    }
}
