//! Property tools

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolError, ToolResult, args};

/// Set a property to a JSON value
pub struct SetPropertyTool;

#[async_trait]
impl Tool for SetPropertyTool {
    fn name(&self) -> &'static str {
        "moor_set_property"
    }

    fn description(&self) -> &'static str {
        "Set a property on an object. The value is any JSON value; {\"obj\": \"oid:<n>\"} denotes an object reference."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "object": { "type": "string", "description": "Object reference" },
                "property": { "type": "string", "description": "Property name" },
                "value": { "description": "New value" }
            },
            "required": ["object", "property", "value"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "SetPropertyTool::execute: called");
        ToolResult::from(set(&input, ctx).await)
    }
}

async fn set(input: &Value, ctx: &ToolContext) -> Result<Value, ToolError> {
    let object = args::require_str(input, "object")?;
    let property = args::require_str(input, "property")?;
    let value = args::require_value(input, "value")?;
    Ok(ctx.client.set_property(object, property, value).await?)
}

/// Read one property
pub struct GetPropertyTool;

#[async_trait]
impl Tool for GetPropertyTool {
    fn name(&self) -> &'static str {
        "moor_get_property"
    }

    fn description(&self) -> &'static str {
        "Read a property of an object."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "object": { "type": "string", "description": "Object reference" },
                "property": { "type": "string", "description": "Property name" }
            },
            "required": ["object", "property"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "GetPropertyTool::execute: called");
        ToolResult::from(get(&input, ctx).await)
    }
}

async fn get(input: &Value, ctx: &ToolContext) -> Result<Value, ToolError> {
    let object = args::require_str(input, "object")?;
    let property = args::require_str(input, "property")?;
    Ok(ctx.client.get_property(object, property).await?)
}

/// List an object's properties
pub struct ListPropertiesTool;

#[async_trait]
impl Tool for ListPropertiesTool {
    fn name(&self) -> &'static str {
        "moor_list_properties"
    }

    fn description(&self) -> &'static str {
        "List the properties defined on an object, optionally including inherited ones."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "object": { "type": "string", "description": "Object reference" },
                "inherited": {
                    "type": "boolean",
                    "description": "Include inherited properties (default: false)",
                    "default": false
                }
            },
            "required": ["object"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "ListPropertiesTool::execute: called");
        ToolResult::from(list(&input, ctx).await)
    }
}

async fn list(input: &Value, ctx: &ToolContext) -> Result<Value, ToolError> {
    let object = args::require_str(input, "object")?;
    let inherited = args::optional_bool(input, "inherited", false)?;
    Ok(ctx.client.list_properties(object, inherited).await?)
}
