use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolError, ToolResult, args};

/// Map `$name` system objects to CURIEs
pub struct ListSysobjsTool;

#[async_trait]
impl Tool for ListSysobjsTool {
    fn name(&self) -> &'static str {
        "moor_list_sysobjs"
    }

    fn description(&self) -> &'static str {
        "Return a mapping of system object names ($name) to object CURIEs. \
         Without names, lists every object-valued property of #0."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "names": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Names to look up; missing ones map to null"
                }
            }
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "ListSysobjsTool::execute: called");
        ToolResult::from(list(&input, ctx).await)
    }
}

async fn list(input: &Value, ctx: &ToolContext) -> Result<Value, ToolError> {
    let names = args::optional_string_list(input, "names")?;
    let map = ctx.client.list_sysobjs(names.as_deref()).await?;
    Ok(Value::Object(map))
}
