use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolError, ToolResult, args};

/// Evaluate MOO code on the server
pub struct EvalExprTool;

#[async_trait]
impl Tool for EvalExprTool {
    fn name(&self) -> &'static str {
        "moor_eval_expr"
    }

    fn description(&self) -> &'static str {
        "Evaluate a MOO expression or program. A single-line expression without `return` is returned automatically."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "MOO expression or multi-line program, e.g. `1 + 1` or `x = 2;\\nreturn x * 3;`"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!("EvalExprTool::execute: called");
        ToolResult::from(eval(&input, ctx).await)
    }
}

async fn eval(input: &Value, ctx: &ToolContext) -> Result<Value, ToolError> {
    let expression = args::require_text(input, "expression")?;
    Ok(ctx.client.eval_expr(expression).await?)
}
