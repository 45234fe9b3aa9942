//! Session tools: log in and out

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolError, ToolResult, args};

/// Log in and cache the session token
pub struct ConnectAuthTool;

#[async_trait]
impl Tool for ConnectAuthTool {
    fn name(&self) -> &'static str {
        "moor_connect_auth"
    }

    fn description(&self) -> &'static str {
        "Authenticate with the mooR server. Omitted player/password fall back to the last used or configured credentials."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "player": {
                    "type": "string",
                    "description": "Player name"
                },
                "password": {
                    "type": "string",
                    "description": "Player password"
                }
            }
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        // Input holds the password; log nothing from it
        debug!("ConnectAuthTool::execute: called");
        ToolResult::from(connect(&input, ctx).await)
    }
}

async fn connect(input: &Value, ctx: &ToolContext) -> Result<Value, ToolError> {
    let player = args::optional_str(input, "player")?;
    let password = args::optional_str(input, "password")?;
    let outcome = ctx.client.connect(player, password).await?;
    Ok(json!({"ok": outcome.ok, "player": outcome.player}))
}

/// Drop the session token
pub struct DisconnectAuthTool;

#[async_trait]
impl Tool for DisconnectAuthTool {
    fn name(&self) -> &'static str {
        "moor_disconnect_auth"
    }

    fn description(&self) -> &'static str {
        "Discard the cached session token. With clear_defaults, also forget the credentials of the last login."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "clear_defaults": {
                    "type": "boolean",
                    "description": "Forget remembered credentials too (default: false)",
                    "default": false
                }
            }
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "DisconnectAuthTool::execute: called");
        let forget = match args::optional_bool(&input, "clear_defaults", false) {
            Ok(forget) => forget,
            Err(e) => return ToolResult::from(Err::<Value, _>(e)),
        };
        let outcome = ctx.client.disconnect(forget).await;
        ToolResult::success(json!({"ok": outcome.ok}))
    }
}
