//! MCP server over newline-delimited JSON-RPC
//!
//! Each incoming line is handled on its own task so a slow tool call does not
//! hold up the rest; responses are funnelled through a single writer task and
//! may therefore arrive out of order, matched up by `id`.

use std::sync::Arc;

use eyre::{Context, Result};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::messages::{INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR, Request, Response};
use crate::tools::{ToolContext, ToolRegistry};

/// Protocol revision spoken by this server
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name reported in `initialize`
pub const SERVER_NAME: &str = "moor-mcp";

pub struct McpServer {
    registry: ToolRegistry,
    ctx: ToolContext,
}

impl McpServer {
    pub fn new(registry: ToolRegistry, ctx: ToolContext) -> Self {
        Self { registry, ctx }
    }

    /// Serve until `reader` reaches end of input
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        info!("McpServer::serve: started");
        let (tx, mut rx) = mpsc::channel::<String>(64);

        let writer_task = tokio::spawn(async move {
            let mut writer = writer;
            while let Some(line) = rx.recv().await {
                writer.write_all(line.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            Ok::<_, std::io::Error>(())
        });

        let mut lines = BufReader::new(reader).lines();
        let mut in_flight = InFlight::new();
        while let Some(line) = lines.next_line().await.context("Failed to read from stdin")? {
            if line.trim().is_empty() {
                continue;
            }
            let server = Arc::clone(&self);
            let tx = tx.clone();
            in_flight.spawn(async move {
                let Some(response) = server.handle_line(&line).await else {
                    return;
                };
                match serde_json::to_string(&response) {
                    Ok(json) => {
                        if tx.send(json).await.is_err() {
                            warn!("McpServer::serve: writer closed, dropping response");
                        }
                    }
                    Err(e) => warn!(error = %e, "McpServer::serve: failed to serialize response"),
                }
            });
        }

        in_flight.drain().await;
        drop(tx);
        writer_task
            .await
            .context("Writer task panicked")?
            .context("Failed to write response")?;
        info!("McpServer::serve: input closed, stopped");
        Ok(())
    }

    /// Handle one raw line; `None` when no response is due
    pub async fn handle_line(&self, line: &str) -> Option<Response> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "handle_line: parse error");
                return Some(Response::error(Value::Null, PARSE_ERROR, format!("Parse error: {}", e)));
            }
        };
        let id = value.get("id").cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<Request>(value) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => Some(Response::error(id, INVALID_REQUEST, format!("Invalid request: {}", e))),
        }
    }

    /// Dispatch a request by method
    pub async fn handle_request(&self, request: Request) -> Option<Response> {
        debug!(method = %request.method, id = ?request.id, "handle_request: called");
        if request.is_notification() {
            debug!(method = %request.method, "handle_request: notification, no response");
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);
        let params = request.params.unwrap_or_else(|| json!({}));

        let response = match request.method.as_str() {
            "initialize" => Response::success(id, self.initialize()),
            "ping" => Response::success(id, json!({})),
            "tools/list" => Response::success(id, json!({ "tools": self.registry.definitions() })),
            "tools/call" => match self.tools_call(&params).await {
                Ok(result) => Response::success(id, result),
                Err(message) => Response::error(id, INVALID_PARAMS, message),
            },
            other => Response::error(id, METHOD_NOT_FOUND, format!("Method not found: {}", other)),
        };
        Some(response)
    }

    fn initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        })
    }

    async fn tools_call(&self, params: &Value) -> Result<Value, String> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| "Missing tool name".to_string())?;
        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => json!({}),
            Some(args) => args.clone(),
        };
        info!(tool_name = %name, "tools_call: invoking tool");
        let result = self.registry.execute(name, arguments, &self.ctx).await;
        if result.is_error {
            debug!(tool_name = %name, "tools_call: tool reported an error");
        }
        Ok(json!({
            "content": [{ "type": "text", "text": result.text() }],
            "isError": result.is_error
        }))
    }
}

/// Request tasks still running
///
/// Finished tasks are reaped on every spawn so a long session holds only
/// the requests that are actually in flight.
struct InFlight {
    tasks: JoinSet<()>,
}

impl InFlight {
    fn new() -> Self {
        Self { tasks: JoinSet::new() }
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.reap();
        self.tasks.spawn(task);
    }

    fn reap(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            if let Err(e) = joined {
                warn!(error = %e, "InFlight::reap: request task failed");
            }
        }
    }

    fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for every remaining task
    async fn drain(&mut self) {
        debug!(remaining = self.len(), "InFlight::drain: waiting for requests");
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "InFlight::drain: request task failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtin::testing::offline_ctx;
    use std::collections::HashMap;
    use tokio::io::AsyncReadExt;

    fn server() -> McpServer {
        McpServer::new(ToolRegistry::standard(), offline_ctx())
    }

    async fn call(server: &McpServer, line: &str) -> Value {
        let response = server.handle_line(line).await.unwrap();
        serde_json::to_value(response).unwrap()
    }

    #[tokio::test]
    async fn test_initialize() {
        let response = call(&server(), r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#).await;
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(response["result"]["serverInfo"]["name"], "moor-mcp");
        assert!(response["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_tools_list() {
        let response = call(&server(), r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#).await;
        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 19);
        assert!(tools.iter().any(|t| t["name"] == "moor_eval_expr"));
        assert!(tools.iter().all(|t| t["inputSchema"].is_object()));
    }

    #[tokio::test]
    async fn test_tools_call_reports_tool_errors_in_result() {
        let line = r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"moor_eval_expr","arguments":{"expression":""}}}"#;
        let response = call(&server(), line).await;
        assert!(response.get("error").is_none());
        assert_eq!(response["result"]["isError"], true);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("InvalidArgument"));
    }

    #[tokio::test]
    async fn test_tools_call_unknown_tool() {
        let line = r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"moor_fly"}}"#;
        let response = call(&server(), line).await;
        assert_eq!(response["result"]["isError"], true);
        assert!(response["result"]["content"][0]["text"].as_str().unwrap().contains("moor_fly"));
    }

    #[tokio::test]
    async fn test_tools_call_missing_name() {
        let line = r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{}}"#;
        let response = call(&server(), line).await;
        assert_eq!(response["error"]["code"], INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let server = server();
        let response = call(&server, "{not json").await;
        assert_eq!(response["error"]["code"], PARSE_ERROR);
        assert_eq!(response["id"], Value::Null);

        let response = call(&server, r#"{"jsonrpc":"2.0","id":6,"method":"resources/list"}"#).await;
        assert_eq!(response["error"]["code"], METHOD_NOT_FOUND);

        let response = call(&server, r#"{"jsonrpc":"2.0","id":7}"#).await;
        assert_eq!(response["error"]["code"], INVALID_REQUEST);
        assert_eq!(response["id"], 7);
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let line = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
        assert!(server().handle_line(line).await.is_none());
    }

    #[tokio::test]
    async fn test_finished_requests_are_released() {
        let mut in_flight = InFlight::new();
        for _ in 0..500 {
            in_flight.spawn(async {});
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        in_flight.spawn(async {});
        assert_eq!(in_flight.len(), 1);

        in_flight.drain().await;
        assert_eq!(in_flight.len(), 0);
    }

    #[tokio::test]
    async fn test_serve_handles_many_requests() {
        let input: String = (1..=200)
            .map(|id| format!("{{\"jsonrpc\":\"2.0\",\"id\":{},\"method\":\"ping\"}}\n", id))
            .collect();
        let (writer, mut output) = tokio::io::duplex(64 * 1024);

        Arc::new(server()).serve(input.as_bytes(), writer).await.unwrap();

        let mut text = String::new();
        output.read_to_string(&mut text).await.unwrap();
        assert_eq!(text.lines().count(), 200);
    }

    #[tokio::test]
    async fn test_serve_answers_every_request() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"moor_disconnect_auth"}}"#,
            "\n",
        );
        let (writer, mut output) = tokio::io::duplex(64 * 1024);

        Arc::new(server()).serve(input.as_bytes(), writer).await.unwrap();

        let mut text = String::new();
        output.read_to_string(&mut text).await.unwrap();
        let responses: HashMap<i64, Value> = text
            .lines()
            .map(|line| serde_json::from_str::<Value>(line).unwrap())
            .map(|v| (v["id"].as_i64().unwrap(), v))
            .collect();

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[&1]["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(responses[&2]["result"], json!({}));
        assert_eq!(responses[&3]["result"]["isError"], false);
    }
}
