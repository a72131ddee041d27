use crate::app::App;
use crate::config::Config;
use crate::errors::{ErrorCode, McpError, ToolError, ToolErrorKind};
use crate::mcp::catalog::{list_tools, validate_tool_args, TOOL_SEMANTIC_FIELDS};
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse};
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

const PROTOCOL_VERSION: &str = "2025-06-18";
const SERVER_NAME: &str = "analytics-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

fn map_tool_error(tool: &str, error: &ToolError) -> McpError {
    let mut lines = vec![
        format!("tool: {}", tool),
        format!("code: {}", error.code),
        format!("retryable: {}", error.retryable),
        format!("message: {}", error.message),
    ];
    if let Some(hint) = &error.hint {
        lines.push(format!("hint: {}", hint));
    }
    let code = match error.kind {
        ToolErrorKind::InvalidParams => ErrorCode::InvalidParams,
        ToolErrorKind::Timeout => ErrorCode::RequestTimeout,
        _ => ErrorCode::InternalError,
    };
    let data = serde_json::to_value(error).unwrap_or(Value::Null);
    McpError::new(code, lines.join("\n")).with_data(data)
}

fn split_semantic_fields(args: Value) -> (Value, Option<String>) {
    let Value::Object(mut map) = args else {
        return (Value::Object(Default::default()), None);
    };
    let trace_id = map
        .get("trace_id")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    for key in TOOL_SEMANTIC_FIELDS {
        map.remove(*key);
    }
    (Value::Object(map), trace_id)
}

pub struct McpServer {
    app: Arc<App>,
}

impl McpServer {
    pub fn new(app: Arc<App>) -> Self {
        Self { app }
    }

    fn handle_initialize(&self) -> Value {
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"tools": {"listChanged": false}},
            "serverInfo": {"name": SERVER_NAME, "version": SERVER_VERSION},
        })
    }

    fn handle_tools_list(&self) -> Value {
        let tools: Vec<_> = list_tools()
            .into_iter()
            .filter(|tool| self.app.tool_executor.has_tool(&tool.name))
            .collect();
        serde_json::json!({ "tools": tools })
    }

    async fn handle_tools_call(&self, params: &Value) -> Result<Value, McpError> {
        let name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
        if name.is_empty() {
            return Err(McpError::new(ErrorCode::InvalidParams, "Missing tool name"));
        }
        if !self.app.tool_executor.has_tool(name) {
            let err = self.app.tool_executor.unknown_tool_error(name);
            return Err(map_tool_error(name, &err));
        }
        let raw_args = params.get("arguments").cloned().unwrap_or(Value::Null);
        let (args, trace_id) = split_semantic_fields(raw_args);
        validate_tool_args(name, &args)?;

        let payload = self
            .app
            .tool_executor
            .execute(name, args, trace_id)
            .await
            .map_err(|err| map_tool_error(name, &err))?;

        let text = serde_json::to_string(&payload).unwrap_or_else(|_| "{}".to_string());
        Ok(serde_json::json!({
            "content": [ { "type": "text", "text": text } ]
        }))
    }

    /// Handles one inbound line. Returns `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let parsed: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(_) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    McpError::new(ErrorCode::ParseError, "Parse error"),
                ))
            }
        };
        let request: JsonRpcRequest = match serde_json::from_value(parsed) {
            Ok(req) => req,
            Err(_) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    McpError::new(ErrorCode::InvalidRequest, "Invalid request"),
                ))
            }
        };
        if request.is_notification() {
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.handle_initialize()),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => Ok(self.handle_tools_list()),
            "tools/call" => self.handle_tools_call(&request.params).await,
            _ => Err(McpError::new(ErrorCode::MethodNotFound, "Method not found")),
        };
        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => JsonRpcResponse::failure(id, err),
        })
    }

    pub async fn run<R, W>(&self, reader: R, writer: W) -> Result<(), ToolError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut writer = BufWriter::new(writer);
        while let Some(line) = lines.next_line().await? {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(trimmed).await {
                let payload = serde_json::to_string(&response)
                    .map_err(|err| ToolError::internal(err.to_string()))?;
                writer.write_all(payload.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }
        self.app
            .logger
            .info("stdin closed, shutting down", Some(&self.app.logger.stats()));
        Ok(())
    }
}

pub async fn run_stdio(config: Config) -> Result<(), ToolError> {
    let app = Arc::new(App::initialize(config)?);
    app.logger.info(
        "server started",
        Some(&serde_json::json!({ "version": SERVER_VERSION })),
    );
    let server = McpServer::new(app);
    server
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
}
