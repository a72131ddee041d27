use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// JSON-RPC error codes the server answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    /// Line was not valid JSON.
    ParseError,
    /// JSON that is not a request object (e.g. no `method`).
    InvalidRequest,
    /// Method other than initialize, ping, tools/list, tools/call.
    MethodNotFound,
    /// Unknown tool, schema violation, or a tool rejecting its arguments.
    InvalidParams,
    /// Upstream and local failures that are not the caller's fault.
    InternalError,
    /// A platform call or data source sync ran out of time.
    RequestTimeout,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        match self {
            ErrorCode::ParseError => -32700,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
            ErrorCode::RequestTimeout => -32001,
        }
    }
}

/// Protocol-level failure; `data` carries the structured tool error when
/// there is one.
#[derive(Debug, Clone, Serialize)]
pub struct McpError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl McpError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl fmt::Display for McpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_i32(), self.message)
    }
}

impl std::error::Error for McpError {}
