use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::ToolError;
use crate::services::logger::Logger;
use crate::utils::suggest::suggest;

use serde_json::Value;

/// A family of tools. `tool` is the name the call was routed under, so one
/// handler can serve several related tools.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, tool: &str, args: Value) -> Result<Value, ToolError>;
}

#[derive(Clone)]
pub struct ToolExecutor {
    logger: Logger,
    handlers: Arc<HashMap<String, Arc<dyn ToolHandler>>>,
}

impl ToolExecutor {
    pub fn new(logger: Logger, handlers: HashMap<String, Arc<dyn ToolHandler>>) -> Self {
        Self {
            logger: logger.child("executor"),
            handlers: Arc::new(handlers),
        }
    }

    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn has_tool(&self, tool: &str) -> bool {
        self.handlers.contains_key(tool)
    }

    pub fn unknown_tool_error(&self, tool: &str) -> ToolError {
        let suggestions = suggest(tool, &self.tool_names(), 3);
        let hint = if suggestions.is_empty() {
            "Call tools/list to see the available tools".to_string()
        } else {
            format!("Did you mean: {}?", suggestions.join(", "))
        };
        ToolError::invalid_params(format!("Unknown tool: {}", tool))
            .with_hint(hint)
            .with_details(serde_json::json!({ "did_you_mean": suggestions }))
    }

    /// Runs a tool and wraps its result as `{ok, result, meta}`.
    pub async fn execute(
        &self,
        tool: &str,
        args: Value,
        trace_id: Option<String>,
    ) -> Result<Value, ToolError> {
        let Some(handler) = self.handlers.get(tool) else {
            return Err(self.unknown_tool_error(tool));
        };
        let trace_id = trace_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let started_at = chrono::Utc::now().timestamp_millis();

        self.logger.debug(
            "tool call",
            Some(&serde_json::json!({ "tool": tool, "trace_id": trace_id })),
        );

        let result = handler.handle(tool, args).await;
        let duration_ms = chrono::Utc::now().timestamp_millis() - started_at;
        let result = match result {
            Ok(value) => value,
            Err(err) => {
                self.logger.warn(
                    "tool call failed",
                    Some(&serde_json::json!({
                        "tool": tool,
                        "trace_id": trace_id,
                        "code": err.code,
                        "duration_ms": duration_ms,
                    })),
                );
                return Err(err);
            }
        };

        Ok(serde_json::json!({
            "ok": true,
            "result": result,
            "meta": {
                "tool": tool,
                "trace_id": trace_id,
                "duration_ms": duration_ms,
            },
        }))
    }
}
