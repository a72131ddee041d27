use crate::constants::jobs as defaults;
use crate::errors::ToolError;
use crate::managers::page_query;
use crate::services::logger::Logger;
use crate::services::platform::{NewSession, PlatformClient};
use crate::services::validation::Validation;
use crate::utils::tool_errors::unknown_tool_error;
use serde_json::Value;

const SESSION_TOOLS: &[&str] = &["create_session", "list_sessions"];

#[derive(Clone)]
pub struct SessionManager {
    logger: Logger,
    validation: Validation,
    platform: PlatformClient,
}

impl SessionManager {
    pub fn new(logger: Logger, validation: Validation, platform: PlatformClient) -> Self {
        Self {
            logger: logger.child("sessions"),
            validation,
            platform,
        }
    }

    pub fn tools() -> &'static [&'static str] {
        SESSION_TOOLS
    }

    pub async fn handle_action(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        match tool {
            "create_session" => self.create_session(&args).await,
            "list_sessions" => self.list_sessions(&args).await,
            _ => Err(unknown_tool_error("session", tool, SESSION_TOOLS)),
        }
    }

    async fn create_session(&self, args: &Value) -> Result<Value, ToolError> {
        let v = &self.validation;
        let session = NewSession {
            name: v.ensure_string(args.get("name"), "name")?,
            output_language: v
                .ensure_optional_string(args.get("output_language"), "output_language")?
                .unwrap_or_else(|| defaults::DEFAULT_OUTPUT_LANGUAGE.to_string()),
            job_mode: v
                .ensure_optional_string(args.get("job_mode"), "job_mode")?
                .unwrap_or_else(|| defaults::DEFAULT_JOB_MODE.to_string()),
            // 0 is a legal history size, so this does not go through the positive-int check.
            max_contextual_job_history: args
                .get("max_contextual_job_history")
                .and_then(|v| v.as_u64())
                .unwrap_or(defaults::DEFAULT_MAX_CONTEXTUAL_JOB_HISTORY),
            agent_id: v
                .ensure_optional_string(args.get("agent_id"), "agent_id")?
                .unwrap_or_else(|| defaults::DEFAULT_AGENT_ID.to_string()),
        };
        let created = self.platform.create_session(&session).await?;
        self.logger.info(
            "session created",
            Some(&serde_json::json!({ "session_id": created.id })),
        );
        Ok(serde_json::json!({ "session_id": created.id, "name": session.name }))
    }

    async fn list_sessions(&self, args: &Value) -> Result<Value, ToolError> {
        let page = page_query(&self.validation, args)?;
        let listing = self.platform.list_sessions(&page).await?;
        Ok(serde_json::json!({
            "page_number": listing.page_number,
            "page_size": listing.page_size,
            "total_items": listing.total_items,
            "sessions": listing.records,
        }))
    }
}

#[async_trait::async_trait]
impl crate::services::tool_executor::ToolHandler for SessionManager {
    async fn handle(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        self.handle_action(tool, args).await
    }
}
