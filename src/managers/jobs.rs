use crate::constants::jobs as defaults;
use crate::errors::ToolError;
use crate::services::logger::Logger;
use crate::services::platform::{JobBlock, NewJob, PlatformClient};
use crate::services::validation::Validation;
use crate::utils::tool_errors::unknown_tool_error;
use serde_json::Value;

const JOB_TOOLS: &[&str] = &["create_job"];

#[derive(Clone)]
pub struct JobManager {
    logger: Logger,
    validation: Validation,
    platform: PlatformClient,
}

impl JobManager {
    pub fn new(logger: Logger, validation: Validation, platform: PlatformClient) -> Self {
        Self {
            logger: logger.child("jobs"),
            validation,
            platform,
        }
    }

    pub fn tools() -> &'static [&'static str] {
        JOB_TOOLS
    }

    pub async fn handle_action(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        match tool {
            "create_job" => self.create_job(&args).await,
            _ => Err(unknown_tool_error("job", tool, JOB_TOOLS)),
        }
    }

    async fn create_job(&self, args: &Value) -> Result<Value, ToolError> {
        let v = &self.validation;
        let job = NewJob {
            session_id: v.ensure_string(args.get("session_id"), "session_id")?,
            user_prompt: v.ensure_string(args.get("question"), "question")?,
            dataset_id: v.ensure_optional_string(args.get("dataset_id"), "dataset_id")?,
            datasource_ids: v
                .ensure_optional_string_list(args.get("datasource_ids"), "datasource_ids")?,
            output_language: v
                .ensure_optional_string(args.get("output_language"), "output_language")?
                .unwrap_or_else(|| defaults::DEFAULT_OUTPUT_LANGUAGE.to_string()),
            job_mode: v
                .ensure_optional_string(args.get("job_mode"), "job_mode")?
                .unwrap_or_else(|| defaults::DEFAULT_JOB_MODE.to_string()),
        };
        let result = self.platform.create_job(&job).await?;
        self.logger.info(
            "job finished",
            Some(&serde_json::json!({
                "job_id": result.job_id,
                "blocks": result.blocks.len(),
            })),
        );
        Ok(serde_json::json!({
            "job_id": result.job_id,
            "session_id": job.session_id,
            "answer": answer_text(&result.blocks),
            "blocks": result.blocks,
        }))
    }
}

/// Joins the text of every `MESSAGE` block, in order.
fn answer_text(blocks: &[JobBlock]) -> Option<String> {
    let parts: Vec<&str> = blocks
        .iter()
        .filter(|block| block.kind.eq_ignore_ascii_case("MESSAGE"))
        .filter_map(|block| block.content.as_str())
        .filter(|text| !text.trim().is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    }
}

#[async_trait::async_trait]
impl crate::services::tool_executor::ToolHandler for JobManager {
    async fn handle(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        self.handle_action(tool, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(kind: &str, content: Value) -> JobBlock {
        JobBlock {
            kind: kind.to_string(),
            content,
            stage: None,
        }
    }

    #[test]
    fn answer_joins_message_blocks_only() {
        let blocks = vec![
            block("MESSAGE", Value::String("Revenue grew 12%.".into())),
            block("CODE", Value::String("SELECT 1".into())),
            block("MESSAGE", Value::String("Mostly in Q3.".into())),
        ];
        assert_eq!(
            answer_text(&blocks).as_deref(),
            Some("Revenue grew 12%.\n\nMostly in Q3.")
        );
        assert_eq!(answer_text(&[block("TABLE", serde_json::json!({}))]), None);
    }
}
