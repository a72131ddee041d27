use crate::constants::upload as defaults;
use crate::errors::ToolError;
use crate::services::logger::Logger;
use crate::services::platform::PlatformClient;
use crate::services::upload::{UploadCoordinator, UploadRequest};
use crate::services::validation::Validation;
use crate::utils::tool_errors::unknown_tool_error;
use serde_json::Value;
use std::path::PathBuf;

const UPLOAD_TOOLS: &[&str] = &[
    "create_data_source_from_local_file",
    "create_dataset_from_local_file",
];

#[derive(Clone)]
pub struct UploadManager {
    logger: Logger,
    validation: Validation,
    platform: PlatformClient,
    coordinator: UploadCoordinator,
}

impl UploadManager {
    pub fn new(
        logger: Logger,
        validation: Validation,
        platform: PlatformClient,
        coordinator: UploadCoordinator,
    ) -> Self {
        Self {
            logger: logger.child("upload-tools"),
            validation,
            platform,
            coordinator,
        }
    }

    pub fn tools() -> &'static [&'static str] {
        UPLOAD_TOOLS
    }

    pub async fn handle_action(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        match tool {
            "create_data_source_from_local_file" => self.create_data_source(&args).await,
            "create_dataset_from_local_file" => self.create_dataset_with_file(&args).await,
            _ => Err(unknown_tool_error("upload", tool, UPLOAD_TOOLS)),
        }
    }

    fn upload_request(&self, dataset_id: String, args: &Value) -> Result<UploadRequest, ToolError> {
        let v = &self.validation;
        let file_path = v.ensure_string(args.get("file_path"), "file_path")?;
        let concurrency = v
            .ensure_optional_positive_int(args.get("concurrency"), "concurrency")?
            .map(|n| n as usize)
            .unwrap_or(defaults::DEFAULT_CONCURRENCY);
        Ok(UploadRequest {
            dataset_id,
            file_path: expand_home(&file_path),
            file_name: v.ensure_optional_string(args.get("file_name"), "file_name")?,
            chunk_size: v.ensure_optional_positive_int(args.get("chunk_size"), "chunk_size")?,
            concurrency,
        })
    }

    async fn create_data_source(&self, args: &Value) -> Result<Value, ToolError> {
        let dataset_id = self.validation.ensure_string(args.get("dataset_id"), "dataset_id")?;
        let request = self.upload_request(dataset_id, args)?;
        let outcome = self.coordinator.upload(request).await?;
        serde_json::to_value(outcome).map_err(|err| ToolError::internal(err.to_string()))
    }

    async fn create_dataset_with_file(&self, args: &Value) -> Result<Value, ToolError> {
        let name = self.validation.ensure_string(args.get("name"), "name")?;
        let description = self
            .validation
            .ensure_optional_string(args.get("description"), "description")?;
        // Validate upload arguments before creating anything remotely.
        let mut request = self.upload_request(String::new(), args)?;

        let dataset = self
            .platform
            .create_dataset(&name, description.as_deref())
            .await?;
        self.logger.info(
            "dataset created for upload",
            Some(&serde_json::json!({ "dataset_id": dataset.id })),
        );

        request.dataset_id = dataset.id.clone();
        // The dataset stays behind on failure; report its id so the caller can reuse it.
        let outcome = self.coordinator.upload(request).await.map_err(|err| {
            let mut tool_err = ToolError::from(err);
            let mut details = tool_err
                .details
                .take()
                .unwrap_or_else(|| serde_json::json!({}));
            if let Value::Object(map) = &mut details {
                map.insert("dataset_id".to_string(), Value::String(dataset.id.clone()));
            }
            tool_err.with_details(details)
        })?;
        Ok(serde_json::json!({
            "dataset": { "id": dataset.id, "name": name },
            "upload": outcome,
        }))
    }
}

fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(raw)
}

#[async_trait::async_trait]
impl crate::services::tool_executor::ToolHandler for UploadManager {
    async fn handle(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        self.handle_action(tool, args).await
    }
}
