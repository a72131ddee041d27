use crate::errors::ToolError;
use crate::managers::page_query;
use crate::services::logger::Logger;
use crate::services::platform::PlatformClient;
use crate::services::validation::Validation;
use crate::utils::tool_errors::unknown_tool_error;
use serde_json::Value;

const DATASET_TOOLS: &[&str] = &[
    "list_datasets",
    "get_dataset_overview",
    "create_dataset",
    "list_data_sources",
];

#[derive(Clone)]
pub struct DatasetManager {
    logger: Logger,
    validation: Validation,
    platform: PlatformClient,
}

impl DatasetManager {
    pub fn new(logger: Logger, validation: Validation, platform: PlatformClient) -> Self {
        Self {
            logger: logger.child("datasets"),
            validation,
            platform,
        }
    }

    pub fn tools() -> &'static [&'static str] {
        DATASET_TOOLS
    }

    pub async fn handle_action(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        match tool {
            "list_datasets" => self.list_datasets(&args).await,
            "get_dataset_overview" => self.get_dataset_overview(&args).await,
            "create_dataset" => self.create_dataset(&args).await,
            "list_data_sources" => self.list_data_sources(&args).await,
            _ => Err(unknown_tool_error("dataset", tool, DATASET_TOOLS)),
        }
    }

    async fn list_datasets(&self, args: &Value) -> Result<Value, ToolError> {
        let page = page_query(&self.validation, args)?;
        let listing = self.platform.list_datasets(&page).await?;
        Ok(serde_json::json!({
            "page_number": listing.page_number,
            "page_size": listing.page_size,
            "total_items": listing.total_items,
            "datasets": listing.records,
        }))
    }

    async fn get_dataset_overview(&self, args: &Value) -> Result<Value, ToolError> {
        let dataset_id = self.validation.ensure_string(args.get("dataset_id"), "dataset_id")?;
        let overview = self.platform.get_dataset_overview(&dataset_id).await?;
        serde_json::to_value(overview).map_err(|err| ToolError::internal(err.to_string()))
    }

    async fn create_dataset(&self, args: &Value) -> Result<Value, ToolError> {
        let name = self.validation.ensure_string(args.get("name"), "name")?;
        let description = self
            .validation
            .ensure_optional_string(args.get("description"), "description")?;
        let created = self
            .platform
            .create_dataset(&name, description.as_deref())
            .await?;
        self.logger.info(
            "dataset created",
            Some(&serde_json::json!({ "dataset_id": created.id })),
        );
        Ok(serde_json::json!({ "id": created.id, "name": name }))
    }

    async fn list_data_sources(&self, args: &Value) -> Result<Value, ToolError> {
        let dataset_id = self.validation.ensure_string(args.get("dataset_id"), "dataset_id")?;
        let page = page_query(&self.validation, args)?;
        let status = self.validation.ensure_optional_string(args.get("status"), "status")?;
        let listing = self
            .platform
            .list_data_sources(&dataset_id, &page, status.as_deref())
            .await?;
        let data_sources: Vec<Value> = listing
            .records
            .into_iter()
            .map(|record| {
                serde_json::json!({
                    "id": record.id,
                    "name": record.name,
                    "type": record.kind,
                    "status": record.status,
                    "size": record.size,
                    "dataset_id": record.dataset_id.unwrap_or_else(|| dataset_id.clone()),
                })
            })
            .collect();
        Ok(serde_json::json!({
            "dataset_id": dataset_id,
            "page_number": listing.page_number,
            "page_size": listing.page_size,
            "total_items": listing.total_items,
            "data_sources": data_sources,
        }))
    }
}

#[async_trait::async_trait]
impl crate::services::tool_executor::ToolHandler for DatasetManager {
    async fn handle(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        self.handle_action(tool, args).await
    }
}
