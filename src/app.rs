use crate::config::Config;
use crate::errors::ToolError;
use crate::managers::datasets::DatasetManager;
use crate::managers::jobs::JobManager;
use crate::managers::sessions::SessionManager;
use crate::managers::upload::UploadManager;
use crate::mcp::catalog::tool_catalog;
use crate::services::http_client::{ApiTransport, HttpClient};
use crate::services::logger::Logger;
use crate::services::platform::PlatformClient;
use crate::services::tool_executor::{ToolExecutor, ToolHandler};
use crate::services::upload::{UploadCoordinator, UploadOptions};
use crate::services::validation::Validation;
use std::collections::HashMap;
use std::sync::Arc;

pub struct App {
    pub logger: Logger,
    pub tool_executor: Arc<ToolExecutor>,
}

impl App {
    fn validate_tool_wiring(handlers: &HashMap<String, Arc<dyn ToolHandler>>) -> Result<(), ToolError> {
        let mut missing: Vec<String> = tool_catalog()
            .iter()
            .filter(|tool| !handlers.contains_key(&tool.name))
            .map(|tool| tool.name.clone())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        Err(ToolError::internal("Tool wiring is incomplete")
            .with_hint("Every tool in tool_catalog.json must have a handler")
            .with_details(serde_json::json!({ "missing_tools": missing })))
    }

    pub fn initialize(config: Config) -> Result<Self, ToolError> {
        let logger = Logger::new("analytics-mcp", config.log_level);
        let http = HttpClient::new(logger.clone(), &config)?;
        Self::with_transport(logger, Arc::new(http), &config.user_id, UploadOptions::default())
    }

    /// Wires every manager against an arbitrary transport.
    pub fn with_transport(
        logger: Logger,
        transport: Arc<dyn ApiTransport>,
        user_id: &str,
        upload_options: UploadOptions,
    ) -> Result<Self, ToolError> {
        let validation = Validation::new();
        let platform = PlatformClient::new(transport, user_id);
        let coordinator = UploadCoordinator::new(logger.clone(), platform.clone(), upload_options);

        let dataset_manager = Arc::new(DatasetManager::new(
            logger.clone(),
            validation.clone(),
            platform.clone(),
        ));
        let session_manager = Arc::new(SessionManager::new(
            logger.clone(),
            validation.clone(),
            platform.clone(),
        ));
        let job_manager = Arc::new(JobManager::new(
            logger.clone(),
            validation.clone(),
            platform.clone(),
        ));
        let upload_manager = Arc::new(UploadManager::new(
            logger.clone(),
            validation,
            platform,
            coordinator,
        ));

        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        for tool in DatasetManager::tools() {
            handlers.insert(tool.to_string(), dataset_manager.clone());
        }
        for tool in SessionManager::tools() {
            handlers.insert(tool.to_string(), session_manager.clone());
        }
        for tool in JobManager::tools() {
            handlers.insert(tool.to_string(), job_manager.clone());
        }
        for tool in UploadManager::tools() {
            handlers.insert(tool.to_string(), upload_manager.clone());
        }

        Self::validate_tool_wiring(&handlers)?;

        let tool_executor = Arc::new(ToolExecutor::new(logger.clone(), handlers));
        Ok(Self {
            logger,
            tool_executor,
        })
    }
}
