pub mod file_reader;
pub mod http_client;
pub mod logger;
pub mod platform;
pub mod tool_executor;
pub mod upload;
pub mod validation;
