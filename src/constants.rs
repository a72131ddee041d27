pub mod network {
    pub const DEFAULT_API_URL: &str = "https://ai.data.cloud/api/v2/team";
    pub const API_KEY_HEADER: &str = "x-pd-api-key";
    pub const TIMEOUT_API_REQUEST_MS: u64 = 30_000;
    pub const TIMEOUT_CONNECTION_MS: u64 = 5_000;
}

pub mod upload {
    pub const DEFAULT_CHUNK_SIZE: u64 = 5 * 1024 * 1024;
    pub const POLL_INTERVAL_MS: u64 = 3_000;
    pub const MAX_POLL_ATTEMPTS: u32 = 20;
    pub const DEFAULT_CONCURRENCY: usize = 1;
    pub const MAX_CONCURRENCY: usize = 8;
    pub const DATA_SOURCE_TYPE: &str = "FILE";
    pub const OCTET_STREAM: &str = "application/octet-stream";
}

pub mod pagination {
    pub const DEFAULT_PAGE_NUMBER: u64 = 1;
    pub const DEFAULT_PAGE_SIZE: u64 = 10;
}

pub mod jobs {
    pub const DEFAULT_OUTPUT_LANGUAGE: &str = "AUTO";
    pub const DEFAULT_JOB_MODE: &str = "AUTO";
    pub const DEFAULT_MAX_CONTEXTUAL_JOB_HISTORY: u64 = 10;
    pub const DEFAULT_AGENT_ID: &str = "DATA_ANALYSIS_AGENT";
}

pub mod env {
    pub const USER_ID: &str = "ANALYTICS_USER_ID";
    pub const API_KEY: &str = "ANALYTICS_API_KEY";
    pub const API_URL: &str = "ANALYTICS_API_URL";
    pub const TIMEOUT_MS: &str = "ANALYTICS_TIMEOUT_MS";
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
}
