use crate::errors::ApiError;
use crate::services::http_client::ApiTransport;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartItem {
    pub number: u32,
    pub size: u64,
    pub upload_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InitUploadResponse {
    pub upload_id: String,
    pub file_object_key: String,
    pub part_items: Vec<PartItem>,
}

/// `{number, etag}` pair sent to the completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartEtag {
    pub number: u32,
    pub etag: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompleteUploadResponse {
    pub file_object_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSourceStatus {
    Synching,
    Synched,
    Invalid,
    Other(String),
}

impl DataSourceStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "synching" => DataSourceStatus::Synching,
            "synched" => DataSourceStatus::Synched,
            "invalid" => DataSourceStatus::Invalid,
            other => DataSourceStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for DataSourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceStatus::Synching => write!(f, "synching"),
            DataSourceStatus::Synched => write!(f, "synched"),
            DataSourceStatus::Invalid => write!(f, "invalid"),
            DataSourceStatus::Other(raw) => write!(f, "{}", raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<String>,
}

impl DataSourceRecord {
    pub fn status(&self) -> DataSourceStatus {
        DataSourceStatus::parse(self.status.as_deref().unwrap_or(""))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub page_number: u64,
    #[serde(default)]
    pub page_size: u64,
    #[serde(default)]
    pub total_items: u64,
    #[serde(default = "Vec::new")]
    pub records: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetOverview {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub exploration_questions: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedEntity {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: String,
    #[serde(default)]
    pub blocks: Vec<JobBlock>,
}

#[derive(Debug, Clone, Default)]
pub struct PageQuery {
    pub page_number: u64,
    pub page_size: u64,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewSession {
    pub name: String,
    pub output_language: String,
    pub job_mode: String,
    pub max_contextual_job_history: u64,
    pub agent_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewJob {
    pub session_id: String,
    pub user_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasource_ids: Option<Vec<String>>,
    pub output_language: String,
    pub job_mode: String,
}

/// Typed wrappers over the platform endpoints. Every call carries `user_id`
/// and unwraps the `{code, message, data}` envelope.
#[derive(Clone)]
pub struct PlatformClient {
    transport: Arc<dyn ApiTransport>,
    user_id: String,
}

impl PlatformClient {
    pub fn new(transport: Arc<dyn ApiTransport>, user_id: impl Into<String>) -> Self {
        Self {
            transport,
            user_id: user_id.into(),
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        mut query: Vec<(&str, String)>,
    ) -> Result<T, ApiError> {
        query.push(("user_id", self.user_id.clone()));
        let raw = self.transport.get_json(path, &query).await?;
        decode(unwrap_envelope(raw)?)
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T, ApiError> {
        let mut body = body;
        if let Value::Object(map) = &mut body {
            map.insert("user_id".to_string(), Value::String(self.user_id.clone()));
        }
        let raw = self.transport.post_json(path, &body).await?;
        decode(unwrap_envelope(raw)?)
    }

    pub async fn init_multipart_upload(
        &self,
        file_name: &str,
        file_size: u64,
    ) -> Result<InitUploadResponse, ApiError> {
        self.post(
            "file/init-multipart-upload",
            serde_json::json!({ "file_name": file_name, "file_size": file_size }),
        )
        .await
    }

    pub async fn upload_part(&self, upload_url: &str, body: Bytes) -> Result<Option<String>, ApiError> {
        self.transport.put_part(upload_url, body).await
    }

    pub async fn complete_multipart_upload(
        &self,
        file_object_key: &str,
        upload_id: &str,
        part_etags: &[PartEtag],
    ) -> Result<CompleteUploadResponse, ApiError> {
        self.post(
            "file/complete-multipart-upload",
            serde_json::json!({
                "file_object_key": file_object_key,
                "upload_id": upload_id,
                "part_etags": part_etags,
            }),
        )
        .await
    }

    pub async fn create_data_source(
        &self,
        dataset_id: &str,
        name: &str,
        file_object_key: &str,
    ) -> Result<DataSourceRecord, ApiError> {
        let path = format!("datasets/{}/datasources", path_segment(dataset_id)?);
        self.post(
            &path,
            serde_json::json!({
                "name": name,
                "type": crate::constants::upload::DATA_SOURCE_TYPE,
                "file_object_key": file_object_key,
            }),
        )
        .await
    }

    pub async fn get_data_source(
        &self,
        dataset_id: &str,
        data_source_id: &str,
    ) -> Result<DataSourceRecord, ApiError> {
        let path = format!(
            "datasets/{}/datasources/{}",
            path_segment(dataset_id)?,
            path_segment(data_source_id)?
        );
        self.get(&path, Vec::new()).await
    }

    pub async fn list_datasets(&self, page: &PageQuery) -> Result<Page<DatasetSummary>, ApiError> {
        self.get("datasets", page_params(page)).await
    }

    pub async fn get_dataset_overview(&self, dataset_id: &str) -> Result<DatasetOverview, ApiError> {
        let path = format!("datasets/{}/overview", path_segment(dataset_id)?);
        self.get(&path, Vec::new()).await
    }

    pub async fn create_dataset(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<CreatedEntity, ApiError> {
        let mut body = serde_json::json!({ "name": name });
        if let Some(description) = description {
            body["description"] = Value::String(description.to_string());
        }
        self.post("datasets", body).await
    }

    pub async fn list_data_sources(
        &self,
        dataset_id: &str,
        page: &PageQuery,
        status: Option<&str>,
    ) -> Result<Page<DataSourceRecord>, ApiError> {
        let path = format!("datasets/{}/datasources", path_segment(dataset_id)?);
        let mut query = page_params(page);
        if let Some(status) = status {
            query.push(("status", status.to_string()));
        }
        self.get(&path, query).await
    }

    pub async fn create_session(&self, session: &NewSession) -> Result<CreatedEntity, ApiError> {
        let body = serde_json::to_value(session).map_err(|err| ApiError::InvalidRequest(err.to_string()))?;
        self.post("sessions", body).await
    }

    pub async fn list_sessions(&self, page: &PageQuery) -> Result<Page<SessionRecord>, ApiError> {
        self.get("sessions", page_params(page)).await
    }

    pub async fn create_job(&self, job: &NewJob) -> Result<JobResult, ApiError> {
        let mut body = serde_json::to_value(job).map_err(|err| ApiError::InvalidRequest(err.to_string()))?;
        body["stream"] = Value::Bool(false);
        self.post("jobs", body).await
    }
}

fn page_params(page: &PageQuery) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("page_number", page.page_number.to_string()),
        ("page_size", page.page_size.to_string()),
    ];
    if let Some(search) = page.search.as_ref().filter(|s| !s.trim().is_empty()) {
        query.push(("search", search.trim().to_string()));
    }
    query
}

fn path_segment(id: &str) -> Result<&str, ApiError> {
    let trimmed = id.trim();
    if trimmed.is_empty() || trimmed.contains(['/', '?', '#', '\\']) || trimmed == ".." {
        return Err(ApiError::InvalidRequest(format!("invalid identifier '{}'", id)));
    }
    Ok(trimmed)
}

/// Unwraps the platform's `{code, message, data}` envelope. Bodies without a
/// `code` field are passed through as-is.
pub(crate) fn unwrap_envelope(raw: Value) -> Result<Value, ApiError> {
    let Value::Object(mut map) = raw else {
        return Err(ApiError::Decode("expected a JSON object".to_string()));
    };
    let Some(code) = map.get("code") else {
        return Ok(Value::Object(map));
    };
    let code = code.as_i64().unwrap_or(-1);
    if code != 0 {
        let message = map
            .get("message")
            .or_else(|| map.get("msg"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
            .to_string();
        return Err(ApiError::Platform { code, message });
    }
    match map.remove("data") {
        Some(Value::Null) | None => Err(ApiError::MissingField("data")),
        Some(data) => Ok(data),
    }
}

fn decode<T: DeserializeOwned>(data: Value) -> Result<T, ApiError> {
    serde_json::from_value(data).map_err(|err| ApiError::Decode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_with_nonzero_code_is_a_platform_error() {
        let err = unwrap_envelope(serde_json::json!({"code": 10001, "message": "bad key"}))
            .unwrap_err();
        match err {
            ApiError::Platform { code, message } => {
                assert_eq!(code, 10001);
                assert_eq!(message, "bad key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn envelope_without_data_is_missing_field() {
        let err = unwrap_envelope(serde_json::json!({"code": 0})).unwrap_err();
        assert!(matches!(err, ApiError::MissingField("data")));
    }

    #[test]
    fn bare_bodies_pass_through() {
        let data = unwrap_envelope(serde_json::json!({"id": "x"})).expect("data");
        assert_eq!(data["id"], "x");
    }

    #[test]
    fn status_parsing_is_case_insensitive() {
        assert_eq!(DataSourceStatus::parse("SYNCHED"), DataSourceStatus::Synched);
        assert_eq!(DataSourceStatus::parse("invalid"), DataSourceStatus::Invalid);
        assert_eq!(
            DataSourceStatus::parse("pending"),
            DataSourceStatus::Other("pending".to_string())
        );
    }

    #[test]
    fn path_segments_reject_traversal() {
        assert!(path_segment("ds-1").is_ok());
        assert!(path_segment("a/b").is_err());
        assert!(path_segment("..").is_err());
        assert!(path_segment("  ").is_err());
    }

    #[test]
    fn init_response_requires_part_items() {
        let raw = serde_json::json!({"upload_id": "u", "file_object_key": "k"});
        let err = decode::<InitUploadResponse>(raw).unwrap_err();
        assert!(err.to_string().contains("part_items"));
    }
}
