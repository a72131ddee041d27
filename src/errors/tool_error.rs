use crate::errors::{ApiError, UploadError};
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    InvalidParams,
    NotFound,
    Timeout,
    Retryable,
    Upstream,
    Internal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub retryable: bool,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            hint: None,
            details: None,
            retryable: matches!(kind, ToolErrorKind::Timeout | ToolErrorKind::Retryable),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidParams, "INVALID_PARAMS", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::NotFound, "NOT_FOUND", message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Timeout, "TIMEOUT", message)
    }

    pub fn retryable(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Retryable, "RETRYABLE", message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Upstream, "UPSTREAM", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Internal, "INTERNAL", message)
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for ToolError {}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        ToolError::internal(err.to_string())
    }
}

impl From<ApiError> for ToolError {
    fn from(err: ApiError) -> Self {
        let message = err.to_string();
        match &err {
            ApiError::Timeout => ToolError::timeout(message),
            ApiError::InvalidRequest(_) => ToolError::invalid_params(message),
            ApiError::Http { status: 404, .. } => ToolError::not_found(message),
            ApiError::Http { status, .. } => {
                let mut out = if err.is_retryable() {
                    ToolError::retryable(message)
                } else {
                    ToolError::upstream(message)
                };
                out.code = format!("HTTP_{}", status);
                out.with_details(serde_json::json!({ "status": status }))
            }
            ApiError::Platform { code, .. } => ToolError::new(
                ToolErrorKind::Upstream,
                "PLATFORM_ERROR",
                message,
            )
            .with_details(serde_json::json!({ "platform_code": code })),
            ApiError::Network(_) => ToolError::retryable(message),
            ApiError::Decode(_) | ApiError::MissingField(_) => ToolError::upstream(message),
        }
    }
}

impl From<UploadError> for ToolError {
    fn from(err: UploadError) -> Self {
        let code = err.code();
        let message = err.to_string();
        match err {
            UploadError::InvalidRequest { .. } => {
                ToolError::new(ToolErrorKind::InvalidParams, code, message)
            }
            UploadError::FileNotFound { path } => {
                ToolError::new(ToolErrorKind::NotFound, code, message)
                    .with_hint("file_path must point to an existing, readable local file")
                    .with_details(serde_json::json!({ "file_path": path.display().to_string() }))
            }
            UploadError::PartFailed { part_number, .. } => {
                ToolError::new(ToolErrorKind::Upstream, code, message)
                    .with_hint("Parts are not retried individually; restart the whole upload")
                    .with_details(serde_json::json!({ "part_number": part_number }))
            }
            UploadError::DataSourceSyncTimeout {
                data_source_id,
                attempts,
            } => ToolError::new(ToolErrorKind::Timeout, code, message)
                .with_hint("The data source may still finish syncing; check it with list_data_sources")
                .with_details(serde_json::json!({
                    "data_source_id": data_source_id,
                    "attempts": attempts,
                })),
            UploadError::DataSourceStatusCheckFailed { data_source_id, .. } => {
                ToolError::new(ToolErrorKind::Upstream, code, message)
                    .with_hint("The data source was created; check it later with list_data_sources")
                    .with_details(serde_json::json!({ "data_source_id": data_source_id }))
            }
            UploadError::DataSourceProcessingFailed { data_source_id } => {
                ToolError::new(ToolErrorKind::Upstream, code, message)
                    .with_details(serde_json::json!({ "data_source_id": data_source_id }))
            }
            UploadError::InitiationFailed { .. }
            | UploadError::CompletionFailed { .. }
            | UploadError::DataSourceCreationFailed { .. } => {
                ToolError::new(ToolErrorKind::Upstream, code, message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_failure_keeps_part_number_in_details() {
        let err: ToolError = UploadError::part(3, "connection reset").into();
        assert_eq!(err.code, "UPLOAD_PART_FAILED");
        assert_eq!(
            err.details.as_ref().and_then(|d| d.get("part_number")),
            Some(&serde_json::json!(3))
        );
        assert!(err.message.contains("part 3"));
    }

    #[test]
    fn sync_timeout_is_a_retryable_timeout() {
        let err: ToolError = UploadError::DataSourceSyncTimeout {
            data_source_id: "ds-1".to_string(),
            attempts: 20,
        }
        .into();
        assert_eq!(err.kind, ToolErrorKind::Timeout);
        assert!(err.retryable);
    }

    #[test]
    fn status_check_failure_is_not_a_timeout() {
        let err: ToolError = UploadError::DataSourceStatusCheckFailed {
            data_source_id: "src-1".to_string(),
            reason: "platform error 40400: data source not found".to_string(),
        }
        .into();
        assert_eq!(err.kind, ToolErrorKind::Upstream);
        assert_eq!(err.code, "DATA_SOURCE_STATUS_CHECK_FAILED");
        assert!(!err.retryable);
        assert_eq!(
            err.details.as_ref().and_then(|d| d.get("data_source_id")),
            Some(&serde_json::json!("src-1"))
        );
    }

    #[test]
    fn http_not_found_maps_to_not_found_kind() {
        let err: ToolError = ApiError::Http {
            status: 404,
            body: "no such dataset".to_string(),
        }
        .into();
        assert_eq!(err.kind, ToolErrorKind::NotFound);
    }
}
