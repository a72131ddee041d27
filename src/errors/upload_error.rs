use crate::errors::ApiError;
use std::path::PathBuf;
use thiserror::Error;

/// Terminal outcomes of a failed chunked upload. None of them are retried by
/// the coordinator; the caller restarts the whole upload.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid upload request: {reason}")]
    InvalidRequest { reason: String },
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },
    #[error("failed to initiate multipart upload: {reason}")]
    InitiationFailed { reason: String },
    #[error("failed to upload part {part_number}: {reason}")]
    PartFailed { part_number: u32, reason: String },
    #[error("failed to complete multipart upload: {reason}")]
    CompletionFailed { reason: String },
    #[error("failed to create data source: {reason}")]
    DataSourceCreationFailed { reason: String },
    #[error("data source {data_source_id} failed processing (status: invalid)")]
    DataSourceProcessingFailed { data_source_id: String },
    #[error("status check for data source {data_source_id} failed: {reason}")]
    DataSourceStatusCheckFailed {
        data_source_id: String,
        reason: String,
    },
    #[error("data source {data_source_id} did not sync after {attempts} attempts")]
    DataSourceSyncTimeout {
        data_source_id: String,
        attempts: u32,
    },
}

impl UploadError {
    pub fn code(&self) -> &'static str {
        match self {
            UploadError::InvalidRequest { .. } => "INVALID_PARAMS",
            UploadError::FileNotFound { .. } => "FILE_NOT_FOUND",
            UploadError::InitiationFailed { .. } => "UPLOAD_INITIATION_FAILED",
            UploadError::PartFailed { .. } => "UPLOAD_PART_FAILED",
            UploadError::CompletionFailed { .. } => "UPLOAD_COMPLETION_FAILED",
            UploadError::DataSourceCreationFailed { .. } => "DATA_SOURCE_CREATION_FAILED",
            UploadError::DataSourceProcessingFailed { .. } => "DATA_SOURCE_PROCESSING_FAILED",
            UploadError::DataSourceStatusCheckFailed { .. } => "DATA_SOURCE_STATUS_CHECK_FAILED",
            UploadError::DataSourceSyncTimeout { .. } => "DATA_SOURCE_SYNC_TIMEOUT",
        }
    }

    pub(crate) fn initiation(err: ApiError) -> Self {
        UploadError::InitiationFailed {
            reason: err.to_string(),
        }
    }

    pub(crate) fn part(part_number: u32, reason: impl ToString) -> Self {
        UploadError::PartFailed {
            part_number,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn completion(err: ApiError) -> Self {
        UploadError::CompletionFailed {
            reason: err.to_string(),
        }
    }

    pub(crate) fn creation(err: ApiError) -> Self {
        UploadError::DataSourceCreationFailed {
            reason: err.to_string(),
        }
    }
}
