use thiserror::Error;

/// Failure of a single call against the remote platform.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("platform error {code}: {message}")]
    Platform { code: i64, message: String },
    #[error("response is missing field '{0}'")]
    MissingField(&'static str),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Timeout | ApiError::Network(_) => true,
            ApiError::Http { status, .. } => matches!(status, 408 | 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return ApiError::Timeout;
        }
        if err.is_decode() {
            return ApiError::Decode(err.to_string());
        }
        ApiError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_errors_are_retryable_but_client_errors_are_not() {
        let bad_gateway = ApiError::Http {
            status: 502,
            body: String::new(),
        };
        let forbidden = ApiError::Http {
            status: 403,
            body: "forbidden".to_string(),
        };
        assert!(bad_gateway.is_retryable());
        assert!(!forbidden.is_retryable());
        assert!(!ApiError::MissingField("id").is_retryable());
    }
}
