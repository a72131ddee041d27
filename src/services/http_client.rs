use crate::config::Config;
use crate::constants::{network, upload};
use crate::errors::ApiError;
use crate::services::logger::Logger;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderValue, CONTENT_TYPE, ETAG};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::{Duration, Instant};
use url::Url;

/// Raw request/response access to the platform. Paths are relative to the
/// configured API URL; `put_part` takes an absolute signed URL.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ApiError>;

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError>;

    /// Uploads one part body and returns the storage endpoint's `ETag` header,
    /// if it sent one.
    async fn put_part(&self, upload_url: &str, body: Bytes) -> Result<Option<String>, ApiError>;
}

#[derive(Clone)]
pub struct HttpClient {
    logger: Logger,
    client: Client,
    base_url: Url,
    api_key: HeaderValue,
}

impl HttpClient {
    pub fn new(logger: Logger, config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_millis(network::TIMEOUT_CONNECTION_MS))
            .build()
            .map_err(|err| ApiError::Network(format!("Failed to build HTTP client: {}", err)))?;
        let mut api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| ApiError::InvalidRequest("api key is not a valid header value".into()))?;
        api_key.set_sensitive(true);
        Ok(Self {
            logger: logger.child("http"),
            client,
            base_url: config.api_url.clone(),
            api_key,
        })
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ApiError::InvalidRequest(format!("invalid path '{}': {}", path, err)))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(network::API_KEY_HEADER, self.api_key.clone())
    }

    async fn send_json(&self, method: &str, url: Url, builder: RequestBuilder) -> Result<Value, ApiError> {
        let started = Instant::now();
        let response = self.authorized(builder).send().await.map_err(ApiError::from)?;
        let status = response.status();
        let text = response.text().await.map_err(ApiError::from)?;
        self.logger.debug(
            "request",
            Some(&serde_json::json!({
                "method": method,
                "path": url.path(),
                "status": status.as_u16(),
                "duration_ms": started.elapsed().as_millis() as u64,
            })),
        );
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                body: text,
            });
        }
        serde_json::from_str(&text).map_err(|err| ApiError::Decode(err.to_string()))
    }
}

#[async_trait]
impl ApiTransport for HttpClient {
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ApiError> {
        let mut url = self.endpoint(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        let builder = self.client.get(url.clone());
        self.send_json("GET", url, builder).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let url = self.endpoint(path)?;
        let builder = self.client.post(url.clone()).json(body);
        self.send_json("POST", url, builder).await
    }

    async fn put_part(&self, upload_url: &str, body: Bytes) -> Result<Option<String>, ApiError> {
        let url = Url::parse(upload_url)
            .map_err(|err| ApiError::InvalidRequest(format!("invalid upload_url: {}", err)))?;
        let size = body.len();
        // Signed storage URLs carry their own credentials; the API key stays off them.
        let response = self
            .client
            .put(url)
            .header(CONTENT_TYPE, upload::OCTET_STREAM)
            .body(body)
            .send()
            .await
            .map_err(ApiError::from)?;
        let status = response.status();
        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                body: text,
            });
        }
        self.logger.debug(
            "part uploaded",
            Some(&serde_json::json!({ "bytes": size, "status": status.as_u16() })),
        );
        Ok(etag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_url: &str) -> HttpClient {
        let config = Config::new("user", "key")
            .and_then(|c| c.with_api_url(api_url))
            .expect("config");
        HttpClient::new(Logger::quiet("test"), &config).expect("client")
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let http = client("https://example.test/api/v2/team");
        assert_eq!(
            http.endpoint("/file/init-multipart-upload")
                .expect("url")
                .as_str(),
            "https://example.test/api/v2/team/file/init-multipart-upload"
        );
        assert_eq!(
            http.endpoint("datasets/ds-1/datasources").expect("url").as_str(),
            "https://example.test/api/v2/team/datasets/ds-1/datasources"
        );
    }
}
