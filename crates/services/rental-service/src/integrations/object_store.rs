//! Blob storage for document scans and vehicle images.

use std::time::Duration;

use async_trait::async_trait;

use common::{AppError, AppResult};

use super::http_client;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Stores bytes under a logical path and returns a stable URL.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<String>;
}

/// Storage REST API (`/storage/v1/object/{bucket}/{path}`).
pub struct HttpObjectStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    bucket: String,
}

impl HttpObjectStore {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        bucket: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            bucket: bucket.into(),
        })
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<String> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path);
        let size = bytes.len();

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::storage(format!("Upload of {} failed: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::storage(format!(
                "Upload of {} rejected with status {}: {}",
                path, status, body
            )));
        }

        tracing::debug!(path = %path, bytes = size, "Object stored");
        Ok(self.public_url(path))
    }
}

/// Discards the bytes and returns a `local://` reference.
#[derive(Debug, Clone)]
pub struct LoggingObjectStore {
    bucket: String,
}

impl LoggingObjectStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for LoggingObjectStore {
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<String> {
        tracing::info!(
            bucket = %self.bucket,
            path = %path,
            bytes = bytes.len(),
            content_type = %content_type,
            "Object store not configured, upload discarded"
        );
        Ok(format!("local://{}/{}", self.bucket, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url_layout() {
        let store = HttpObjectStore::new(
            "https://project.example.co/",
            "key",
            "documents",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            store.public_url("p1/license-front_1700000000.jpg"),
            "https://project.example.co/storage/v1/object/public/documents/p1/license-front_1700000000.jpg"
        );
    }

    #[tokio::test]
    async fn test_logging_store_returns_local_reference() {
        let store = LoggingObjectStore::new("documents");
        let url = store.put("a/b.jpg", vec![1, 2, 3], "image/jpeg").await.unwrap();
        assert_eq!(url, "local://documents/a/b.jpg");
    }
}
