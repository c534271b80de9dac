//! Identity document analysis.
//!
//! The hosted analyzer is asynchronous: the image is posted, the
//! `operation-location` header names a result resource, and that resource
//! is polled until it reports `succeeded` or `failed`. The whole exchange
//! runs under one deadline.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use common::{AppError, AppResult};
use domain::{AnalysisOutcome, AnalyzedDocument};

use super::http_client;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

const API_VERSION: &str = "2023-07-31";
const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Extracts structured fields from a photographed identity document.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn analyze(&self, image: &[u8]) -> AppResult<AnalysisOutcome>;
}

#[derive(Debug, Deserialize)]
struct Operation {
    status: String,
    #[serde(rename = "analyzeResult")]
    analyze_result: Option<AnalyzeResult>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResult {
    #[serde(default)]
    documents: Vec<DetectedDocument>,
}

#[derive(Debug, Deserialize)]
struct DetectedDocument {
    #[serde(default)]
    fields: HashMap<String, DocumentField>,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentField {
    #[serde(rename = "valueString")]
    value_string: Option<String>,
    #[serde(rename = "valueDate")]
    value_date: Option<NaiveDate>,
    content: Option<String>,
}

impl DocumentField {
    fn text(&self) -> Option<String> {
        self.value_string
            .as_deref()
            .or(self.content.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

fn map_fields(fields: &HashMap<String, DocumentField>) -> AnalyzedDocument {
    let text = |name: &str| fields.get(name).and_then(DocumentField::text);
    let date = |name: &str| fields.get(name).and_then(|f| f.value_date);

    let names: Vec<String> = ["FirstName", "LastName"]
        .iter()
        .filter_map(|n| text(*n))
        .collect();

    AnalyzedDocument {
        full_name: (!names.is_empty()).then(|| names.join(" ")),
        document_number: text("DocumentNumber"),
        issue_date: date("IssueDate"),
        expiration_date: date("DateOfExpiration"),
        birth_date: date("DateOfBirth"),
        address: fields
            .get("Address")
            .and_then(|f| f.content.clone())
            .filter(|a| !a.trim().is_empty()),
    }
}

/// Client for the hosted prebuilt identity-document model.
pub struct AzureDocumentAnalyzer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
    poll_interval: Duration,
}

impl AzureDocumentAnalyzer {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        poll_interval: Duration,
    ) -> AppResult<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout,
            poll_interval,
        })
    }

    async fn submit(&self, image: &[u8]) -> AppResult<String> {
        let url = format!(
            "{}/formrecognizer/documentModels/prebuilt-idDocument:analyze?api-version={}",
            self.endpoint, API_VERSION
        );

        let response = self
            .client
            .post(&url)
            .header(KEY_HEADER, &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| AppError::external(format!("Analysis request failed: {}", e)))?;

        let response = ensure_success(response, "Analysis rejected").await?;

        response
            .headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| AppError::external("Analysis response has no operation-location"))
    }

    async fn poll(&self, operation_url: &str) -> AppResult<AnalysisOutcome> {
        loop {
            let response = self
                .client
                .get(operation_url)
                .header(KEY_HEADER, &self.api_key)
                .send()
                .await
                .map_err(|e| AppError::external(format!("Analysis poll failed: {}", e)))?;
            let operation: Operation = ensure_success(response, "Analysis poll rejected")
                .await?
                .json()
                .await
                .map_err(|e| AppError::external(format!("Unreadable analysis result: {}", e)))?;

            match operation.status.as_str() {
                "succeeded" => {
                    let first = operation
                        .analyze_result
                        .and_then(|r| r.documents.into_iter().next());
                    return Ok(match first {
                        Some(doc) => AnalysisOutcome::Found(map_fields(&doc.fields)),
                        None => AnalysisOutcome::NoDocument,
                    });
                }
                "failed" => return Err(AppError::external("Document analysis failed")),
                _ => tokio::time::sleep(self.poll_interval).await,
            }
        }
    }
}

async fn ensure_success(response: reqwest::Response, context: &str) -> AppResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::external(format!(
        "{} with status {}: {}",
        context, status, body
    )))
}

#[async_trait]
impl DocumentAnalyzer for AzureDocumentAnalyzer {
    async fn analyze(&self, image: &[u8]) -> AppResult<AnalysisOutcome> {
        let exchange = async {
            let operation_url = self.submit(image).await?;
            self.poll(&operation_url).await
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| {
                AppError::external(format!(
                    "Document analysis timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
    }
}

/// Accepts every image without extracting anything. For development
/// instances with no analysis account.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughAnalyzer;

#[async_trait]
impl DocumentAnalyzer for PassthroughAnalyzer {
    async fn analyze(&self, image: &[u8]) -> AppResult<AnalysisOutcome> {
        tracing::debug!(bytes = image.len(), "Document analysis not configured, skipping");
        Ok(AnalysisOutcome::Found(AnalyzedDocument::default()))
    }
}
