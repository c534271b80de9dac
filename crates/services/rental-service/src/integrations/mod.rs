//! Clients for the external collaborators: document analysis, object
//! storage and the mail API. Each has a no-op or logging fallback used
//! when credentials are not configured.

mod document_analysis;
mod mailer;
mod object_store;

pub use document_analysis::{AzureDocumentAnalyzer, DocumentAnalyzer, PassthroughAnalyzer};
pub use mailer::{HttpMailer, LogMailer, Mailer, OutboundEmail};
pub use object_store::{HttpObjectStore, LoggingObjectStore, ObjectStore};

#[cfg(any(test, feature = "test-utils"))]
pub use document_analysis::MockDocumentAnalyzer;
#[cfg(any(test, feature = "test-utils"))]
pub use mailer::MockMailer;
#[cfg(any(test, feature = "test-utils"))]
pub use object_store::MockObjectStore;

use std::time::Duration;

use common::{AppError, AppResult};

/// Build an HTTP client with a request timeout.
pub(crate) fn http_client(timeout: Duration) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {}", e)))
}
