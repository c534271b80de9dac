//! Rental service configuration.

use std::env;

use common::{DatabaseConfig, HttpClientConfig};

/// Default upload limit for document and vehicle images (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Which store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    fn from_env_value(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "memory" => StoreBackend::Memory,
            _ => StoreBackend::Postgres,
        }
    }
}

/// Document analysis (OCR) collaborator.
#[derive(Debug, Clone)]
pub struct DocumentAnalysisConfig {
    pub http: HttpClientConfig,
    /// Delay between polls of a running analysis
    pub poll_interval_ms: u64,
}

/// Object store collaborator.
#[derive(Debug, Clone)]
pub struct ObjectStoreConfig {
    pub http: HttpClientConfig,
    pub bucket: String,
}

/// Mail API collaborator.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub http: HttpClientConfig,
    /// Sender, e.g. `BNT LUXURY RENTAL <no-reply@bnt.ma>`
    pub from: String,
}

/// Rental service configuration.
#[derive(Debug, Clone)]
pub struct RentalServiceConfig {
    pub database: DatabaseConfig,
    pub store_backend: StoreBackend,
    pub document_analysis: DocumentAnalysisConfig,
    pub object_store: ObjectStoreConfig,
    pub mail: MailConfig,
    pub max_upload_bytes: usize,
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    var(name).and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl RentalServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            database: DatabaseConfig {
                url: var("RENTAL_SERVICE_DATABASE_URL")
                    .or_else(|| var("DATABASE_URL"))
                    .unwrap_or(defaults.database.url),
                max_connections: parsed("DATABASE_MAX_CONNECTIONS", 10),
                min_connections: parsed("DATABASE_MIN_CONNECTIONS", 1),
            },
            store_backend: var("STORE_BACKEND")
                .map(|v| StoreBackend::from_env_value(&v))
                .unwrap_or(StoreBackend::Postgres),
            document_analysis: DocumentAnalysisConfig {
                http: HttpClientConfig {
                    base_url: var("DOCUMENT_ANALYSIS_ENDPOINT"),
                    api_key: var("DOCUMENT_ANALYSIS_KEY"),
                    timeout_secs: parsed("DOCUMENT_ANALYSIS_TIMEOUT_SECS", 30),
                },
                poll_interval_ms: parsed("DOCUMENT_ANALYSIS_POLL_INTERVAL_MS", 1000),
            },
            object_store: ObjectStoreConfig {
                http: HttpClientConfig {
                    base_url: var("OBJECT_STORE_URL"),
                    api_key: var("OBJECT_STORE_KEY"),
                    timeout_secs: parsed("OBJECT_STORE_TIMEOUT_SECS", 30),
                },
                bucket: var("OBJECT_STORE_BUCKET").unwrap_or(defaults.object_store.bucket),
            },
            mail: MailConfig {
                http: HttpClientConfig {
                    base_url: var("MAIL_API_URL").or(defaults.mail.http.base_url),
                    api_key: var("MAIL_API_KEY"),
                    timeout_secs: parsed("MAIL_API_TIMEOUT_SECS", 10),
                },
                from: var("MAIL_FROM").unwrap_or(defaults.mail.from),
            },
            max_upload_bytes: parsed("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
        }
    }
}

impl Default for RentalServiceConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            store_backend: StoreBackend::Postgres,
            document_analysis: DocumentAnalysisConfig {
                http: HttpClientConfig::default(),
                poll_interval_ms: 1000,
            },
            object_store: ObjectStoreConfig {
                http: HttpClientConfig::default(),
                bucket: "documents".to_string(),
            },
            mail: MailConfig {
                http: HttpClientConfig {
                    base_url: Some("https://api.resend.com".to_string()),
                    api_key: None,
                    timeout_secs: 10,
                },
                from: "BNT LUXURY RENTAL <no-reply@bnt.ma>".to_string(),
            },
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parsing() {
        assert_eq!(StoreBackend::from_env_value("memory"), StoreBackend::Memory);
        assert_eq!(StoreBackend::from_env_value(" MEMORY "), StoreBackend::Memory);
        assert_eq!(StoreBackend::from_env_value("postgres"), StoreBackend::Postgres);
        assert_eq!(StoreBackend::from_env_value("sqlite"), StoreBackend::Postgres);
    }

    #[test]
    fn test_defaults_leave_collaborators_unconfigured() {
        let config = RentalServiceConfig::default();
        assert!(!config.document_analysis.http.is_configured());
        assert!(!config.object_store.http.is_configured());
        assert!(!config.mail.http.is_configured());
        assert_eq!(config.object_store.bucket, "documents");
    }
}
