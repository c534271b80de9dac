//! Service Container - one place that wires the store, the collaborators
//! and the services built on them.

use std::sync::Arc;
use std::time::Duration;

use common::{AppError, AppResult};

use super::{
    BookingEngine, BookingService, DocumentIntake, FleetManager, FleetService, IdentityGate,
    NotificationDispatcher, ProfileManager, ProfileService, VerificationService,
};
use crate::config::{RentalServiceConfig, StoreBackend};
use crate::infra::Database;
use crate::integrations::{
    AzureDocumentAnalyzer, DocumentAnalyzer, HttpMailer, HttpObjectStore, LogMailer,
    LoggingObjectStore, Mailer, ObjectStore, PassthroughAnalyzer,
};
use crate::repository::{MemoryRentalStore, PgRentalStore, RentalStore};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn bookings(&self) -> Arc<dyn BookingService>;

    fn verification(&self) -> Arc<dyn VerificationService>;

    fn profiles(&self) -> Arc<dyn ProfileService>;

    fn fleet(&self) -> Arc<dyn FleetService>;

    /// Backing store, for health checks
    fn store(&self) -> Arc<dyn RentalStore>;
}

/// External collaborators the services talk to.
#[derive(Clone)]
pub struct Collaborators {
    pub analyzer: Arc<dyn DocumentAnalyzer>,
    pub objects: Arc<dyn ObjectStore>,
    pub mailer: Arc<dyn Mailer>,
}

impl Collaborators {
    /// Real clients where credentials are configured, local stand-ins
    /// otherwise.
    pub fn from_config(config: &RentalServiceConfig) -> AppResult<Self> {
        let analysis = &config.document_analysis;
        let analyzer: Arc<dyn DocumentAnalyzer> =
            match (&analysis.http.base_url, &analysis.http.api_key) {
                (Some(endpoint), Some(key)) => Arc::new(AzureDocumentAnalyzer::new(
                    endpoint.as_str(),
                    key.as_str(),
                    Duration::from_secs(analysis.http.timeout_secs),
                    Duration::from_millis(analysis.poll_interval_ms),
                )?),
                _ => {
                    tracing::warn!("Document analysis not configured, documents are accepted unread");
                    Arc::new(PassthroughAnalyzer)
                }
            };

        let storage = &config.object_store;
        let objects: Arc<dyn ObjectStore> = match (&storage.http.base_url, &storage.http.api_key) {
            (Some(url), Some(key)) => Arc::new(HttpObjectStore::new(
                url.as_str(),
                key.as_str(),
                storage.bucket.as_str(),
                Duration::from_secs(storage.http.timeout_secs),
            )?),
            _ => {
                tracing::warn!("Object store not configured, uploads are only logged");
                Arc::new(LoggingObjectStore::new(storage.bucket.as_str()))
            }
        };

        let mail = &config.mail;
        let mailer: Arc<dyn Mailer> = match (&mail.http.base_url, &mail.http.api_key) {
            (Some(url), Some(key)) => Arc::new(HttpMailer::new(
                url.as_str(),
                key.as_str(),
                mail.from.as_str(),
                Duration::from_secs(mail.http.timeout_secs),
            )?),
            _ => {
                tracing::warn!("Mail API not configured, notifications are only logged");
                Arc::new(LogMailer)
            }
        };

        Ok(Self {
            analyzer,
            objects,
            mailer,
        })
    }
}

/// Concrete implementation of ServiceContainer
pub struct Services {
    store: Arc<dyn RentalStore>,
    booking_service: Arc<dyn BookingService>,
    verification_service: Arc<dyn VerificationService>,
    profile_service: Arc<dyn ProfileService>,
    fleet_service: Arc<dyn FleetService>,
}

impl Services {
    /// Build every service on top of one store.
    pub fn new(
        store: Arc<dyn RentalStore>,
        collaborators: Collaborators,
        max_upload_bytes: usize,
    ) -> Self {
        let notifier = NotificationDispatcher::new(collaborators.mailer);
        let intake = Arc::new(DocumentIntake::new(
            collaborators.analyzer,
            collaborators.objects,
            max_upload_bytes,
        ));

        Self {
            booking_service: Arc::new(BookingEngine::new(store.clone(), notifier.clone())),
            verification_service: Arc::new(IdentityGate::new(
                store.clone(),
                intake.clone(),
                notifier,
            )),
            profile_service: Arc::new(ProfileManager::new(store.clone())),
            fleet_service: Arc::new(FleetManager::new(store.clone(), intake)),
            store,
        }
    }

    /// Connect the configured store backend and build the container.
    pub async fn from_config(config: &RentalServiceConfig) -> AppResult<Self> {
        let collaborators = Collaborators::from_config(config)?;

        let store: Arc<dyn RentalStore> = match config.store_backend {
            StoreBackend::Postgres => {
                let db = Database::connect(&config.database)
                    .await
                    .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;
                Arc::new(PgRentalStore::new(db.get_connection()))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using the in-memory store, data is lost on restart");
                Arc::new(MemoryRentalStore::new())
            }
        };

        Ok(Self::new(store, collaborators, config.max_upload_bytes))
    }
}

impl ServiceContainer for Services {
    fn bookings(&self) -> Arc<dyn BookingService> {
        self.booking_service.clone()
    }

    fn verification(&self) -> Arc<dyn VerificationService> {
        self.verification_service.clone()
    }

    fn profiles(&self) -> Arc<dyn ProfileService> {
        self.profile_service.clone()
    }

    fn fleet(&self) -> Arc<dyn FleetService> {
        self.fleet_service.clone()
    }

    fn store(&self) -> Arc<dyn RentalStore> {
        self.store.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_without_collaborators() {
        let config = RentalServiceConfig {
            store_backend: StoreBackend::Memory,
            ..Default::default()
        };
        let services = Services::from_config(&config).await.unwrap();

        assert!(services.store().ping().await.is_ok());
        assert!(services.fleet().list_available().await.unwrap().is_empty());
    }
}
