//! Application state for dependency injection.

use std::sync::Arc;

use rental_service_lib::service::ServiceContainer;

use crate::config::GatewayConfig;
use crate::middleware::TokenVerifier;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<dyn ServiceContainer>,
    pub tokens: Arc<TokenVerifier>,
    pub config: GatewayConfig,
}

impl AppState {
    /// Create new app state.
    pub fn new(services: Arc<dyn ServiceContainer>, config: GatewayConfig) -> Self {
        Self {
            tokens: Arc::new(TokenVerifier::new(&config.jwt_secret)),
            services,
            config,
        }
    }
}
