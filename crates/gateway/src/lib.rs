//! API Gateway Library
//!
//! The HTTP surface of the rental platform. It verifies identity tokens,
//! validates request bodies and hands each call to the embedded rental
//! services.

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use rental_service_lib::config::RentalServiceConfig;

use crate::config::GatewayConfig;
use crate::routes::create_router;
use crate::state::AppState;

/// Build the services from the environment and serve HTTP.
pub async fn run_server(config: GatewayConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut service_config = RentalServiceConfig::from_env();
    service_config.max_upload_bytes = config.max_upload_bytes;
    let services = rental_service_lib::build_services_with_config(&service_config).await?;

    let state = AppState::new(Arc::new(services), config.clone());
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
