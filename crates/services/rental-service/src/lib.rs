//! Rental Service Library
//!
//! The core of the rental platform: profiles and their verification gate,
//! the fleet, and the booking engine that keeps bookings and vehicles in
//! step. The gateway embeds it through [`build_services`].

pub mod config;
pub mod infra;
pub mod integrations;
pub mod repository;
pub mod service;

use tracing::info;

use common::AppResult;

use crate::config::RentalServiceConfig;
use crate::infra::Database;
use crate::service::Services;

/// Build the service container from environment configuration.
pub async fn build_services() -> AppResult<Services> {
    let config = RentalServiceConfig::from_env();
    build_services_with_config(&config).await
}

/// Build the service container from an explicit configuration.
pub async fn build_services_with_config(config: &RentalServiceConfig) -> AppResult<Services> {
    let services = Services::from_config(config).await?;
    info!(backend = ?config.store_backend, "Rental services ready");
    Ok(services)
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(action: MigrateAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = RentalServiceConfig::from_env();
    let db = Database::connect_without_migrations(&config.database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for (name, applied) in status {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}

/// Migration action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}
