//! Fleet service - vehicle catalogue and maintenance status.
//!
//! `rented` is owned by the booking engine: fleet edits never move a
//! vehicle into or out of it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use common::{AppError, AppResult, OptionExt};
use domain::pricing;
use domain::{ActorContext, Quote, Vehicle, VehicleSpec, VehicleStatus};

use super::document_intake::DocumentIntake;
use super::rejected;
use crate::repository::{finish, RentalStore, RentalTx};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait FleetService: Send + Sync {
    async fn create_vehicle(&self, actor: ActorContext, spec: VehicleSpec) -> AppResult<Vehicle>;

    /// Replace descriptive attributes; status and assignment are kept.
    async fn update_vehicle(
        &self,
        actor: ActorContext,
        vehicle_id: Uuid,
        spec: VehicleSpec,
    ) -> AppResult<Vehicle>;

    /// Move an unassigned vehicle between `available` and `maintenance`.
    async fn set_vehicle_status(
        &self,
        actor: ActorContext,
        vehicle_id: Uuid,
        status: VehicleStatus,
    ) -> AppResult<Vehicle>;

    async fn delete_vehicle(&self, actor: ActorContext, vehicle_id: Uuid) -> AppResult<()>;

    async fn get_vehicle(&self, vehicle_id: Uuid) -> AppResult<Vehicle>;

    async fn list_vehicles(&self, status: Option<VehicleStatus>) -> AppResult<Vec<Vehicle>>;

    /// Available vehicles, cheapest low-season rate first.
    async fn list_available(&self) -> AppResult<Vec<Vehicle>>;

    async fn quote(
        &self,
        vehicle_id: Uuid,
        pickup_at: DateTime<Utc>,
        return_at: DateTime<Utc>,
    ) -> AppResult<Quote>;

    /// Admin: upload a fleet image and return its URL.
    async fn upload_vehicle_image(
        &self,
        actor: ActorContext,
        file_name: String,
        image: Vec<u8>,
        content_type: String,
    ) -> AppResult<String>;
}

pub struct FleetManager {
    store: Arc<dyn RentalStore>,
    intake: Arc<DocumentIntake>,
}

impl FleetManager {
    pub fn new(store: Arc<dyn RentalStore>, intake: Arc<DocumentIntake>) -> Self {
        Self { store, intake }
    }

    async fn reload(tx: &mut dyn RentalTx, vehicle_id: Uuid) -> AppResult<Vehicle> {
        tx.find_vehicle(vehicle_id).await?.ok_or_not_found("Vehicle")
    }
}

#[async_trait]
impl FleetService for FleetManager {
    async fn create_vehicle(&self, actor: ActorContext, spec: VehicleSpec) -> AppResult<Vehicle> {
        actor.require_admin()?;
        spec.validate()?;

        let vehicle = Vehicle::from_spec(Uuid::new_v4(), spec);
        let mut tx = self.store.begin().await?;
        let result = tx.insert_vehicle(&vehicle).await;
        finish(tx, result).await?;

        tracing::info!(vehicle_id = %vehicle.id, plate = %vehicle.plate, "Vehicle created");
        Ok(vehicle)
    }

    async fn update_vehicle(
        &self,
        actor: ActorContext,
        vehicle_id: Uuid,
        spec: VehicleSpec,
    ) -> AppResult<Vehicle> {
        actor.require_admin()?;
        spec.validate()?;

        let mut tx = self.store.begin().await?;
        let result = async {
            if !tx.update_vehicle_spec(vehicle_id, &spec).await? {
                return Err(AppError::not_found("Vehicle"));
            }
            Self::reload(tx.as_mut(), vehicle_id).await
        }
        .await;
        let vehicle = finish(tx, result).await?;

        tracing::info!(vehicle_id = %vehicle_id, "Vehicle updated");
        Ok(vehicle)
    }

    async fn set_vehicle_status(
        &self,
        actor: ActorContext,
        vehicle_id: Uuid,
        status: VehicleStatus,
    ) -> AppResult<Vehicle> {
        actor.require_admin()?;
        if status == VehicleStatus::Rented {
            return Err(AppError::validation(
                "Vehicles become rented only by confirming a booking",
            ));
        }

        let mut tx = self.store.begin().await?;
        let result = async {
            let vehicle = Self::reload(tx.as_mut(), vehicle_id).await?;
            if vehicle.status == VehicleStatus::Rented {
                return Err(rejected(format!(
                    "Vehicle {} is rented, record its return first",
                    vehicle.plate
                )));
            }
            if vehicle.status == status {
                return Ok(vehicle);
            }
            if !tx.set_vehicle_status(vehicle_id, vehicle.status, status).await? {
                return Err(rejected(format!(
                    "Vehicle {} is no longer {}",
                    vehicle.plate, vehicle.status
                )));
            }
            Self::reload(tx.as_mut(), vehicle_id).await
        }
        .await;
        let vehicle = finish(tx, result).await?;

        tracing::info!(vehicle_id = %vehicle_id, status = %vehicle.status, "Vehicle status set");
        Ok(vehicle)
    }

    async fn delete_vehicle(&self, actor: ActorContext, vehicle_id: Uuid) -> AppResult<()> {
        actor.require_admin()?;

        let mut tx = self.store.begin().await?;
        let result = async {
            let vehicle = Self::reload(tx.as_mut(), vehicle_id).await?;
            if vehicle.status == VehicleStatus::Rented {
                return Err(rejected(format!(
                    "Vehicle {} is rented and cannot be deleted",
                    vehicle.plate
                )));
            }
            if !tx.delete_vehicle(vehicle_id).await? {
                return Err(rejected(format!(
                    "Vehicle {} was rented meanwhile",
                    vehicle.plate
                )));
            }
            Ok(())
        }
        .await;
        finish(tx, result).await?;

        tracing::info!(vehicle_id = %vehicle_id, "Vehicle deleted");
        Ok(())
    }

    async fn get_vehicle(&self, vehicle_id: Uuid) -> AppResult<Vehicle> {
        self.store
            .find_vehicle(vehicle_id)
            .await?
            .ok_or_not_found("Vehicle")
    }

    async fn list_vehicles(&self, status: Option<VehicleStatus>) -> AppResult<Vec<Vehicle>> {
        self.store.list_vehicles(status).await
    }

    async fn list_available(&self) -> AppResult<Vec<Vehicle>> {
        let mut vehicles = self
            .store
            .list_vehicles(Some(VehicleStatus::Available))
            .await?;
        vehicles.sort_by(|a, b| {
            a.rate_low
                .cmp(&b.rate_low)
                .then_with(|| a.descriptor().cmp(&b.descriptor()))
        });
        Ok(vehicles)
    }

    async fn quote(
        &self,
        vehicle_id: Uuid,
        pickup_at: DateTime<Utc>,
        return_at: DateTime<Utc>,
    ) -> AppResult<Quote> {
        if pickup_at > return_at {
            return Err(AppError::validation("Pickup must not be after return"));
        }
        let vehicle = self.get_vehicle(vehicle_id).await?;
        Ok(pricing::quote(
            vehicle.rate_low,
            vehicle.rate_high,
            pickup_at,
            return_at,
        ))
    }

    async fn upload_vehicle_image(
        &self,
        actor: ActorContext,
        file_name: String,
        image: Vec<u8>,
        content_type: String,
    ) -> AppResult<String> {
        actor.require_admin()?;
        let url = self
            .intake
            .store_vehicle_image(&file_name, image, &content_type)
            .await?;

        tracing::info!(url = %url, "Vehicle image uploaded");
        Ok(url)
    }
}
