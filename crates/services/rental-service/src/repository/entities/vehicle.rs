//! Vehicle database entity for SeaORM.

use sea_orm::entity::prelude::*;

use common::{AppError, AppResult};
use domain::{Vehicle, VehicleCategory};

use super::corrupt;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "vehicles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub make: String,
    pub model: String,
    #[sea_orm(unique)]
    pub plate: String,
    pub status: String,
    pub category: String,
    pub rate_low: i64,
    pub rate_high: i64,
    pub seats: i32,
    pub doors: i32,
    pub air_conditioning: bool,
    pub transmission: String,
    pub mileage_policy: String,
    pub image_url: Option<String>,
    /// JSON array of image URLs
    pub gallery: Json,
    pub assigned_profile_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::AssignedProfileId",
        to = "super::profile::Column::Id",
        on_delete = "SetNull"
    )]
    AssignedProfile,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssignedProfile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Vehicle {
    type Error = AppError;

    fn try_from(model: Model) -> AppResult<Self> {
        let gallery: Vec<String> = serde_json::from_value(model.gallery)
            .map_err(|e| AppError::internal(format!("Corrupt vehicles row: {}", e)))?;

        Ok(Vehicle {
            id: model.id,
            make: model.make,
            model: model.model,
            plate: model.plate,
            status: model.status.parse().map_err(corrupt("vehicles"))?,
            category: VehicleCategory::try_from(model.category).map_err(corrupt("vehicles"))?,
            rate_low: model.rate_low,
            rate_high: model.rate_high,
            seats: model.seats,
            doors: model.doors,
            air_conditioning: model.air_conditioning,
            transmission: model.transmission.parse().map_err(corrupt("vehicles"))?,
            mileage_policy: model.mileage_policy,
            image_url: model.image_url,
            gallery,
            assigned_profile_id: model.assigned_profile_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
