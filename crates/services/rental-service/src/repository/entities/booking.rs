//! Booking database entity for SeaORM.

use sea_orm::entity::prelude::*;

use common::{AppError, AppResult};
use domain::Booking;

use super::corrupt;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub profile_id: Uuid,
    /// Unique among confirmed bookings (partial index)
    pub vehicle_id: Option<Uuid>,
    pub returned_vehicle_id: Option<Uuid>,
    pub requested_vehicle_id: Option<Uuid>,
    pub pickup_location: String,
    pub return_location: String,
    pub pickup_at: DateTimeUtc,
    pub return_at: DateTimeUtc,
    pub total_price: i64,
    pub flight_number: Option<String>,
    pub status: String,
    pub archived: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::ProfileId",
        to = "super::profile::Column::Id",
        on_delete = "Cascade"
    )]
    Profile,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Booking {
    type Error = AppError;

    fn try_from(model: Model) -> AppResult<Self> {
        Ok(Booking {
            id: model.id,
            profile_id: model.profile_id,
            vehicle_id: model.vehicle_id,
            returned_vehicle_id: model.returned_vehicle_id,
            requested_vehicle_id: model.requested_vehicle_id,
            pickup_location: model.pickup_location,
            return_location: model.return_location,
            pickup_at: model.pickup_at,
            return_at: model.return_at,
            total_price: model.total_price,
            flight_number: model.flight_number,
            status: model.status.parse().map_err(corrupt("bookings"))?,
            archived: model.archived,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
