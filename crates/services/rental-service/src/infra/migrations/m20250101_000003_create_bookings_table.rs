//! Migration: bookings, with one confirmed booking per vehicle.

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_profiles_table::Profiles;
use super::m20250101_000002_create_vehicles_table::Vehicles;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn vehicle_fk(name: &str, column: Bookings) -> ForeignKeyCreateStatement {
    ForeignKey::create()
        .name(name)
        .from(Bookings::Table, column)
        .to(Vehicles::Table, Vehicles::Id)
        .on_delete(ForeignKeyAction::SetNull)
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bookings::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Bookings::ProfileId).uuid().not_null())
                    .col(ColumnDef::new(Bookings::VehicleId).uuid().null())
                    .col(ColumnDef::new(Bookings::ReturnedVehicleId).uuid().null())
                    .col(ColumnDef::new(Bookings::RequestedVehicleId).uuid().null())
                    .col(ColumnDef::new(Bookings::PickupLocation).string().not_null())
                    .col(ColumnDef::new(Bookings::ReturnLocation).string().not_null())
                    .col(
                        ColumnDef::new(Bookings::PickupAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::ReturnAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Bookings::TotalPrice).big_integer().not_null())
                    .col(ColumnDef::new(Bookings::FlightNumber).string_len(16).null())
                    .col(
                        ColumnDef::new(Bookings::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Bookings::Archived)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Bookings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_profile")
                            .from(Bookings::Table, Bookings::ProfileId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(&mut vehicle_fk("fk_bookings_vehicle", Bookings::VehicleId))
                    .foreign_key(&mut vehicle_fk(
                        "fk_bookings_returned_vehicle",
                        Bookings::ReturnedVehicleId,
                    ))
                    .foreign_key(&mut vehicle_fk(
                        "fk_bookings_requested_vehicle",
                        Bookings::RequestedVehicleId,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_profile_id")
                    .table(Bookings::Table)
                    .col(Bookings::ProfileId)
                    .to_owned(),
            )
            .await?;

        // At most one confirmed booking may hold a given vehicle.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS uq_bookings_confirmed_vehicle \
                 ON bookings (vehicle_id) WHERE status = 'confirmed'",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await
    }
}

#[derive(Iden, Clone, Copy)]
pub enum Bookings {
    Table,
    Id,
    ProfileId,
    VehicleId,
    ReturnedVehicleId,
    RequestedVehicleId,
    PickupLocation,
    ReturnLocation,
    PickupAt,
    ReturnAt,
    TotalPrice,
    FlightNumber,
    Status,
    Archived,
    CreatedAt,
    UpdatedAt,
}
