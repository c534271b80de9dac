//! Migration: fleet vehicles.

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_profiles_table::Profiles;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vehicles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Vehicles::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Vehicles::Make).string().not_null())
                    .col(ColumnDef::new(Vehicles::Model).string().not_null())
                    .col(ColumnDef::new(Vehicles::Plate).string().not_null().unique_key())
                    .col(
                        ColumnDef::new(Vehicles::Status)
                            .string_len(16)
                            .not_null()
                            .default("available"),
                    )
                    .col(ColumnDef::new(Vehicles::Category).string_len(32).not_null())
                    .col(ColumnDef::new(Vehicles::RateLow).big_integer().not_null())
                    .col(ColumnDef::new(Vehicles::RateHigh).big_integer().not_null())
                    .col(ColumnDef::new(Vehicles::Seats).integer().not_null())
                    .col(ColumnDef::new(Vehicles::Doors).integer().not_null())
                    .col(
                        ColumnDef::new(Vehicles::AirConditioning)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Vehicles::Transmission).string_len(16).not_null())
                    .col(ColumnDef::new(Vehicles::MileagePolicy).string().not_null())
                    .col(ColumnDef::new(Vehicles::ImageUrl).text().null())
                    .col(
                        ColumnDef::new(Vehicles::Gallery)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(ColumnDef::new(Vehicles::AssignedProfileId).uuid().null())
                    .col(
                        ColumnDef::new(Vehicles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Vehicles::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vehicles_assigned_profile")
                            .from(Vehicles::Table, Vehicles::AssignedProfileId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_vehicles_status")
                    .table(Vehicles::Table)
                    .col(Vehicles::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vehicles::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Vehicles {
    Table,
    Id,
    Make,
    Model,
    Plate,
    Status,
    Category,
    RateLow,
    RateHigh,
    Seats,
    Doors,
    AirConditioning,
    Transmission,
    MileagePolicy,
    ImageUrl,
    Gallery,
    AssignedProfileId,
    CreatedAt,
    UpdatedAt,
}
