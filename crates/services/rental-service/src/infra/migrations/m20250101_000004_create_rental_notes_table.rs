//! Migration: append-only rental history.

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
                    .table(RentalNotes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RentalNotes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RentalNotes::ProfileId).uuid().not_null())
                    .col(ColumnDef::new(RentalNotes::AuthorId).uuid().not_null())
                    .col(ColumnDef::new(RentalNotes::Note).text().not_null())
                    .col(
                        ColumnDef::new(RentalNotes::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rental_notes_profile")
                            .from(RentalNotes::Table, RentalNotes::ProfileId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_rental_notes_profile_id")
                    .table(RentalNotes::Table)
                    .col(RentalNotes::ProfileId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RentalNotes::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum RentalNotes {
    Table,
    Id,
    ProfileId,
    AuthorId,
    Note,
    RecordedAt,
}
