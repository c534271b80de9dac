//! Migration: profiles with document references and extracted fields.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Profiles::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Profiles::FullName).string().not_null())
                    .col(ColumnDef::new(Profiles::Phone).string().null())
                    .col(ColumnDef::new(Profiles::Email).string().not_null())
                    .col(ColumnDef::new(Profiles::Country).string().null())
                    .col(
                        ColumnDef::new(Profiles::Locale)
                            .string_len(8)
                            .not_null()
                            .default("fr"),
                    )
                    .col(
                        ColumnDef::new(Profiles::Status)
                            .string_len(16)
                            .not_null()
                            .default("registered"),
                    )
                    .col(
                        ColumnDef::new(Profiles::Role)
                            .string_len(16)
                            .not_null()
                            .default("client"),
                    )
                    .col(ColumnDef::new(Profiles::IdFrontUrl).text().null())
                    .col(ColumnDef::new(Profiles::IdBackUrl).text().null())
                    .col(ColumnDef::new(Profiles::PassportUrl).text().null())
                    .col(ColumnDef::new(Profiles::LicenseFrontUrl).text().null())
                    .col(ColumnDef::new(Profiles::LicenseBackUrl).text().null())
                    .col(ColumnDef::new(Profiles::ExtractedFullName).string().null())
                    .col(ColumnDef::new(Profiles::ExtractedDocumentNumber).string().null())
                    .col(ColumnDef::new(Profiles::ExtractedLicenseNumber).string().null())
                    .col(ColumnDef::new(Profiles::ExtractedBirthDate).date().null())
                    .col(ColumnDef::new(Profiles::ExtractedAddress).text().null())
                    .col(ColumnDef::new(Profiles::ExtractedLicenseIssueDate).date().null())
                    .col(
                        ColumnDef::new(Profiles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Profiles::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_profiles_status")
                    .table(Profiles::Table)
                    .col(Profiles::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Profiles::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Profiles {
    Table,
    Id,
    FullName,
    Phone,
    Email,
    Country,
    Locale,
    Status,
    Role,
    IdFrontUrl,
    IdBackUrl,
    PassportUrl,
    LicenseFrontUrl,
    LicenseBackUrl,
    ExtractedFullName,
    ExtractedDocumentNumber,
    ExtractedLicenseNumber,
    ExtractedBirthDate,
    ExtractedAddress,
    ExtractedLicenseIssueDate,
    CreatedAt,
    UpdatedAt,
}
