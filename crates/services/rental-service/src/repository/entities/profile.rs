//! Profile database entity for SeaORM.

use sea_orm::entity::prelude::*;

use common::AppResult;
use domain::{DocumentRefs, ExtractedFields, Profile, RentalNote, Role};

use super::corrupt;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub full_name: String,
    pub phone: Option<String>,
    pub email: String,
    pub country: Option<String>,
    pub locale: String,
    pub status: String,
    pub role: String,
    pub id_front_url: Option<String>,
    pub id_back_url: Option<String>,
    pub passport_url: Option<String>,
    pub license_front_url: Option<String>,
    pub license_back_url: Option<String>,
    pub extracted_full_name: Option<String>,
    pub extracted_document_number: Option<String>,
    pub extracted_license_number: Option<String>,
    pub extracted_birth_date: Option<Date>,
    pub extracted_address: Option<String>,
    pub extracted_license_issue_date: Option<Date>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::rental_note::Entity")]
    RentalNote,
    #[sea_orm(has_many = "super::booking::Entity")]
    Booking,
}

impl Related<super::rental_note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RentalNote.def()
    }
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Booking.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Convert to the domain entity, attaching the ordered rental history.
    pub fn into_profile(self, rental_history: Vec<RentalNote>) -> AppResult<Profile> {
        Ok(Profile {
            id: self.id,
            full_name: self.full_name,
            phone: self.phone,
            email: self.email,
            country: self.country,
            locale: self.locale,
            status: self.status.parse().map_err(corrupt("profiles"))?,
            role: Role::from(self.role.as_str()),
            rental_history,
            documents: DocumentRefs {
                id_front_url: self.id_front_url,
                id_back_url: self.id_back_url,
                passport_url: self.passport_url,
                license_front_url: self.license_front_url,
                license_back_url: self.license_back_url,
            },
            extracted: ExtractedFields {
                full_name: self.extracted_full_name,
                document_number: self.extracted_document_number,
                license_number: self.extracted_license_number,
                birth_date: self.extracted_birth_date,
                address: self.extracted_address,
                license_issue_date: self.extracted_license_issue_date,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
