//! Rental history entries. Append-only; `id` gives insertion order.

use sea_orm::entity::prelude::*;

use domain::RentalNote;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "rental_notes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub profile_id: Uuid,
    pub author_id: Uuid,
    pub note: String,
    pub recorded_at: DateTimeUtc,
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

impl From<Model> for RentalNote {
    fn from(model: Model) -> Self {
        RentalNote {
            recorded_at: model.recorded_at,
            author_id: model.author_id,
            note: model.note,
        }
    }
}
