//! Database migrations.
//!
//! Migration names follow the pattern: m{YYYYMMDD}_{NNNNNN}_{description}

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_profiles_table;
mod m20250101_000002_create_vehicles_table;
mod m20250101_000003_create_bookings_table;
mod m20250101_000004_create_rental_notes_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_profiles_table::Migration),
            Box::new(m20250101_000002_create_vehicles_table::Migration),
            Box::new(m20250101_000003_create_bookings_table::Migration),
            Box::new(m20250101_000004_create_rental_notes_table::Migration),
        ]
    }
}
