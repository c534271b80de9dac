//! SeaORM entities.

pub mod booking;
pub mod profile;
pub mod rental_note;
pub mod vehicle;

use common::AppError;
use domain::DomainError;

/// A stored value that no longer parses is a data error, not caller input.
pub(crate) fn corrupt(table: &'static str) -> impl FnOnce(DomainError) -> AppError {
    move |e| AppError::internal(format!("Corrupt {} row: {}", table, e))
}
