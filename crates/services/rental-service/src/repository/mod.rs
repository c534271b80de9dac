//! Repository layer for data access.

pub mod entities;
mod memory;
mod postgres;
mod store;

pub use memory::{Fault, MemoryRentalStore, MemoryRentalTx};
pub use postgres::{PgRentalStore, PgRentalTx};
pub use store::{finish, RentalStore, RentalTx};
