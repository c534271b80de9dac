//! Domain layer - rental entities, status machines and business rules.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.
//! Every status transition the platform allows is described here as a
//! predicate; the rental service turns them into conditional writes.

pub mod actor;
pub mod booking;
pub mod constants;
pub mod document;
pub mod error;
pub mod pricing;
pub mod profile;
pub mod vehicle;

pub use actor::{ActorContext, Role};
pub use booking::{Booking, BookingRequest, BookingResponse, BookingStatus, BookingView};
pub use constants::*;
pub use document::{AnalysisOutcome, AnalyzedDocument, DocumentSlot};
pub use error::{DomainError, DomainResult};
pub use pricing::Quote;
pub use profile::{
    ContactUpdate, DocumentRefs, ExtractedFields, NewProfile, Origin, Profile, ProfileResponse,
    RentalNote, ReviewDecision, VerificationStatus,
};
pub use vehicle::{Transmission, Vehicle, VehicleCategory, VehicleSpec, VehicleStatus};
