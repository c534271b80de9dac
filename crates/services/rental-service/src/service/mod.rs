//! Application services - the rental use cases.
//!
//! Services orchestrate domain rules and the store seam. Every caller is
//! identified by an explicit `ActorContext`; every status change goes
//! through a conditional write inside one store transaction.

mod booking_engine;
pub mod container;
mod document_intake;
mod fleet;
mod identity_gate;
mod notification;
mod profile;
pub mod templates;

use common::AppError;

// Service Container
pub use container::{Collaborators, ServiceContainer, Services};

// Service traits and implementations
pub use booking_engine::{BookingEngine, BookingService};
pub use document_intake::{decode_image, document_path, DocumentIntake};
pub use fleet::{FleetManager, FleetService};
pub use identity_gate::{IdentityGate, Submission, VerificationService};
pub use notification::{Notice, NotificationDispatcher};
pub use profile::{ProfileManager, ProfileService};

#[cfg(any(test, feature = "test-utils"))]
pub use booking_engine::MockBookingService;
#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
#[cfg(any(test, feature = "test-utils"))]
pub use fleet::MockFleetService;
#[cfg(any(test, feature = "test-utils"))]
pub use identity_gate::MockVerificationService;
#[cfg(any(test, feature = "test-utils"))]
pub use profile::MockProfileService;

/// A precondition did not hold when the write was attempted.
pub(crate) fn rejected(message: String) -> AppError {
    tracing::warn!(reason = %message, "Conditional write rejected");
    AppError::Conflict(message)
}
