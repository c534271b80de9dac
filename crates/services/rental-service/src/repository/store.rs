//! Persistence seam for profiles, vehicles and bookings.
//!
//! Reads go through [`RentalStore`] and may be served from any consistent
//! snapshot. Every write goes through a [`RentalTx`]: status-gated writes
//! are conditional on the expected current status and report whether they
//! were applied, so a losing concurrent writer sees `false` instead of
//! overwriting state.

use async_trait::async_trait;
use uuid::Uuid;

use common::AppResult;
use domain::{
    Booking, DocumentSlot, ExtractedFields, Profile, RentalNote, Vehicle, VehicleSpec,
    VehicleStatus, VerificationStatus,
};

/// Snapshot reads and transaction factory.
#[async_trait]
pub trait RentalStore: Send + Sync {
    async fn find_profile(&self, id: Uuid) -> AppResult<Option<Profile>>;

    /// Client profiles, newest first, optionally filtered by status
    async fn list_profiles(&self, status: Option<VerificationStatus>) -> AppResult<Vec<Profile>>;

    async fn find_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>>;

    async fn list_vehicles(&self, status: Option<VehicleStatus>) -> AppResult<Vec<Vehicle>>;

    async fn find_booking(&self, id: Uuid) -> AppResult<Option<Booking>>;

    /// Bookings, newest first; `owner` restricts to one profile
    async fn list_bookings(&self, owner: Option<Uuid>) -> AppResult<Vec<Booking>>;

    /// Check the backend is reachable
    async fn ping(&self) -> AppResult<()>;

    /// Open a transaction
    async fn begin(&self) -> AppResult<Box<dyn RentalTx>>;
}

/// Unit of work over the rental tables.
///
/// Methods returning `bool` are compare-and-swap writes: `false` means the
/// row was missing or not in the expected status and nothing was written.
#[async_trait]
pub trait RentalTx: Send {
    // =========================================================================
    // Profiles
    // =========================================================================

    async fn find_profile(&mut self, id: Uuid) -> AppResult<Option<Profile>>;

    /// Read the profile and hold its row until the transaction ends.
    /// Status changes, deletion and new bookings for the profile wait on it.
    async fn lock_profile(&mut self, id: Uuid) -> AppResult<Option<Profile>>;

    async fn insert_profile(&mut self, profile: &Profile) -> AppResult<()>;

    /// Write contact fields (name, phone, email, country, locale).
    async fn update_contact(&mut self, profile: &Profile) -> AppResult<bool>;

    /// Store a document reference and the merged extracted fields.
    async fn save_document(
        &mut self,
        profile_id: Uuid,
        slot: DocumentSlot,
        url: &str,
        extracted: &ExtractedFields,
    ) -> AppResult<bool>;

    /// `status` moves to `to` only if it is currently one of `from`.
    async fn transition_profile(
        &mut self,
        id: Uuid,
        from: &[VerificationStatus],
        to: VerificationStatus,
    ) -> AppResult<bool>;

    async fn append_note(&mut self, profile_id: Uuid, note: &RentalNote) -> AppResult<()>;

    /// Bookings of the profile that are pending or confirmed
    async fn count_live_bookings(&mut self, profile_id: Uuid) -> AppResult<u64>;

    /// Delete the profile, its notes and its remaining bookings.
    async fn delete_profile(&mut self, id: Uuid) -> AppResult<bool>;

    // =========================================================================
    // Vehicles
    // =========================================================================

    async fn find_vehicle(&mut self, id: Uuid) -> AppResult<Option<Vehicle>>;

    async fn insert_vehicle(&mut self, vehicle: &Vehicle) -> AppResult<()>;

    /// Write descriptive attributes. Never touches status or assignment.
    async fn update_vehicle_spec(&mut self, id: Uuid, spec: &VehicleSpec) -> AppResult<bool>;

    /// Move an unassigned vehicle between non-rented statuses.
    async fn set_vehicle_status(
        &mut self,
        id: Uuid,
        from: VehicleStatus,
        to: VehicleStatus,
    ) -> AppResult<bool>;

    /// `available -> rented`, stamping the assigned profile.
    async fn occupy_vehicle(&mut self, id: Uuid, profile_id: Uuid) -> AppResult<bool>;

    /// `rented -> available`, clearing the assignment.
    async fn release_vehicle(&mut self, id: Uuid) -> AppResult<bool>;

    /// Delete a vehicle that is not rented.
    async fn delete_vehicle(&mut self, id: Uuid) -> AppResult<bool>;

    // =========================================================================
    // Bookings
    // =========================================================================

    async fn find_booking(&mut self, id: Uuid) -> AppResult<Option<Booking>>;

    async fn insert_booking(&mut self, booking: &Booking) -> AppResult<()>;

    /// `pending -> confirmed` with the assigned vehicle.
    async fn confirm_booking(&mut self, id: Uuid, vehicle_id: Uuid) -> AppResult<bool>;

    /// `confirmed -> completed`, moving the assignment to the returned vehicle.
    async fn complete_booking(&mut self, id: Uuid) -> AppResult<bool>;

    /// Set the flight reference of a pending booking.
    async fn set_flight_number(&mut self, id: Uuid, flight_number: &str) -> AppResult<bool>;

    /// Flag a completed booking as archived.
    async fn archive_booking(&mut self, id: Uuid) -> AppResult<bool>;

    /// Delete the booking if it is still in `expected` status.
    async fn delete_booking(
        &mut self,
        id: Uuid,
        expected: domain::BookingStatus,
    ) -> AppResult<bool>;

    // =========================================================================
    // Lifecycle
    // =========================================================================

    async fn commit(self: Box<Self>) -> AppResult<()>;

    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// Commit on success, roll back on error.
pub async fn finish<T>(tx: Box<dyn RentalTx>, result: AppResult<T>) -> AppResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!("Transaction rollback failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}
