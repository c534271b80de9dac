//! In-memory rental store.
//!
//! Transactions hold the store lock for their whole lifetime and work on a
//! staged copy that replaces the shared state on commit. Writers are
//! therefore serialized, and a rollback (or a dropped transaction) leaves
//! no trace.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{
    Booking, BookingRequest, BookingStatus, DocumentSlot, ExtractedFields, Profile, RentalNote, Vehicle,
    VehicleSpec, VehicleStatus, VerificationStatus,
};

use super::store::{RentalStore, RentalTx};

/// Failure points that can be armed on a [`MemoryRentalStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Next `occupy_vehicle` reports a lost race
    OccupyVehicle,
    /// Next `release_vehicle` reports a lost race
    ReleaseVehicle,
    /// Next commit fails
    Commit,
    /// Another writer revokes the profile just before the next `lock_profile`
    RevokeBeforeLock,
    /// Another writer books for the profile just before the next `lock_profile`
    BookBeforeLock,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    profiles: HashMap<Uuid, Profile>,
    vehicles: HashMap<Uuid, Vehicle>,
    bookings: HashMap<Uuid, Booking>,
}

/// Rental store kept in process memory.
#[derive(Clone, Default)]
pub struct MemoryRentalStore {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<Mutex<Vec<Fault>>>,
}

impl MemoryRentalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a one-shot failure.
    pub async fn arm_fault(&self, fault: Fault) {
        self.faults.lock().await.push(fault);
    }

    /// Insert records directly, bypassing the engine. For seeding.
    pub async fn seed_profile(&self, profile: Profile) {
        self.state.lock().await.profiles.insert(profile.id, profile);
    }

    pub async fn seed_vehicle(&self, vehicle: Vehicle) {
        self.state.lock().await.vehicles.insert(vehicle.id, vehicle);
    }

    pub async fn seed_booking(&self, booking: Booking) {
        self.state.lock().await.bookings.insert(booking.id, booking);
    }
}

fn newest_first<T>(items: &mut [T], created: impl Fn(&T) -> chrono::DateTime<Utc>) {
    items.sort_by_key(|item| std::cmp::Reverse(created(item)));
}

#[async_trait]
impl RentalStore for MemoryRentalStore {
    async fn find_profile(&self, id: Uuid) -> AppResult<Option<Profile>> {
        Ok(self.state.lock().await.profiles.get(&id).cloned())
    }

    async fn list_profiles(&self, status: Option<VerificationStatus>) -> AppResult<Vec<Profile>> {
        let state = self.state.lock().await;
        let mut profiles: Vec<Profile> = state
            .profiles
            .values()
            .filter(|p| !p.is_admin())
            .filter(|p| status.map_or(true, |s| p.status == s))
            .cloned()
            .collect();
        newest_first(&mut profiles, |p| p.created_at);
        Ok(profiles)
    }

    async fn find_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        Ok(self.state.lock().await.vehicles.get(&id).cloned())
    }

    async fn list_vehicles(&self, status: Option<VehicleStatus>) -> AppResult<Vec<Vehicle>> {
        let state = self.state.lock().await;
        let mut vehicles: Vec<Vehicle> = state
            .vehicles
            .values()
            .filter(|v| status.map_or(true, |s| v.status == s))
            .cloned()
            .collect();
        newest_first(&mut vehicles, |v| v.created_at);
        Ok(vehicles)
    }

    async fn find_booking(&self, id: Uuid) -> AppResult<Option<Booking>> {
        Ok(self.state.lock().await.bookings.get(&id).cloned())
    }

    async fn list_bookings(&self, owner: Option<Uuid>) -> AppResult<Vec<Booking>> {
        let state = self.state.lock().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| owner.map_or(true, |o| b.profile_id == o))
            .cloned()
            .collect();
        newest_first(&mut bookings, |b| b.created_at);
        Ok(bookings)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn begin(&self) -> AppResult<Box<dyn RentalTx>> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryRentalTx {
            guard,
            staged,
            faults: self.faults.clone(),
        }))
    }
}

/// Transaction over a [`MemoryRentalStore`].
pub struct MemoryRentalTx {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
    faults: Arc<Mutex<Vec<Fault>>>,
}

impl MemoryRentalTx {
    async fn take_fault(&self, fault: Fault) -> bool {
        let mut faults = self.faults.lock().await;
        match faults.iter().position(|f| *f == fault) {
            Some(index) => {
                faults.remove(index);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl RentalTx for MemoryRentalTx {
    async fn find_profile(&mut self, id: Uuid) -> AppResult<Option<Profile>> {
        Ok(self.staged.profiles.get(&id).cloned())
    }

    async fn lock_profile(&mut self, id: Uuid) -> AppResult<Option<Profile>> {
        // The store lock is already exclusive, so only the armed interleavings apply.
        if self.take_fault(Fault::RevokeBeforeLock).await {
            if let Some(profile) = self.staged.profiles.get_mut(&id) {
                profile.status = VerificationStatus::Registered;
            }
        }
        if self.take_fault(Fault::BookBeforeLock).await && self.staged.profiles.contains_key(&id) {
            let now = Utc::now();
            let booking = Booking::pending(
                Uuid::new_v4(),
                id,
                BookingRequest {
                    pickup_location: "Agency".to_string(),
                    return_location: "Agency".to_string(),
                    pickup_at: now,
                    return_at: now,
                    total_price: 0,
                    requested_vehicle_id: None,
                },
            );
            self.staged.bookings.insert(booking.id, booking);
        }
        Ok(self.staged.profiles.get(&id).cloned())
    }

    async fn insert_profile(&mut self, profile: &Profile) -> AppResult<()> {
        if self.staged.profiles.contains_key(&profile.id) {
            return Err(AppError::conflict("Profile already exists"));
        }
        self.staged.profiles.insert(profile.id, profile.clone());
        Ok(())
    }

    async fn update_contact(&mut self, profile: &Profile) -> AppResult<bool> {
        let Some(stored) = self.staged.profiles.get_mut(&profile.id) else {
            return Ok(false);
        };
        stored.full_name = profile.full_name.clone();
        stored.phone = profile.phone.clone();
        stored.email = profile.email.clone();
        stored.country = profile.country.clone();
        stored.locale = profile.locale.clone();
        stored.updated_at = Utc::now();
        Ok(true)
    }

    async fn save_document(
        &mut self,
        profile_id: Uuid,
        slot: DocumentSlot,
        url: &str,
        extracted: &ExtractedFields,
    ) -> AppResult<bool> {
        let Some(stored) = self.staged.profiles.get_mut(&profile_id) else {
            return Ok(false);
        };
        stored.documents.set(slot, url.to_string());
        stored.extracted = extracted.clone();
        stored.updated_at = Utc::now();
        Ok(true)
    }

    async fn transition_profile(
        &mut self,
        id: Uuid,
        from: &[VerificationStatus],
        to: VerificationStatus,
    ) -> AppResult<bool> {
        match self.staged.profiles.get_mut(&id) {
            Some(profile) if from.contains(&profile.status) => {
                profile.status = to;
                profile.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn append_note(&mut self, profile_id: Uuid, note: &RentalNote) -> AppResult<()> {
        let profile = self
            .staged
            .profiles
            .get_mut(&profile_id)
            .ok_or_else(|| AppError::not_found("Profile"))?;
        profile.rental_history.push(note.clone());
        Ok(())
    }

    async fn count_live_bookings(&mut self, profile_id: Uuid) -> AppResult<u64> {
        Ok(self
            .staged
            .bookings
            .values()
            .filter(|b| b.profile_id == profile_id && b.status.is_live())
            .count() as u64)
    }

    async fn delete_profile(&mut self, id: Uuid) -> AppResult<bool> {
        if self.staged.profiles.remove(&id).is_none() {
            return Ok(false);
        }
        self.staged.bookings.retain(|_, b| b.profile_id != id);
        for vehicle in self.staged.vehicles.values_mut() {
            if vehicle.assigned_profile_id == Some(id) {
                vehicle.assigned_profile_id = None;
            }
        }
        Ok(true)
    }

    async fn find_vehicle(&mut self, id: Uuid) -> AppResult<Option<Vehicle>> {
        Ok(self.staged.vehicles.get(&id).cloned())
    }

    async fn insert_vehicle(&mut self, vehicle: &Vehicle) -> AppResult<()> {
        let plate_taken = self
            .staged
            .vehicles
            .values()
            .any(|v| v.plate.eq_ignore_ascii_case(&vehicle.plate));
        if plate_taken {
            return Err(AppError::conflict(format!(
                "A vehicle with plate {} already exists",
                vehicle.plate
            )));
        }
        self.staged.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(())
    }

    async fn update_vehicle_spec(&mut self, id: Uuid, spec: &VehicleSpec) -> AppResult<bool> {
        let plate_taken = self
            .staged
            .vehicles
            .values()
            .any(|v| v.id != id && v.plate.eq_ignore_ascii_case(&spec.plate));
        if plate_taken {
            return Err(AppError::conflict(format!(
                "A vehicle with plate {} already exists",
                spec.plate
            )));
        }
        let Some(vehicle) = self.staged.vehicles.get_mut(&id) else {
            return Ok(false);
        };
        vehicle.apply_spec(spec.clone());
        Ok(true)
    }

    async fn set_vehicle_status(
        &mut self,
        id: Uuid,
        from: VehicleStatus,
        to: VehicleStatus,
    ) -> AppResult<bool> {
        match self.staged.vehicles.get_mut(&id) {
            Some(v) if v.status == from && v.assigned_profile_id.is_none() => {
                v.status = to;
                v.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn occupy_vehicle(&mut self, id: Uuid, profile_id: Uuid) -> AppResult<bool> {
        if self.take_fault(Fault::OccupyVehicle).await {
            return Ok(false);
        }
        match self.staged.vehicles.get_mut(&id) {
            Some(v) if v.status == VehicleStatus::Available => {
                v.status = VehicleStatus::Rented;
                v.assigned_profile_id = Some(profile_id);
                v.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_vehicle(&mut self, id: Uuid) -> AppResult<bool> {
        if self.take_fault(Fault::ReleaseVehicle).await {
            return Ok(false);
        }
        match self.staged.vehicles.get_mut(&id) {
            Some(v) if v.status == VehicleStatus::Rented => {
                v.status = VehicleStatus::Available;
                v.assigned_profile_id = None;
                v.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_vehicle(&mut self, id: Uuid) -> AppResult<bool> {
        match self.staged.vehicles.get(&id) {
            Some(v) if v.status != VehicleStatus::Rented => {
                self.staged.vehicles.remove(&id);
            }
            _ => return Ok(false),
        }
        for booking in self.staged.bookings.values_mut() {
            if booking.requested_vehicle_id == Some(id) {
                booking.requested_vehicle_id = None;
            }
            if booking.returned_vehicle_id == Some(id) {
                booking.returned_vehicle_id = None;
            }
        }
        Ok(true)
    }

    async fn find_booking(&mut self, id: Uuid) -> AppResult<Option<Booking>> {
        Ok(self.staged.bookings.get(&id).cloned())
    }

    async fn insert_booking(&mut self, booking: &Booking) -> AppResult<()> {
        if !self.staged.profiles.contains_key(&booking.profile_id) {
            return Err(AppError::not_found("Profile"));
        }
        self.staged.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn confirm_booking(&mut self, id: Uuid, vehicle_id: Uuid) -> AppResult<bool> {
        let vehicle_taken = self.staged.bookings.values().any(|b| {
            b.id != id && b.status == BookingStatus::Confirmed && b.vehicle_id == Some(vehicle_id)
        });
        if vehicle_taken {
            return Ok(false);
        }
        match self.staged.bookings.get_mut(&id) {
            Some(b) if b.status == BookingStatus::Pending => {
                b.status = BookingStatus::Confirmed;
                b.vehicle_id = Some(vehicle_id);
                b.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn complete_booking(&mut self, id: Uuid) -> AppResult<bool> {
        match self.staged.bookings.get_mut(&id) {
            Some(b) if b.status == BookingStatus::Confirmed => {
                b.status = BookingStatus::Completed;
                b.returned_vehicle_id = b.vehicle_id.take();
                b.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_flight_number(&mut self, id: Uuid, flight_number: &str) -> AppResult<bool> {
        match self.staged.bookings.get_mut(&id) {
            Some(b) if b.status == BookingStatus::Pending => {
                b.flight_number = Some(flight_number.to_string());
                b.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn archive_booking(&mut self, id: Uuid) -> AppResult<bool> {
        match self.staged.bookings.get_mut(&id) {
            Some(b) if b.status == BookingStatus::Completed => {
                b.archived = true;
                b.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_booking(&mut self, id: Uuid, expected: BookingStatus) -> AppResult<bool> {
        match self.staged.bookings.get(&id) {
            Some(b) if b.status == expected => {
                self.staged.bookings.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        if self.take_fault(Fault::Commit).await {
            return Err(AppError::internal("Injected commit failure"));
        }
        let MemoryRentalTx {
            mut guard, staged, ..
        } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}
