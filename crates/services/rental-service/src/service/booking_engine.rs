//! Booking engine - owns every transition of the booking/vehicle pair.
//!
//! Each mutating operation runs in one store transaction made of
//! compare-and-swap writes. If any write reports that its precondition no
//! longer holds, the operation fails with `Conflict` and the transaction is
//! rolled back, so a confirmed booking and its rented vehicle are always
//! written together or not at all.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use common::{AppError, AppResult, OptionExt};
use domain::booking::normalize_flight_number;
use domain::{
    ActorContext, Booking, BookingRequest, BookingStatus, BookingView, Profile, RentalNote,
    Vehicle,
};

use super::notification::{Notice, NotificationDispatcher};
use super::rejected;
use crate::repository::{finish, RentalStore, RentalTx};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Booking operations for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait BookingService: Send + Sync {
    /// Create a pending booking for `profile_id`. The profile must pass the
    /// verification gate unless the caller is an admin.
    async fn create_booking(
        &self,
        actor: ActorContext,
        profile_id: Uuid,
        request: BookingRequest,
    ) -> AppResult<Booking>;

    /// Admin: `pending -> confirmed`, occupying the vehicle in the same write.
    async fn assign_and_confirm(
        &self,
        actor: ActorContext,
        booking_id: Uuid,
        vehicle_id: Uuid,
    ) -> AppResult<Booking>;

    /// Admin: `confirmed -> completed`, releasing the vehicle and optionally
    /// appending a note to the client's rental history.
    async fn complete_return(
        &self,
        actor: ActorContext,
        booking_id: Uuid,
        note: Option<String>,
    ) -> AppResult<Booking>;

    /// Admin: remove a booking, releasing its vehicle if it holds one.
    async fn delete_booking(&self, actor: ActorContext, booking_id: Uuid) -> AppResult<()>;

    /// Newest first. Admins see every booking, clients their own.
    async fn list_bookings(&self, actor: ActorContext, view: BookingView)
        -> AppResult<Vec<Booking>>;

    async fn get_booking(&self, actor: ActorContext, booking_id: Uuid) -> AppResult<Booking>;

    /// Owner: attach a flight reference to a pending booking.
    async fn set_flight_number(
        &self,
        actor: ActorContext,
        booking_id: Uuid,
        flight_number: String,
    ) -> AppResult<Booking>;

    /// Admin: flag a completed booking as archived.
    async fn archive_booking(&self, actor: ActorContext, booking_id: Uuid) -> AppResult<Booking>;
}

/// Store-backed booking engine.
pub struct BookingEngine {
    store: Arc<dyn RentalStore>,
    notifier: NotificationDispatcher,
}

impl BookingEngine {
    pub fn new(store: Arc<dyn RentalStore>, notifier: NotificationDispatcher) -> Self {
        Self { store, notifier }
    }

    async fn reload(tx: &mut dyn RentalTx, booking_id: Uuid) -> AppResult<Booking> {
        tx.find_booking(booking_id).await?.ok_or_not_found("Booking")
    }

    async fn confirm_in(
        tx: &mut dyn RentalTx,
        booking_id: Uuid,
        vehicle_id: Uuid,
    ) -> AppResult<(Booking, Vehicle)> {
        let booking = Self::reload(tx, booking_id).await?;
        if !booking.status.can_transition_to(BookingStatus::Confirmed) {
            return Err(rejected(format!(
                "Booking is {}, only pending bookings can be confirmed",
                booking.status
            )));
        }

        let vehicle = tx
            .find_vehicle(vehicle_id)
            .await?
            .ok_or_not_found("Vehicle")?;
        if !vehicle.is_available() {
            return Err(rejected(format!(
                "Vehicle {} is {}, not available",
                vehicle.plate, vehicle.status
            )));
        }

        if !tx.confirm_booking(booking_id, vehicle_id).await? {
            return Err(rejected("Booking was confirmed by someone else".to_string()));
        }
        if !tx.occupy_vehicle(vehicle_id, booking.profile_id).await? {
            return Err(rejected(format!(
                "Vehicle {} is no longer available",
                vehicle.plate
            )));
        }

        Ok((Self::reload(tx, booking_id).await?, vehicle))
    }

    async fn complete_in(
        tx: &mut dyn RentalTx,
        booking_id: Uuid,
        note: Option<RentalNote>,
    ) -> AppResult<Booking> {
        let booking = Self::reload(tx, booking_id).await?;
        if !booking.status.can_transition_to(BookingStatus::Completed) {
            return Err(rejected(format!(
                "Booking is {}, only confirmed bookings can be returned",
                booking.status
            )));
        }

        if !tx.complete_booking(booking_id).await? {
            return Err(rejected("Booking was returned by someone else".to_string()));
        }
        if let Some(vehicle_id) = booking.vehicle_id {
            if !tx.release_vehicle(vehicle_id).await? {
                return Err(rejected(format!("Vehicle {} is not rented", vehicle_id)));
            }
        }
        if let Some(note) = note {
            tx.append_note(booking.profile_id, &note).await?;
        }

        Self::reload(tx, booking_id).await
    }

    async fn delete_in(tx: &mut dyn RentalTx, booking_id: Uuid) -> AppResult<Booking> {
        let booking = Self::reload(tx, booking_id).await?;

        if let Some(vehicle_id) = booking.holds_vehicle() {
            if !tx.release_vehicle(vehicle_id).await? {
                return Err(rejected(format!("Vehicle {} is not rented", vehicle_id)));
            }
        }
        if !tx.delete_booking(booking_id, booking.status).await? {
            return Err(rejected(
                "Booking changed while it was being deleted".to_string(),
            ));
        }
        Ok(booking)
    }
}

fn ensure_may_book(actor: &ActorContext, profile: &Profile) -> AppResult<()> {
    if actor.is_admin() || profile.can_initiate_booking() {
        return Ok(());
    }
    Err(AppError::forbidden(format!(
        "Profile is {}, identity verification is required before booking",
        profile.status
    )))
}

#[async_trait]
impl BookingService for BookingEngine {
    async fn create_booking(
        &self,
        actor: ActorContext,
        profile_id: Uuid,
        request: BookingRequest,
    ) -> AppResult<Booking> {
        actor.require_self_or_admin(profile_id)?;
        request.validate()?;

        let profile = self
            .store
            .find_profile(profile_id)
            .await?
            .ok_or_not_found("Profile")?;
        ensure_may_book(&actor, &profile)?;
        if let Some(vehicle_id) = request.requested_vehicle_id {
            self.store
                .find_vehicle(vehicle_id)
                .await?
                .ok_or_not_found("Vehicle")?;
        }

        let booking = Booking::pending(Uuid::new_v4(), profile_id, request);
        let mut tx = self.store.begin().await?;
        let result = async {
            // A revocation may have landed since the snapshot read.
            let profile = tx
                .lock_profile(profile_id)
                .await?
                .ok_or_not_found("Profile")?;
            ensure_may_book(&actor, &profile)?;
            tx.insert_booking(&booking).await
        }
        .await;
        finish(tx, result).await?;

        tracing::info!(booking_id = %booking.id, profile_id = %profile_id, "Booking created");
        Ok(booking)
    }

    async fn assign_and_confirm(
        &self,
        actor: ActorContext,
        booking_id: Uuid,
        vehicle_id: Uuid,
    ) -> AppResult<Booking> {
        actor.require_admin()?;

        let mut tx = self.store.begin().await?;
        let result = Self::confirm_in(tx.as_mut(), booking_id, vehicle_id).await;
        let (booking, vehicle) = finish(tx, result).await?;

        tracing::info!(
            booking_id = %booking_id,
            vehicle_id = %vehicle_id,
            profile_id = %booking.profile_id,
            "Booking confirmed"
        );

        // Delivery runs after commit and cannot undo the confirmation.
        match self.store.find_profile(booking.profile_id).await {
            Ok(Some(profile)) => {
                let notice = Notice::BookingConfirmed {
                    customer_name: profile.full_name.clone(),
                    vehicle: vehicle.descriptor(),
                    plate: vehicle.plate.clone(),
                    pickup_at: booking.pickup_at,
                };
                self.notifier.dispatch(&profile, notice);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(
                booking_id = %booking_id,
                error = %e,
                "Confirmation notice skipped"
            ),
        }

        Ok(booking)
    }

    async fn complete_return(
        &self,
        actor: ActorContext,
        booking_id: Uuid,
        note: Option<String>,
    ) -> AppResult<Booking> {
        actor.require_admin()?;
        let note = note
            .filter(|n| !n.trim().is_empty())
            .map(|n| RentalNote::new(actor.profile_id, &n, Utc::now()))
            .transpose()?;
        let noted = note.is_some();

        let mut tx = self.store.begin().await?;
        let result = Self::complete_in(tx.as_mut(), booking_id, note).await;
        let booking = finish(tx, result).await?;

        tracing::info!(
            booking_id = %booking_id,
            vehicle_id = ?booking.returned_vehicle_id,
            noted,
            "Booking completed"
        );
        Ok(booking)
    }

    async fn delete_booking(&self, actor: ActorContext, booking_id: Uuid) -> AppResult<()> {
        actor.require_admin()?;

        let mut tx = self.store.begin().await?;
        let result = Self::delete_in(tx.as_mut(), booking_id).await;
        let booking = finish(tx, result).await?;

        tracing::info!(
            booking_id = %booking_id,
            status = %booking.status,
            released_vehicle = ?booking.holds_vehicle(),
            "Booking deleted"
        );
        Ok(())
    }

    async fn list_bookings(
        &self,
        actor: ActorContext,
        view: BookingView,
    ) -> AppResult<Vec<Booking>> {
        let owner = (!actor.is_admin()).then_some(actor.profile_id);
        let bookings = self.store.list_bookings(owner).await?;
        Ok(bookings.into_iter().filter(|b| view.matches(b)).collect())
    }

    async fn get_booking(&self, actor: ActorContext, booking_id: Uuid) -> AppResult<Booking> {
        let booking = self
            .store
            .find_booking(booking_id)
            .await?
            .ok_or_not_found("Booking")?;
        actor.require_self_or_admin(booking.profile_id)?;
        Ok(booking)
    }

    async fn set_flight_number(
        &self,
        actor: ActorContext,
        booking_id: Uuid,
        flight_number: String,
    ) -> AppResult<Booking> {
        let flight_number = normalize_flight_number(&flight_number)?;

        let mut tx = self.store.begin().await?;
        let result = async {
            let booking = Self::reload(tx.as_mut(), booking_id).await?;
            actor.require_self_or_admin(booking.profile_id)?;
            if booking.status != BookingStatus::Pending {
                return Err(rejected(format!(
                    "Booking is {}, the flight can only be changed while pending",
                    booking.status
                )));
            }
            if !tx.set_flight_number(booking_id, &flight_number).await? {
                return Err(rejected("Booking is no longer pending".to_string()));
            }
            Self::reload(tx.as_mut(), booking_id).await
        }
        .await;
        finish(tx, result).await
    }

    async fn archive_booking(&self, actor: ActorContext, booking_id: Uuid) -> AppResult<Booking> {
        actor.require_admin()?;

        let mut tx = self.store.begin().await?;
        let result = async {
            let booking = Self::reload(tx.as_mut(), booking_id).await?;
            if booking.status != BookingStatus::Completed {
                return Err(rejected(format!(
                    "Booking is {}, only completed bookings can be archived",
                    booking.status
                )));
            }
            if !tx.archive_booking(booking_id).await? {
                return Err(rejected("Booking is no longer completed".to_string()));
            }
            Self::reload(tx.as_mut(), booking_id).await
        }
        .await;
        let booking = finish(tx, result).await?;

        tracing::info!(booking_id = %booking_id, "Booking archived");
        Ok(booking)
    }
}
