//! Identity & verification gate.
//!
//! Clients upload their documents slot by slot, then finalize the
//! submission, which puts the profile in front of an admin. Only the
//! review decision (and the admin revoke) change the status afterwards.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use common::{AppError, AppResult, OptionExt};
use domain::booking::normalize_flight_number;
use domain::{
    ActorContext, BookingStatus, DocumentSlot, Origin, Profile, ReviewDecision, VerificationStatus,
};

use super::document_intake::DocumentIntake;
use super::notification::{Notice, NotificationDispatcher};
use super::rejected;
use crate::repository::{finish, RentalStore, RentalTx};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Closing step of a document submission.
#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    pub origin: Origin,
    /// Required for foreign clients
    pub flight_number: Option<String>,
    /// Booking the submission was started from, if any
    pub booking_id: Option<Uuid>,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait VerificationService: Send + Sync {
    /// Analyse and store one document image. Never changes the status.
    async fn submit_document(
        &self,
        actor: ActorContext,
        profile_id: Uuid,
        slot: DocumentSlot,
        image: Vec<u8>,
    ) -> AppResult<Profile>;

    /// `registered | rejected -> pending` once the required slots are filled.
    async fn finalize_submission(
        &self,
        actor: ActorContext,
        profile_id: Uuid,
        submission: Submission,
    ) -> AppResult<Profile>;

    /// Admin decision on a pending profile.
    async fn review_decision(
        &self,
        actor: ActorContext,
        profile_id: Uuid,
        decision: ReviewDecision,
    ) -> AppResult<Profile>;

    /// Admin correction: `verified | rejected -> registered`.
    async fn revoke_verification(&self, actor: ActorContext, profile_id: Uuid)
        -> AppResult<Profile>;

    async fn can_initiate_booking(&self, actor: ActorContext, profile_id: Uuid) -> AppResult<bool>;
}

pub struct IdentityGate {
    store: Arc<dyn RentalStore>,
    intake: Arc<DocumentIntake>,
    notifier: NotificationDispatcher,
}

/// Result of a finalized submission, kept for the acknowledgment.
struct Finalized {
    profile: Profile,
    vehicle: Option<String>,
}

impl IdentityGate {
    pub fn new(
        store: Arc<dyn RentalStore>,
        intake: Arc<DocumentIntake>,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            store,
            intake,
            notifier,
        }
    }

    async fn reload(tx: &mut dyn RentalTx, profile_id: Uuid) -> AppResult<Profile> {
        tx.find_profile(profile_id).await?.ok_or_not_found("Profile")
    }

    async fn finalize_in(
        tx: &mut dyn RentalTx,
        profile_id: Uuid,
        submission: &Submission,
        flight_number: Option<&str>,
    ) -> AppResult<Finalized> {
        let profile = Self::reload(tx, profile_id).await?;
        if !profile.status.can_submit_for_review() {
            return Err(rejected(format!(
                "Profile is {}, documents cannot be submitted for review",
                profile.status
            )));
        }

        let missing = profile.documents.missing_for(submission.origin);
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|slot| slot.as_str()).collect();
            return Err(AppError::validation(format!(
                "Missing documents: {}",
                names.join(", ")
            )));
        }

        let mut vehicle = None;
        if let Some(booking_id) = submission.booking_id {
            let booking = tx
                .find_booking(booking_id)
                .await?
                .ok_or_not_found("Booking")?;
            if booking.profile_id != profile_id {
                return Err(AppError::forbidden("Booking belongs to another profile"));
            }

            if let Some(flight) = flight_number {
                if booking.status != BookingStatus::Pending {
                    return Err(rejected(format!(
                        "Booking is {}, the flight can only be changed while pending",
                        booking.status
                    )));
                }
                if !tx.set_flight_number(booking_id, flight).await? {
                    return Err(rejected("Booking is no longer pending".to_string()));
                }
            }

            if let Some(vehicle_id) = booking.requested_vehicle_id {
                vehicle = tx.find_vehicle(vehicle_id).await?.map(|v| v.descriptor());
            }
        }

        let moved = tx
            .transition_profile(
                profile_id,
                &[VerificationStatus::Registered, VerificationStatus::Rejected],
                VerificationStatus::Pending,
            )
            .await?;
        if !moved {
            return Err(rejected("Profile status changed during submission".to_string()));
        }

        Ok(Finalized {
            profile: Self::reload(tx, profile_id).await?,
            vehicle,
        })
    }

    async fn move_status(
        &self,
        profile_id: Uuid,
        from: &[VerificationStatus],
        to: VerificationStatus,
    ) -> AppResult<Profile> {
        let mut tx = self.store.begin().await?;
        let result = async {
            let profile = Self::reload(tx.as_mut(), profile_id).await?;
            if !from.contains(&profile.status) {
                return Err(rejected(format!(
                    "Profile is {}, cannot move to {}",
                    profile.status, to
                )));
            }
            if !tx.transition_profile(profile_id, from, to).await? {
                return Err(rejected(format!(
                    "Profile is no longer {}",
                    profile.status
                )));
            }
            Self::reload(tx.as_mut(), profile_id).await
        }
        .await;
        finish(tx, result).await
    }
}

#[async_trait]
impl VerificationService for IdentityGate {
    async fn submit_document(
        &self,
        actor: ActorContext,
        profile_id: Uuid,
        slot: DocumentSlot,
        image: Vec<u8>,
    ) -> AppResult<Profile> {
        actor.require_self_or_admin(profile_id)?;
        self.store
            .find_profile(profile_id)
            .await?
            .ok_or_not_found("Profile")?;

        // The seniority rule runs before upload so a refused license leaves
        // nothing behind.
        let now = Utc::now();
        let document = self.intake.analyze(slot, &image, now.date_naive()).await?;
        let url = self.intake.store(profile_id, slot, image, now).await?;

        let mut tx = self.store.begin().await?;
        let result = async {
            let profile = Self::reload(tx.as_mut(), profile_id).await?;
            let mut extracted = profile.extracted;
            extracted.absorb(slot, &document);

            if !tx.save_document(profile_id, slot, &url, &extracted).await? {
                return Err(AppError::not_found("Profile"));
            }
            Self::reload(tx.as_mut(), profile_id).await
        }
        .await;
        let profile = finish(tx, result).await?;

        tracing::info!(profile_id = %profile_id, slot = %slot, "Document stored");
        Ok(profile)
    }

    async fn finalize_submission(
        &self,
        actor: ActorContext,
        profile_id: Uuid,
        submission: Submission,
    ) -> AppResult<Profile> {
        actor.require_self_or_admin(profile_id)?;

        let flight_number = match submission.flight_number.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(normalize_flight_number(raw)?),
            _ if submission.origin.requires_flight_number() => {
                return Err(AppError::validation(
                    "A flight number is required for foreign clients",
                ))
            }
            _ => None,
        };

        let mut tx = self.store.begin().await?;
        let result =
            Self::finalize_in(tx.as_mut(), profile_id, &submission, flight_number.as_deref()).await;
        let Finalized { profile, vehicle } = finish(tx, result).await?;

        tracing::info!(
            profile_id = %profile_id,
            origin = ?submission.origin,
            booking_id = ?submission.booking_id,
            "Documents submitted for review"
        );

        let notice = Notice::SubmissionReceived {
            customer_name: profile.full_name.clone(),
            vehicle,
        };
        self.notifier.dispatch(&profile, notice);

        Ok(profile)
    }

    async fn review_decision(
        &self,
        actor: ActorContext,
        profile_id: Uuid,
        decision: ReviewDecision,
    ) -> AppResult<Profile> {
        actor.require_admin()?;

        let target = decision.target_status();
        let profile = self
            .move_status(profile_id, &[VerificationStatus::Pending], target)
            .await?;

        tracing::info!(
            profile_id = %profile_id,
            decision = ?decision,
            status = %target,
            "Verification reviewed"
        );
        Ok(profile)
    }

    async fn revoke_verification(
        &self,
        actor: ActorContext,
        profile_id: Uuid,
    ) -> AppResult<Profile> {
        actor.require_admin()?;

        let profile = self
            .move_status(
                profile_id,
                &[VerificationStatus::Verified, VerificationStatus::Rejected],
                VerificationStatus::Registered,
            )
            .await?;

        tracing::info!(profile_id = %profile_id, "Verification revoked");
        Ok(profile)
    }

    async fn can_initiate_booking(&self, actor: ActorContext, profile_id: Uuid) -> AppResult<bool> {
        actor.require_self_or_admin(profile_id)?;
        let profile = self
            .store
            .find_profile(profile_id)
            .await?
            .ok_or_not_found("Profile")?;
        Ok(profile.can_initiate_booking())
    }
}
