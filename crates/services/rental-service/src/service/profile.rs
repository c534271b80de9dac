//! Profile service - registration, contact details and removal.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use common::{AppError, AppResult, OptionExt};
use domain::{ActorContext, ContactUpdate, NewProfile, Profile, Role, VerificationStatus};

use super::rejected;
use crate::repository::{finish, RentalStore};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Profile operations for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ProfileService: Send + Sync {
    /// Create the caller's own profile in `registered`.
    async fn register(&self, actor: ActorContext, data: NewProfile) -> AppResult<Profile>;

    async fn get_profile(&self, actor: ActorContext, profile_id: Uuid) -> AppResult<Profile>;

    /// Edit contact details. Status and role are left alone.
    async fn update_contact(
        &self,
        actor: ActorContext,
        profile_id: Uuid,
        update: ContactUpdate,
    ) -> AppResult<Profile>;

    /// Admin: client profiles, newest first.
    async fn list_profiles(
        &self,
        actor: ActorContext,
        status: Option<VerificationStatus>,
    ) -> AppResult<Vec<Profile>>;

    /// Admin: remove a profile that has no pending or confirmed booking.
    async fn delete_profile(&self, actor: ActorContext, profile_id: Uuid) -> AppResult<()>;
}

pub struct ProfileManager {
    store: Arc<dyn RentalStore>,
}

impl ProfileManager {
    pub fn new(store: Arc<dyn RentalStore>) -> Self {
        Self { store }
    }
}

fn validate_new(data: &NewProfile) -> AppResult<()> {
    if data.full_name.trim().is_empty() {
        return Err(AppError::validation("Full name is required"));
    }
    if !data.email.contains('@') {
        return Err(AppError::validation("A valid email is required"));
    }
    Ok(())
}

#[async_trait]
impl ProfileService for ProfileManager {
    async fn register(&self, actor: ActorContext, data: NewProfile) -> AppResult<Profile> {
        validate_new(&data)?;

        let mut profile = Profile::register(actor.profile_id, data);
        // Admins are provisioned by the identity provider.
        if actor.role == Role::Admin {
            profile.role = Role::Admin;
        }

        let mut tx = self.store.begin().await?;
        let result = async {
            if tx.find_profile(profile.id).await?.is_some() {
                return Err(AppError::conflict("A profile already exists for this account"));
            }
            tx.insert_profile(&profile).await
        }
        .await;
        finish(tx, result).await?;

        tracing::info!(profile_id = %profile.id, role = %profile.role, "Profile registered");
        Ok(profile)
    }

    async fn get_profile(&self, actor: ActorContext, profile_id: Uuid) -> AppResult<Profile> {
        actor.require_self_or_admin(profile_id)?;
        self.store
            .find_profile(profile_id)
            .await?
            .ok_or_not_found("Profile")
    }

    async fn update_contact(
        &self,
        actor: ActorContext,
        profile_id: Uuid,
        update: ContactUpdate,
    ) -> AppResult<Profile> {
        actor.require_self_or_admin(profile_id)?;
        if update.full_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::validation("Full name cannot be empty"));
        }
        if update.email.as_deref().is_some_and(|e| !e.contains('@')) {
            return Err(AppError::validation("A valid email is required"));
        }

        let mut tx = self.store.begin().await?;
        let result = async {
            let mut profile = tx
                .find_profile(profile_id)
                .await?
                .ok_or_not_found("Profile")?;
            profile.apply_contact(update);
            if !tx.update_contact(&profile).await? {
                return Err(AppError::not_found("Profile"));
            }
            Ok(profile)
        }
        .await;
        finish(tx, result).await
    }

    async fn list_profiles(
        &self,
        actor: ActorContext,
        status: Option<VerificationStatus>,
    ) -> AppResult<Vec<Profile>> {
        actor.require_admin()?;
        self.store.list_profiles(status).await
    }

    async fn delete_profile(&self, actor: ActorContext, profile_id: Uuid) -> AppResult<()> {
        actor.require_admin()?;
        if actor.profile_id == profile_id {
            return Err(AppError::validation("Admins cannot delete their own profile"));
        }

        let mut tx = self.store.begin().await?;
        let result = async {
            tx.lock_profile(profile_id)
                .await?
                .ok_or_not_found("Profile")?;

            let live = tx.count_live_bookings(profile_id).await?;
            if live > 0 {
                return Err(rejected(format!(
                    "Profile still has {} pending or confirmed booking(s), finish or delete them first",
                    live
                )));
            }
            if !tx.delete_profile(profile_id).await? {
                return Err(AppError::not_found("Profile"));
            }
            Ok(())
        }
        .await;
        finish(tx, result).await?;

        tracing::info!(profile_id = %profile_id, "Profile deleted");
        Ok(())
    }
}
