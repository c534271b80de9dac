//! PostgreSQL rental store backed by SeaORM.
//!
//! Status-gated writes are single `UPDATE ... WHERE status = expected`
//! statements; `rows_affected` tells whether the swap happened. Under
//! READ COMMITTED a concurrent writer blocks on the row lock and then
//! re-evaluates the predicate, so exactly one of two racing swaps wins.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    AccessMode, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, IsolationLevel, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use super::entities::{booking, profile, rental_note, vehicle};
use super::store::{RentalStore, RentalTx};
use common::{AppError, AppResult};
use domain::{
    Booking, BookingStatus, DocumentSlot, ExtractedFields, Profile, RentalNote, Vehicle,
    VehicleSpec, VehicleStatus, VerificationStatus, ROLE_ADMIN,
};

/// Map a unique violation to a conflict, anything else to a database error.
fn unique_as_conflict(err: DbErr, message: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::conflict(message),
        _ => AppError::from(err),
    }
}

fn document_column(slot: DocumentSlot) -> profile::Column {
    match slot {
        DocumentSlot::IdFront => profile::Column::IdFrontUrl,
        DocumentSlot::IdBack => profile::Column::IdBackUrl,
        DocumentSlot::Passport => profile::Column::PassportUrl,
        DocumentSlot::LicenseFront => profile::Column::LicenseFrontUrl,
        DocumentSlot::LicenseBack => profile::Column::LicenseBackUrl,
    }
}

// =============================================================================
// Shared queries (connection or transaction)
// =============================================================================

async fn load_notes<C: ConnectionTrait>(
    conn: &C,
    profile_ids: Vec<Uuid>,
) -> AppResult<HashMap<Uuid, Vec<RentalNote>>> {
    let mut grouped: HashMap<Uuid, Vec<RentalNote>> = HashMap::new();
    if profile_ids.is_empty() {
        return Ok(grouped);
    }

    let notes = rental_note::Entity::find()
        .filter(rental_note::Column::ProfileId.is_in(profile_ids))
        .order_by_asc(rental_note::Column::Id)
        .all(conn)
        .await?;

    for note in notes {
        grouped
            .entry(note.profile_id)
            .or_default()
            .push(RentalNote::from(note));
    }
    Ok(grouped)
}

async fn load_profile<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<Option<Profile>> {
    let Some(model) = profile::Entity::find_by_id(id).one(conn).await? else {
        return Ok(None);
    };
    let mut notes = load_notes(conn, vec![id]).await?;
    let history = notes.remove(&id).unwrap_or_default();
    model.into_profile(history).map(Some)
}

async fn lock_profile_row(txn: &DatabaseTransaction, id: Uuid) -> AppResult<Option<Profile>> {
    // FOR UPDATE conflicts with the KEY SHARE taken by booking inserts
    let locked = profile::Entity::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await?;
    if locked.is_none() {
        return Ok(None);
    }
    load_profile(txn, id).await
}

async fn load_vehicle<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<Option<Vehicle>> {
    vehicle::Entity::find_by_id(id)
        .one(conn)
        .await?
        .map(Vehicle::try_from)
        .transpose()
}

async fn load_booking<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<Option<Booking>> {
    booking::Entity::find_by_id(id)
        .one(conn)
        .await?
        .map(Booking::try_from)
        .transpose()
}

// =============================================================================
// Store
// =============================================================================

/// Rental store over a SeaORM connection pool.
pub struct PgRentalStore {
    db: DatabaseConnection,
}

impl PgRentalStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RentalStore for PgRentalStore {
    async fn find_profile(&self, id: Uuid) -> AppResult<Option<Profile>> {
        load_profile(&self.db, id).await
    }

    async fn list_profiles(&self, status: Option<VerificationStatus>) -> AppResult<Vec<Profile>> {
        let mut query = profile::Entity::find().filter(profile::Column::Role.ne(ROLE_ADMIN));
        if let Some(status) = status {
            query = query.filter(profile::Column::Status.eq(status.as_str()));
        }
        let models = query
            .order_by_desc(profile::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let ids = models.iter().map(|m| m.id).collect();
        let mut notes = load_notes(&self.db, ids).await?;

        models
            .into_iter()
            .map(|m| {
                let history = notes.remove(&m.id).unwrap_or_default();
                m.into_profile(history)
            })
            .collect()
    }

    async fn find_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        load_vehicle(&self.db, id).await
    }

    async fn list_vehicles(&self, status: Option<VehicleStatus>) -> AppResult<Vec<Vehicle>> {
        let mut query = vehicle::Entity::find();
        if let Some(status) = status {
            query = query.filter(vehicle::Column::Status.eq(status.as_str()));
        }
        query
            .order_by_desc(vehicle::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Vehicle::try_from)
            .collect()
    }

    async fn find_booking(&self, id: Uuid) -> AppResult<Option<Booking>> {
        load_booking(&self.db, id).await
    }

    async fn list_bookings(&self, owner: Option<Uuid>) -> AppResult<Vec<Booking>> {
        let mut query = booking::Entity::find();
        if let Some(owner) = owner {
            query = query.filter(booking::Column::ProfileId.eq(owner));
        }
        query
            .order_by_desc(booking::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Booking::try_from)
            .collect()
    }

    async fn ping(&self) -> AppResult<()> {
        self.db.ping().await.map_err(AppError::from)
    }

    async fn begin(&self) -> AppResult<Box<dyn RentalTx>> {
        let txn = self
            .db
            .begin_with_config(
                Some(IsolationLevel::ReadCommitted),
                Some(AccessMode::ReadWrite),
            )
            .await?;
        Ok(Box::new(PgRentalTx { txn }))
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// Transaction over the rental tables.
pub struct PgRentalTx {
    txn: DatabaseTransaction,
}

#[async_trait]
impl RentalTx for PgRentalTx {
    async fn find_profile(&mut self, id: Uuid) -> AppResult<Option<Profile>> {
        load_profile(&self.txn, id).await
    }

    async fn lock_profile(&mut self, id: Uuid) -> AppResult<Option<Profile>> {
        lock_profile_row(&self.txn, id).await
    }

    async fn insert_profile(&mut self, p: &Profile) -> AppResult<()> {
        let active = profile::ActiveModel {
            id: Set(p.id),
            full_name: Set(p.full_name.clone()),
            phone: Set(p.phone.clone()),
            email: Set(p.email.clone()),
            country: Set(p.country.clone()),
            locale: Set(p.locale.clone()),
            status: Set(p.status.as_str().to_string()),
            role: Set(p.role.as_str().to_string()),
            id_front_url: Set(p.documents.id_front_url.clone()),
            id_back_url: Set(p.documents.id_back_url.clone()),
            passport_url: Set(p.documents.passport_url.clone()),
            license_front_url: Set(p.documents.license_front_url.clone()),
            license_back_url: Set(p.documents.license_back_url.clone()),
            extracted_full_name: Set(p.extracted.full_name.clone()),
            extracted_document_number: Set(p.extracted.document_number.clone()),
            extracted_license_number: Set(p.extracted.license_number.clone()),
            extracted_birth_date: Set(p.extracted.birth_date),
            extracted_address: Set(p.extracted.address.clone()),
            extracted_license_issue_date: Set(p.extracted.license_issue_date),
            created_at: Set(p.created_at),
            updated_at: Set(p.updated_at),
        };

        active
            .insert(&self.txn)
            .await
            .map_err(|e| unique_as_conflict(e, "Profile already exists"))?;
        Ok(())
    }

    async fn update_contact(&mut self, p: &Profile) -> AppResult<bool> {
        let result = profile::Entity::update_many()
            .col_expr(profile::Column::FullName, Expr::value(p.full_name.clone()))
            .col_expr(profile::Column::Phone, Expr::value(p.phone.clone()))
            .col_expr(profile::Column::Email, Expr::value(p.email.clone()))
            .col_expr(profile::Column::Country, Expr::value(p.country.clone()))
            .col_expr(profile::Column::Locale, Expr::value(p.locale.clone()))
            .col_expr(profile::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(profile::Column::Id.eq(p.id))
            .exec(&self.txn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn save_document(
        &mut self,
        profile_id: Uuid,
        slot: DocumentSlot,
        url: &str,
        extracted: &ExtractedFields,
    ) -> AppResult<bool> {
        let result = profile::Entity::update_many()
            .col_expr(document_column(slot), Expr::value(url.to_string()))
            .col_expr(
                profile::Column::ExtractedFullName,
                Expr::value(extracted.full_name.clone()),
            )
            .col_expr(
                profile::Column::ExtractedDocumentNumber,
                Expr::value(extracted.document_number.clone()),
            )
            .col_expr(
                profile::Column::ExtractedLicenseNumber,
                Expr::value(extracted.license_number.clone()),
            )
            .col_expr(
                profile::Column::ExtractedBirthDate,
                Expr::value(extracted.birth_date),
            )
            .col_expr(
                profile::Column::ExtractedAddress,
                Expr::value(extracted.address.clone()),
            )
            .col_expr(
                profile::Column::ExtractedLicenseIssueDate,
                Expr::value(extracted.license_issue_date),
            )
            .col_expr(profile::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(profile::Column::Id.eq(profile_id))
            .exec(&self.txn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn transition_profile(
        &mut self,
        id: Uuid,
        from: &[VerificationStatus],
        to: VerificationStatus,
    ) -> AppResult<bool> {
        let expected: Vec<&str> = from.iter().map(|s| s.as_str()).collect();
        let result = profile::Entity::update_many()
            .col_expr(profile::Column::Status, Expr::value(to.as_str()))
            .col_expr(profile::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(profile::Column::Id.eq(id))
            .filter(profile::Column::Status.is_in(expected))
            .exec(&self.txn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn append_note(&mut self, profile_id: Uuid, note: &RentalNote) -> AppResult<()> {
        let active = rental_note::ActiveModel {
            profile_id: Set(profile_id),
            author_id: Set(note.author_id),
            note: Set(note.note.clone()),
            recorded_at: Set(note.recorded_at),
            ..Default::default()
        };
        active.insert(&self.txn).await?;
        Ok(())
    }

    async fn count_live_bookings(&mut self, profile_id: Uuid) -> AppResult<u64> {
        let live = [BookingStatus::Pending.as_str(), BookingStatus::Confirmed.as_str()];
        let count = booking::Entity::find()
            .filter(booking::Column::ProfileId.eq(profile_id))
            .filter(booking::Column::Status.is_in(live))
            .count(&self.txn)
            .await?;
        Ok(count)
    }

    async fn delete_profile(&mut self, id: Uuid) -> AppResult<bool> {
        // Notes and bookings cascade; vehicle assignments are nulled.
        let result = profile::Entity::delete_by_id(id).exec(&self.txn).await?;
        Ok(result.rows_affected > 0)
    }

    async fn find_vehicle(&mut self, id: Uuid) -> AppResult<Option<Vehicle>> {
        load_vehicle(&self.txn, id).await
    }

    async fn insert_vehicle(&mut self, v: &Vehicle) -> AppResult<()> {
        let active = vehicle::ActiveModel {
            id: Set(v.id),
            make: Set(v.make.clone()),
            model: Set(v.model.clone()),
            plate: Set(v.plate.clone()),
            status: Set(v.status.as_str().to_string()),
            category: Set(v.category.as_str().to_string()),
            rate_low: Set(v.rate_low),
            rate_high: Set(v.rate_high),
            seats: Set(v.seats),
            doors: Set(v.doors),
            air_conditioning: Set(v.air_conditioning),
            transmission: Set(v.transmission.as_str().to_string()),
            mileage_policy: Set(v.mileage_policy.clone()),
            image_url: Set(v.image_url.clone()),
            gallery: Set(serde_json::Value::from(v.gallery.clone())),
            assigned_profile_id: Set(v.assigned_profile_id),
            created_at: Set(v.created_at),
            updated_at: Set(v.updated_at),
        };

        active.insert(&self.txn).await.map_err(|e| {
            unique_as_conflict(
                e,
                &format!("A vehicle with plate {} already exists", v.plate),
            )
        })?;
        Ok(())
    }

    async fn update_vehicle_spec(&mut self, id: Uuid, spec: &VehicleSpec) -> AppResult<bool> {
        let result = vehicle::Entity::update_many()
            .col_expr(vehicle::Column::Make, Expr::value(spec.make.clone()))
            .col_expr(vehicle::Column::Model, Expr::value(spec.model.clone()))
            .col_expr(vehicle::Column::Plate, Expr::value(spec.plate.clone()))
            .col_expr(
                vehicle::Column::Category,
                Expr::value(spec.category.as_str().to_string()),
            )
            .col_expr(vehicle::Column::RateLow, Expr::value(spec.rate_low))
            .col_expr(vehicle::Column::RateHigh, Expr::value(spec.rate_high))
            .col_expr(vehicle::Column::Seats, Expr::value(spec.seats))
            .col_expr(vehicle::Column::Doors, Expr::value(spec.doors))
            .col_expr(
                vehicle::Column::AirConditioning,
                Expr::value(spec.air_conditioning),
            )
            .col_expr(
                vehicle::Column::Transmission,
                Expr::value(spec.transmission.as_str()),
            )
            .col_expr(
                vehicle::Column::MileagePolicy,
                Expr::value(spec.mileage_policy.clone()),
            )
            .col_expr(vehicle::Column::ImageUrl, Expr::value(spec.image_url.clone()))
            .col_expr(
                vehicle::Column::Gallery,
                Expr::value(serde_json::Value::from(spec.gallery.clone())),
            )
            .col_expr(vehicle::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(vehicle::Column::Id.eq(id))
            .exec(&self.txn)
            .await
            .map_err(|e| {
                unique_as_conflict(
                    e,
                    &format!("A vehicle with plate {} already exists", spec.plate),
                )
            })?;
        Ok(result.rows_affected > 0)
    }

    async fn set_vehicle_status(
        &mut self,
        id: Uuid,
        from: VehicleStatus,
        to: VehicleStatus,
    ) -> AppResult<bool> {
        let result = vehicle::Entity::update_many()
            .col_expr(vehicle::Column::Status, Expr::value(to.as_str()))
            .col_expr(vehicle::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(vehicle::Column::Id.eq(id))
            .filter(vehicle::Column::Status.eq(from.as_str()))
            .filter(vehicle::Column::AssignedProfileId.is_null())
            .exec(&self.txn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn occupy_vehicle(&mut self, id: Uuid, profile_id: Uuid) -> AppResult<bool> {
        let result = vehicle::Entity::update_many()
            .col_expr(
                vehicle::Column::Status,
                Expr::value(VehicleStatus::Rented.as_str()),
            )
            .col_expr(vehicle::Column::AssignedProfileId, Expr::value(profile_id))
            .col_expr(vehicle::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(vehicle::Column::Id.eq(id))
            .filter(vehicle::Column::Status.eq(VehicleStatus::Available.as_str()))
            .exec(&self.txn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn release_vehicle(&mut self, id: Uuid) -> AppResult<bool> {
        let result = vehicle::Entity::update_many()
            .col_expr(
                vehicle::Column::Status,
                Expr::value(VehicleStatus::Available.as_str()),
            )
            .col_expr(
                vehicle::Column::AssignedProfileId,
                Expr::value(Option::<Uuid>::None),
            )
            .col_expr(vehicle::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(vehicle::Column::Id.eq(id))
            .filter(vehicle::Column::Status.eq(VehicleStatus::Rented.as_str()))
            .exec(&self.txn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn delete_vehicle(&mut self, id: Uuid) -> AppResult<bool> {
        let result = vehicle::Entity::delete_many()
            .filter(vehicle::Column::Id.eq(id))
            .filter(vehicle::Column::Status.ne(VehicleStatus::Rented.as_str()))
            .exec(&self.txn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn find_booking(&mut self, id: Uuid) -> AppResult<Option<Booking>> {
        load_booking(&self.txn, id).await
    }

    async fn insert_booking(&mut self, b: &Booking) -> AppResult<()> {
        let active = booking::ActiveModel {
            id: Set(b.id),
            profile_id: Set(b.profile_id),
            vehicle_id: Set(b.vehicle_id),
            returned_vehicle_id: Set(b.returned_vehicle_id),
            requested_vehicle_id: Set(b.requested_vehicle_id),
            pickup_location: Set(b.pickup_location.clone()),
            return_location: Set(b.return_location.clone()),
            pickup_at: Set(b.pickup_at),
            return_at: Set(b.return_at),
            total_price: Set(b.total_price),
            flight_number: Set(b.flight_number.clone()),
            status: Set(b.status.as_str().to_string()),
            archived: Set(b.archived),
            created_at: Set(b.created_at),
            updated_at: Set(b.updated_at),
        };
        active.insert(&self.txn).await?;
        Ok(())
    }

    async fn confirm_booking(&mut self, id: Uuid, vehicle_id: Uuid) -> AppResult<bool> {
        let result = booking::Entity::update_many()
            .col_expr(
                booking::Column::Status,
                Expr::value(BookingStatus::Confirmed.as_str()),
            )
            .col_expr(booking::Column::VehicleId, Expr::value(vehicle_id))
            .col_expr(booking::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(booking::Column::Id.eq(id))
            .filter(booking::Column::Status.eq(BookingStatus::Pending.as_str()))
            .exec(&self.txn)
            .await;

        match result {
            Ok(r) => Ok(r.rows_affected > 0),
            // Another confirmed booking already holds the vehicle.
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(false)
            }
            Err(e) => Err(AppError::from(e)),
        }
    }

    async fn complete_booking(&mut self, id: Uuid) -> AppResult<bool> {
        // Right-hand sides see the pre-update row.
        let result = booking::Entity::update_many()
            .col_expr(
                booking::Column::Status,
                Expr::value(BookingStatus::Completed.as_str()),
            )
            .col_expr(
                booking::Column::ReturnedVehicleId,
                Expr::col(booking::Column::VehicleId).into(),
            )
            .col_expr(booking::Column::VehicleId, Expr::value(Option::<Uuid>::None))
            .col_expr(booking::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(booking::Column::Id.eq(id))
            .filter(booking::Column::Status.eq(BookingStatus::Confirmed.as_str()))
            .exec(&self.txn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn set_flight_number(&mut self, id: Uuid, flight_number: &str) -> AppResult<bool> {
        let result = booking::Entity::update_many()
            .col_expr(
                booking::Column::FlightNumber,
                Expr::value(flight_number.to_string()),
            )
            .col_expr(booking::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(booking::Column::Id.eq(id))
            .filter(booking::Column::Status.eq(BookingStatus::Pending.as_str()))
            .exec(&self.txn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn archive_booking(&mut self, id: Uuid) -> AppResult<bool> {
        let result = booking::Entity::update_many()
            .col_expr(booking::Column::Archived, Expr::value(true))
            .col_expr(booking::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(booking::Column::Id.eq(id))
            .filter(booking::Column::Status.eq(BookingStatus::Completed.as_str()))
            .exec(&self.txn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn delete_booking(&mut self, id: Uuid, expected: BookingStatus) -> AppResult<bool> {
        let result = booking::Entity::delete_many()
            .filter(booking::Column::Id.eq(id))
            .filter(booking::Column::Status.eq(expected.as_str()))
            .exec(&self.txn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.txn.commit().await.map_err(AppError::from)
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.txn.rollback().await.map_err(AppError::from)
    }
}
