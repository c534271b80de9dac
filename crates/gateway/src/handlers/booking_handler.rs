//! Booking handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use common::AppResult;
use domain::{ActorContext, BookingRequest, BookingResponse, BookingView};

use crate::extractors::ValidatedJson;
use crate::state::AppState;

/// Rental request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookingRequest {
    /// Client the booking is for (admin only); defaults to the caller
    pub profile_id: Option<Uuid>,
    /// Location name or code, e.g. `AHU`
    #[validate(length(min = 1, max = 120, message = "Pickup location is required"))]
    #[schema(example = "AHU")]
    pub pickup_location: String,
    #[validate(length(min = 1, max = 120, message = "Return location is required"))]
    #[schema(example = "Tanger centre")]
    pub return_location: String,
    pub pickup_at: DateTime<Utc>,
    pub return_at: DateTime<Utc>,
    /// Total price in MAD
    #[validate(range(min = 0, message = "Price cannot be negative"))]
    #[schema(example = 900)]
    pub total_price: i64,
    /// Vehicle the client picked from the catalogue
    pub requested_vehicle_id: Option<Uuid>,
}

impl From<CreateBookingRequest> for BookingRequest {
    fn from(req: CreateBookingRequest) -> Self {
        Self {
            pickup_location: req.pickup_location,
            return_location: req.return_location,
            pickup_at: req.pickup_at,
            return_at: req.return_at,
            total_price: req.total_price,
            requested_vehicle_id: req.requested_vehicle_id,
        }
    }
}

/// Vehicle assignment
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ConfirmBookingRequest {
    pub vehicle_id: Uuid,
}

/// Vehicle return
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct ReturnBookingRequest {
    /// Appended to the client's rental history
    #[validate(length(max = 2000, message = "Note is too long"))]
    pub note: Option<String>,
}

/// Flight reference for airport pickups
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct FlightNumberRequest {
    #[validate(length(min = 1, max = 16, message = "Flight number is required"))]
    #[schema(example = "AT 800")]
    pub flight_number: String,
}

/// Booking listing filter
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookingFilter {
    /// `active` (default) or `archived`
    #[serde(default)]
    pub view: BookingView,
}

/// Create booking routes
pub fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bookings).post(create_booking))
        .route("/:id", get(get_booking).delete(delete_booking))
        .route("/:id/confirm", post(confirm_booking))
        .route("/:id/return", post(return_booking))
        .route("/:id/archive", post(archive_booking))
        .route("/:id/flight", put(set_flight_number))
}

/// Request a rental
#[utoipa::path(
    post,
    path = "/bookings",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking pending", body = BookingResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Profile is not verified")
    )
)]
pub async fn create_booking(
    Extension(actor): Extension<ActorContext>,
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<BookingResponse>)> {
    let profile_id = req.profile_id.unwrap_or(actor.profile_id);
    let booking = state
        .services
        .bookings()
        .create_booking(actor, profile_id, req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(booking.into())))
}

/// List bookings, newest first
#[utoipa::path(
    get,
    path = "/bookings",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(BookingFilter),
    responses((status = 200, description = "Bookings visible to the caller", body = Vec<BookingResponse>))
)]
pub async fn list_bookings(
    Extension(actor): Extension<ActorContext>,
    State(state): State<AppState>,
    Query(filter): Query<BookingFilter>,
) -> AppResult<Json<Vec<BookingResponse>>> {
    let bookings = state
        .services
        .bookings()
        .list_bookings(actor, filter.view)
        .await?;
    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

/// Get a booking (owner or admin)
#[utoipa::path(
    get,
    path = "/bookings/{id}",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking", body = BookingResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn get_booking(
    Extension(actor): Extension<ActorContext>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookingResponse>> {
    let booking = state.services.bookings().get_booking(actor, id).await?;
    Ok(Json(booking.into()))
}

/// Assign a vehicle and confirm (admin only)
#[utoipa::path(
    post,
    path = "/bookings/{id}/confirm",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = ConfirmBookingRequest,
    responses(
        (status = 200, description = "Booking confirmed, vehicle rented", body = BookingResponse),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 409, description = "Booking not pending or vehicle unavailable")
    )
)]
pub async fn confirm_booking(
    Extension(actor): Extension<ActorContext>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<ConfirmBookingRequest>,
) -> AppResult<Json<BookingResponse>> {
    let booking = state
        .services
        .bookings()
        .assign_and_confirm(actor, id, req.vehicle_id)
        .await?;
    Ok(Json(booking.into()))
}

/// Record the vehicle's return (admin only)
#[utoipa::path(
    post,
    path = "/bookings/{id}/return",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = ReturnBookingRequest,
    responses(
        (status = 200, description = "Booking completed, vehicle available", body = BookingResponse),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 409, description = "Booking is not confirmed")
    )
)]
pub async fn return_booking(
    Extension(actor): Extension<ActorContext>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<ReturnBookingRequest>,
) -> AppResult<Json<BookingResponse>> {
    let booking = state
        .services
        .bookings()
        .complete_return(actor, id, req.note)
        .await?;
    Ok(Json(booking.into()))
}

/// Archive a completed booking (admin only)
#[utoipa::path(
    post,
    path = "/bookings/{id}/archive",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking archived", body = BookingResponse),
        (status = 409, description = "Booking is not completed")
    )
)]
pub async fn archive_booking(
    Extension(actor): Extension<ActorContext>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookingResponse>> {
    let booking = state.services.bookings().archive_booking(actor, id).await?;
    Ok(Json(booking.into()))
}

/// Attach a flight number to a pending booking (owner)
#[utoipa::path(
    put,
    path = "/bookings/{id}/flight",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = FlightNumberRequest,
    responses(
        (status = 200, description = "Flight number stored", body = BookingResponse),
        (status = 400, description = "Malformed flight number"),
        (status = 409, description = "Booking is not pending")
    )
)]
pub async fn set_flight_number(
    Extension(actor): Extension<ActorContext>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<FlightNumberRequest>,
) -> AppResult<Json<BookingResponse>> {
    let booking = state
        .services
        .bookings()
        .set_flight_number(actor, id, req.flight_number)
        .await?;
    Ok(Json(booking.into()))
}

/// Delete a booking, releasing its vehicle (admin only)
#[utoipa::path(
    delete,
    path = "/bookings/{id}",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 204, description = "Booking deleted"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn delete_booking(
    Extension(actor): Extension<ActorContext>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.bookings().delete_booking(actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
