//! Fleet handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use common::AppResult;
use domain::{
    ActorContext, DomainError, Quote, Transmission, Vehicle, VehicleCategory, VehicleSpec,
    VehicleStatus,
};
use rental_service_lib::service::decode_image;

use crate::extractors::ValidatedJson;
use crate::state::AppState;

/// Vehicle create or replace request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VehicleRequest {
    #[validate(length(min = 1, message = "Make is required"))]
    #[schema(example = "Dacia")]
    pub make: String,
    #[validate(length(min = 1, message = "Model is required"))]
    #[schema(example = "Duster")]
    pub model: String,
    #[validate(length(min = 1, max = 20, message = "License plate is required"))]
    #[schema(example = "12345-A-6")]
    pub plate: String,
    /// MINI, ECONOMIQUE, COMPACTE, SUV or PREMIUM
    #[schema(example = "SUV")]
    pub category: String,
    /// Low-season day rate in MAD
    #[validate(range(min = 0, message = "Day rates cannot be negative"))]
    pub rate_low: i64,
    /// High-season day rate in MAD
    #[validate(range(min = 0, message = "Day rates cannot be negative"))]
    pub rate_high: i64,
    #[validate(range(min = 1, max = 9, message = "Seats must be between 1 and 9"))]
    pub seats: i32,
    #[validate(range(min = 1, max = 5, message = "Doors must be between 1 and 5"))]
    pub doors: i32,
    pub air_conditioning: bool,
    pub transmission: Transmission,
    #[schema(example = "unlimited")]
    pub mileage_policy: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub gallery: Vec<String>,
}

impl TryFrom<VehicleRequest> for VehicleSpec {
    type Error = DomainError;

    fn try_from(req: VehicleRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            category: VehicleCategory::try_from(req.category)?,
            make: req.make,
            model: req.model,
            plate: req.plate,
            rate_low: req.rate_low,
            rate_high: req.rate_high,
            seats: req.seats,
            doors: req.doors,
            air_conditioning: req.air_conditioning,
            transmission: req.transmission,
            mileage_policy: req.mileage_policy,
            image_url: req.image_url,
            gallery: req.gallery,
        })
    }
}

/// Manual status change; `rented` is reserved to bookings
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VehicleStatusRequest {
    pub status: VehicleStatus,
}

/// Vehicle image upload
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VehicleImageRequest {
    #[validate(length(min = 1, max = 200, message = "File name is required"))]
    #[schema(example = "duster-front.jpg")]
    pub file_name: String,
    #[validate(length(min = 1, message = "Content type is required"))]
    #[schema(example = "image/jpeg")]
    pub content_type: String,
    /// Base64, with or without a `data:` prefix
    #[validate(length(min = 1, message = "Image is required"))]
    pub image: String,
}

/// Stored image location
#[derive(Debug, Serialize, ToSchema)]
pub struct ImageUrlResponse {
    pub url: String,
}

/// Vehicle listing filter
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VehicleFilter {
    pub status: Option<VehicleStatus>,
}

/// Rental period to quote
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QuotePeriod {
    /// Pickup instant (RFC 3339)
    pub from: DateTime<Utc>,
    /// Return instant (RFC 3339)
    pub to: DateTime<Utc>,
}

/// Create vehicle routes
pub fn vehicle_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles).post(create_vehicle))
        .route("/available", get(list_available))
        .route("/images", post(upload_image))
        .route(
            "/:id",
            get(get_vehicle).put(update_vehicle).delete(delete_vehicle),
        )
        .route("/:id/status", put(set_status))
        .route("/:id/quote", get(quote))
}

/// List vehicles
#[utoipa::path(
    get,
    path = "/vehicles",
    tag = "Vehicles",
    security(("bearer_auth" = [])),
    params(VehicleFilter),
    responses((status = 200, description = "Vehicles", body = Vec<Vehicle>))
)]
pub async fn list_vehicles(
    State(state): State<AppState>,
    Query(filter): Query<VehicleFilter>,
) -> AppResult<Json<Vec<Vehicle>>> {
    let vehicles = state.services.fleet().list_vehicles(filter.status).await?;
    Ok(Json(vehicles))
}

/// Available vehicles, cheapest first
#[utoipa::path(
    get,
    path = "/vehicles/available",
    tag = "Vehicles",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Available vehicles", body = Vec<Vehicle>))
)]
pub async fn list_available(State(state): State<AppState>) -> AppResult<Json<Vec<Vehicle>>> {
    let vehicles = state.services.fleet().list_available().await?;
    Ok(Json(vehicles))
}

/// Get a vehicle
#[utoipa::path(
    get,
    path = "/vehicles/{id}",
    tag = "Vehicles",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Vehicle ID")),
    responses(
        (status = 200, description = "Vehicle", body = Vehicle),
        (status = 404, description = "Vehicle not found")
    )
)]
pub async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vehicle>> {
    Ok(Json(state.services.fleet().get_vehicle(id).await?))
}

/// Add a vehicle (admin only)
#[utoipa::path(
    post,
    path = "/vehicles",
    tag = "Vehicles",
    security(("bearer_auth" = [])),
    request_body = VehicleRequest,
    responses(
        (status = 201, description = "Vehicle created", body = Vehicle),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 409, description = "Plate already registered")
    )
)]
pub async fn create_vehicle(
    Extension(actor): Extension<ActorContext>,
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<VehicleRequest>,
) -> AppResult<(StatusCode, Json<Vehicle>)> {
    let spec = VehicleSpec::try_from(req)?;
    let vehicle = state.services.fleet().create_vehicle(actor, spec).await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

/// Replace a vehicle's attributes (admin only)
#[utoipa::path(
    put,
    path = "/vehicles/{id}",
    tag = "Vehicles",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Vehicle ID")),
    request_body = VehicleRequest,
    responses(
        (status = 200, description = "Vehicle updated", body = Vehicle),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Vehicle not found")
    )
)]
pub async fn update_vehicle(
    Extension(actor): Extension<ActorContext>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<VehicleRequest>,
) -> AppResult<Json<Vehicle>> {
    let spec = VehicleSpec::try_from(req)?;
    let vehicle = state.services.fleet().update_vehicle(actor, id, spec).await?;
    Ok(Json(vehicle))
}

/// Park or release a vehicle (admin only)
#[utoipa::path(
    put,
    path = "/vehicles/{id}/status",
    tag = "Vehicles",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Vehicle ID")),
    request_body = VehicleStatusRequest,
    responses(
        (status = 200, description = "Status set", body = Vehicle),
        (status = 400, description = "Rented is set by bookings only"),
        (status = 409, description = "Vehicle is rented")
    )
)]
pub async fn set_status(
    Extension(actor): Extension<ActorContext>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<VehicleStatusRequest>,
) -> AppResult<Json<Vehicle>> {
    let vehicle = state
        .services
        .fleet()
        .set_vehicle_status(actor, id, req.status)
        .await?;
    Ok(Json(vehicle))
}

/// Remove a vehicle (admin only)
#[utoipa::path(
    delete,
    path = "/vehicles/{id}",
    tag = "Vehicles",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Vehicle ID")),
    responses(
        (status = 204, description = "Vehicle deleted"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 409, description = "Vehicle is rented")
    )
)]
pub async fn delete_vehicle(
    Extension(actor): Extension<ActorContext>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.fleet().delete_vehicle(actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Price a rental period
#[utoipa::path(
    get,
    path = "/vehicles/{id}/quote",
    tag = "Vehicles",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Vehicle ID"), QuotePeriod),
    responses(
        (status = 200, description = "Seasonal quote", body = Quote),
        (status = 400, description = "Pickup after return"),
        (status = 404, description = "Vehicle not found")
    )
)]
pub async fn quote(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(period): Query<QuotePeriod>,
) -> AppResult<Json<Quote>> {
    let quote = state
        .services
        .fleet()
        .quote(id, period.from, period.to)
        .await?;
    Ok(Json(quote))
}

/// Upload a catalogue image (admin only)
#[utoipa::path(
    post,
    path = "/vehicles/images",
    tag = "Vehicles",
    security(("bearer_auth" = [])),
    request_body = VehicleImageRequest,
    responses(
        (status = 201, description = "Image stored", body = ImageUrlResponse),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 502, description = "Storage unavailable")
    )
)]
pub async fn upload_image(
    Extension(actor): Extension<ActorContext>,
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<VehicleImageRequest>,
) -> AppResult<(StatusCode, Json<ImageUrlResponse>)> {
    let bytes = decode_image(&req.image)?;
    let url = state
        .services
        .fleet()
        .upload_vehicle_image(actor, req.file_name, bytes, req.content_type)
        .await?;
    Ok((StatusCode::CREATED, Json(ImageUrlResponse { url })))
}
