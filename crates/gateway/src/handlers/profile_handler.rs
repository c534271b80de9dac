//! Profile handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use common::AppResult;
use domain::{
    ActorContext, ContactUpdate, NewProfile, ProfileResponse, ReviewDecision, VerificationStatus,
};

use crate::extractors::ValidatedJson;
use crate::state::AppState;

/// Profile registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterProfileRequest {
    #[validate(length(min = 1, max = 120, message = "Full name is required"))]
    #[schema(example = "Yasmine Benali")]
    pub full_name: String,
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "yasmine@example.com")]
    pub email: String,
    #[validate(length(max = 32, message = "Phone number is too long"))]
    #[schema(example = "+212600000000")]
    pub phone: Option<String>,
    #[validate(length(min = 2, max = 2, message = "Country must be an ISO 3166 alpha-2 code"))]
    #[schema(example = "MA")]
    pub country: Option<String>,
    /// Preferred language; unsupported values fall back to French
    #[schema(example = "fr")]
    pub locale: Option<String>,
}

impl From<RegisterProfileRequest> for NewProfile {
    fn from(req: RegisterProfileRequest) -> Self {
        Self {
            full_name: req.full_name,
            email: req.email,
            phone: req.phone,
            country: req.country,
            locale: req.locale,
        }
    }
}

/// Contact details update. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateContactRequest {
    #[validate(length(min = 1, max = 120, message = "Name cannot be empty"))]
    pub full_name: Option<String>,
    #[validate(length(max = 32, message = "Phone number is too long"))]
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 2, max = 2, message = "Country must be an ISO 3166 alpha-2 code"))]
    pub country: Option<String>,
    pub locale: Option<String>,
}

impl From<UpdateContactRequest> for ContactUpdate {
    fn from(req: UpdateContactRequest) -> Self {
        Self {
            full_name: req.full_name,
            phone: req.phone,
            email: req.email,
            country: req.country,
            locale: req.locale,
        }
    }
}

/// Admin review of a pending submission
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReviewRequest {
    pub decision: ReviewDecision,
}

/// Profile listing filter
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProfileFilter {
    /// Only profiles in this verification status
    pub status: Option<VerificationStatus>,
}

/// Create profile routes
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_profiles).post(register_profile))
        .route("/me", get(get_own_profile).put(update_own_profile))
        .route(
            "/:id",
            get(get_profile).put(update_profile).delete(delete_profile),
        )
        .route("/:id/review", post(review_profile))
        .route("/:id/revoke", post(revoke_profile))
}

/// Register the caller's profile
#[utoipa::path(
    post,
    path = "/profiles",
    tag = "Profiles",
    security(("bearer_auth" = [])),
    request_body = RegisterProfileRequest,
    responses(
        (status = 201, description = "Profile registered", body = ProfileResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Profile already exists")
    )
)]
pub async fn register_profile(
    Extension(actor): Extension<ActorContext>,
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterProfileRequest>,
) -> AppResult<(StatusCode, Json<ProfileResponse>)> {
    let profile = state.services.profiles().register(actor, req.into()).await?;
    Ok((StatusCode::CREATED, Json(profile.into())))
}

/// Get the caller's profile
#[utoipa::path(
    get,
    path = "/profiles/me",
    tag = "Profiles",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own profile", body = ProfileResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not registered yet")
    )
)]
pub async fn get_own_profile(
    Extension(actor): Extension<ActorContext>,
    State(state): State<AppState>,
) -> AppResult<Json<ProfileResponse>> {
    let profile = state
        .services
        .profiles()
        .get_profile(actor, actor.profile_id)
        .await?;
    Ok(Json(profile.into()))
}

/// Update the caller's contact details
#[utoipa::path(
    put,
    path = "/profiles/me",
    tag = "Profiles",
    security(("bearer_auth" = [])),
    request_body = UpdateContactRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 400, description = "Validation error")
    )
)]
pub async fn update_own_profile(
    Extension(actor): Extension<ActorContext>,
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<UpdateContactRequest>,
) -> AppResult<Json<ProfileResponse>> {
    let profile = state
        .services
        .profiles()
        .update_contact(actor, actor.profile_id, req.into())
        .await?;
    Ok(Json(profile.into()))
}

/// List client profiles (admin only)
#[utoipa::path(
    get,
    path = "/profiles",
    tag = "Profiles",
    security(("bearer_auth" = [])),
    params(ProfileFilter),
    responses(
        (status = 200, description = "Client profiles", body = Vec<ProfileResponse>),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn list_profiles(
    Extension(actor): Extension<ActorContext>,
    State(state): State<AppState>,
    Query(filter): Query<ProfileFilter>,
) -> AppResult<Json<Vec<ProfileResponse>>> {
    let profiles = state
        .services
        .profiles()
        .list_profiles(actor, filter.status)
        .await?;
    Ok(Json(profiles.into_iter().map(ProfileResponse::from).collect()))
}

/// Get a profile (own or admin)
#[utoipa::path(
    get,
    path = "/profiles/{id}",
    tag = "Profiles",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Profile ID")),
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 403, description = "Forbidden - Can only view own profile unless admin"),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn get_profile(
    Extension(actor): Extension<ActorContext>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ProfileResponse>> {
    let profile = state.services.profiles().get_profile(actor, id).await?;
    Ok(Json(profile.into()))
}

/// Update a profile's contact details (own or admin)
#[utoipa::path(
    put,
    path = "/profiles/{id}",
    tag = "Profiles",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Profile ID")),
    request_body = UpdateContactRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn update_profile(
    Extension(actor): Extension<ActorContext>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateContactRequest>,
) -> AppResult<Json<ProfileResponse>> {
    let profile = state
        .services
        .profiles()
        .update_contact(actor, id, req.into())
        .await?;
    Ok(Json(profile.into()))
}

/// Delete a profile and its finished bookings (admin only)
#[utoipa::path(
    delete,
    path = "/profiles/{id}",
    tag = "Profiles",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Profile ID")),
    responses(
        (status = 204, description = "Profile deleted"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 409, description = "Profile still has live bookings")
    )
)]
pub async fn delete_profile(
    Extension(actor): Extension<ActorContext>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.profiles().delete_profile(actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Decide on a pending verification (admin only)
#[utoipa::path(
    post,
    path = "/profiles/{id}/review",
    tag = "Verification",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Profile ID")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Decision applied", body = ProfileResponse),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 409, description = "Profile is not pending review")
    )
)]
pub async fn review_profile(
    Extension(actor): Extension<ActorContext>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<ReviewRequest>,
) -> AppResult<Json<ProfileResponse>> {
    let profile = state
        .services
        .verification()
        .review_decision(actor, id, req.decision)
        .await?;
    Ok(Json(profile.into()))
}

/// Withdraw a verification (admin only)
#[utoipa::path(
    post,
    path = "/profiles/{id}/revoke",
    tag = "Verification",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Profile ID")),
    responses(
        (status = 200, description = "Verification revoked", body = ProfileResponse),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 409, description = "Profile is not verified")
    )
)]
pub async fn revoke_profile(
    Extension(actor): Extension<ActorContext>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ProfileResponse>> {
    let profile = state
        .services
        .verification()
        .revoke_verification(actor, id)
        .await?;
    Ok(Json(profile.into()))
}
