//! Verification handlers: document upload, submission and eligibility.

use axum::{
    extract::{Extension, Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use common::AppResult;
use domain::{ActorContext, DocumentSlot, Origin, ProfileResponse};
use rental_service_lib::service::{decode_image, Submission};

use crate::extractors::ValidatedJson;
use crate::state::AppState;

/// Document image upload
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DocumentUploadRequest {
    /// JPEG or PNG as base64, with or without a `data:` prefix
    #[validate(length(min = 1, message = "Image is required"))]
    pub image: String,
}

/// Submission for admin review
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct FinalizeRequest {
    pub origin: Origin,
    /// Required for foreign clients
    #[schema(example = "TB3401")]
    pub flight_number: Option<String>,
    /// Booking that receives the flight number
    pub booking_id: Option<Uuid>,
}

impl From<FinalizeRequest> for Submission {
    fn from(req: FinalizeRequest) -> Self {
        Self {
            origin: req.origin,
            flight_number: req.flight_number,
            booking_id: req.booking_id,
        }
    }
}

/// Whose verification a call acts on. Defaults to the caller.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VerificationTarget {
    /// Another profile (admin only)
    pub profile_id: Option<Uuid>,
}

impl VerificationTarget {
    fn resolve(&self, actor: &ActorContext) -> Uuid {
        self.profile_id.unwrap_or(actor.profile_id)
    }
}

/// Eligibility answer
#[derive(Debug, Serialize, ToSchema)]
pub struct EligibilityResponse {
    pub profile_id: Uuid,
    pub can_initiate_booking: bool,
}

/// Create verification routes
pub fn verification_routes() -> Router<AppState> {
    Router::new()
        .route("/documents/:slot", post(upload_document))
        .route("/finalize", post(finalize_submission))
        .route("/eligibility", get(eligibility))
}

/// Upload one identity document
#[utoipa::path(
    post,
    path = "/verification/documents/{slot}",
    tag = "Verification",
    security(("bearer_auth" = [])),
    params(
        ("slot" = DocumentSlot, Path, description = "id-front, id-back, passport, license-front or license-back"),
        VerificationTarget
    ),
    request_body = DocumentUploadRequest,
    responses(
        (status = 200, description = "Document stored", body = ProfileResponse),
        (status = 400, description = "Unreadable, empty or oversized image"),
        (status = 422, description = "License issued too recently"),
        (status = 502, description = "Document analysis or storage unavailable")
    )
)]
pub async fn upload_document(
    Extension(actor): Extension<ActorContext>,
    State(state): State<AppState>,
    Path(slot): Path<String>,
    Query(target): Query<VerificationTarget>,
    ValidatedJson(req): ValidatedJson<DocumentUploadRequest>,
) -> AppResult<Json<ProfileResponse>> {
    let slot: DocumentSlot = slot.parse()?;
    let bytes = decode_image(&req.image)?;

    let profile = state
        .services
        .verification()
        .submit_document(actor, target.resolve(&actor), slot, bytes)
        .await?;
    Ok(Json(profile.into()))
}

/// Submit uploaded documents for review
#[utoipa::path(
    post,
    path = "/verification/finalize",
    tag = "Verification",
    security(("bearer_auth" = [])),
    params(VerificationTarget),
    request_body = FinalizeRequest,
    responses(
        (status = 200, description = "Submission pending review", body = ProfileResponse),
        (status = 400, description = "Missing documents or flight number"),
        (status = 409, description = "Profile cannot submit in its current status")
    )
)]
pub async fn finalize_submission(
    Extension(actor): Extension<ActorContext>,
    State(state): State<AppState>,
    Query(target): Query<VerificationTarget>,
    ValidatedJson(req): ValidatedJson<FinalizeRequest>,
) -> AppResult<Json<ProfileResponse>> {
    let profile = state
        .services
        .verification()
        .finalize_submission(actor, target.resolve(&actor), req.into())
        .await?;
    Ok(Json(profile.into()))
}

/// Whether the profile may open a booking
#[utoipa::path(
    get,
    path = "/verification/eligibility",
    tag = "Verification",
    security(("bearer_auth" = [])),
    params(VerificationTarget),
    responses(
        (status = 200, description = "Booking eligibility", body = EligibilityResponse),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn eligibility(
    Extension(actor): Extension<ActorContext>,
    State(state): State<AppState>,
    Query(target): Query<VerificationTarget>,
) -> AppResult<Json<EligibilityResponse>> {
    let profile_id = target.resolve(&actor);
    let can_initiate_booking = state
        .services
        .verification()
        .can_initiate_booking(actor, profile_id)
        .await?;
    Ok(Json(EligibilityResponse {
        profile_id,
        can_initiate_booking,
    }))
}
