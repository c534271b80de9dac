//! OpenAPI documentation.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use domain::{
    BookingResponse, BookingStatus, BookingView, DocumentRefs, DocumentSlot, ExtractedFields,
    Origin, ProfileResponse, Quote, RentalNote, ReviewDecision, Role, Transmission, Vehicle,
    VehicleCategory, VehicleStatus, VerificationStatus,
};

use crate::handlers::booking_handler::{
    ConfirmBookingRequest, CreateBookingRequest, FlightNumberRequest, ReturnBookingRequest,
};
use crate::handlers::health_handler::{HealthResponse, ServiceHealth, ServiceStatus};
use crate::handlers::profile_handler::{RegisterProfileRequest, ReviewRequest, UpdateContactRequest};
use crate::handlers::vehicle_handler::{
    ImageUrlResponse, VehicleImageRequest, VehicleRequest, VehicleStatusRequest,
};
use crate::handlers::verification_handler::{
    DocumentUploadRequest, EligibilityResponse, FinalizeRequest,
};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health_handler::health_check,
        crate::handlers::profile_handler::register_profile,
        crate::handlers::profile_handler::get_own_profile,
        crate::handlers::profile_handler::update_own_profile,
        crate::handlers::profile_handler::list_profiles,
        crate::handlers::profile_handler::get_profile,
        crate::handlers::profile_handler::update_profile,
        crate::handlers::profile_handler::delete_profile,
        crate::handlers::profile_handler::review_profile,
        crate::handlers::profile_handler::revoke_profile,
        crate::handlers::verification_handler::upload_document,
        crate::handlers::verification_handler::finalize_submission,
        crate::handlers::verification_handler::eligibility,
        crate::handlers::vehicle_handler::list_vehicles,
        crate::handlers::vehicle_handler::list_available,
        crate::handlers::vehicle_handler::get_vehicle,
        crate::handlers::vehicle_handler::create_vehicle,
        crate::handlers::vehicle_handler::update_vehicle,
        crate::handlers::vehicle_handler::set_status,
        crate::handlers::vehicle_handler::delete_vehicle,
        crate::handlers::vehicle_handler::quote,
        crate::handlers::vehicle_handler::upload_image,
        crate::handlers::booking_handler::create_booking,
        crate::handlers::booking_handler::list_bookings,
        crate::handlers::booking_handler::get_booking,
        crate::handlers::booking_handler::confirm_booking,
        crate::handlers::booking_handler::return_booking,
        crate::handlers::booking_handler::archive_booking,
        crate::handlers::booking_handler::set_flight_number,
        crate::handlers::booking_handler::delete_booking,
    ),
    components(
        schemas(
            HealthResponse,
            ServiceStatus,
            ServiceHealth,
            RegisterProfileRequest,
            UpdateContactRequest,
            ReviewRequest,
            ProfileResponse,
            VerificationStatus,
            ReviewDecision,
            Role,
            RentalNote,
            DocumentRefs,
            ExtractedFields,
            DocumentSlot,
            Origin,
            DocumentUploadRequest,
            FinalizeRequest,
            EligibilityResponse,
            Vehicle,
            VehicleCategory,
            VehicleStatus,
            Transmission,
            VehicleRequest,
            VehicleStatusRequest,
            VehicleImageRequest,
            ImageUrlResponse,
            Quote,
            CreateBookingRequest,
            ConfirmBookingRequest,
            ReturnBookingRequest,
            FlightNumberRequest,
            BookingResponse,
            BookingStatus,
            BookingView,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and dependency checks"),
        (name = "Profiles", description = "Client profiles"),
        (name = "Verification", description = "Identity documents and admin review"),
        (name = "Vehicles", description = "Fleet catalogue and pricing"),
        (name = "Bookings", description = "Rental lifecycle"),
    )
)]
pub struct ApiDoc;

/// Security scheme modifier.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
