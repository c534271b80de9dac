//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// Roles
// =============================================================================

/// Role of a regular customer
pub const ROLE_CLIENT: &str = "client";

/// Administrator role, exempt from verification gating
pub const ROLE_ADMIN: &str = "admin";

/// All valid role values
pub const VALID_ROLES: &[&str] = &[ROLE_CLIENT, ROLE_ADMIN];

/// Check if a role value is valid
pub fn is_valid_role(role: &str) -> bool {
    VALID_ROLES.contains(&role)
}

// =============================================================================
// Locales
// =============================================================================

/// Locale used when a profile has none or an unsupported one
pub const FALLBACK_LOCALE: &str = "fr";

/// Locales with message templates
pub const SUPPORTED_LOCALES: &[&str] = &["fr", "en", "nl"];

// =============================================================================
// Verification
// =============================================================================

/// A driving license must be at least this old (in months) to rent
pub const LICENSE_SENIORITY_MONTHS: u32 = 24;

// =============================================================================
// Fleet
// =============================================================================

/// Maximum number of gallery images per vehicle
pub const MAX_GALLERY_IMAGES: usize = 5;

/// Vehicle categories offered in the catalogue
pub const VEHICLE_CATEGORIES: &[&str] = &["MINI", "ECONOMIQUE", "COMPACTE", "SUV", "PREMIUM"];

/// Months billed at the high-season day rate (July, August)
pub const HIGH_SEASON_MONTHS: &[u32] = &[7, 8];

// =============================================================================
// Bookings
// =============================================================================

/// Minimum length of a flight reference
pub const MIN_FLIGHT_NUMBER_LENGTH: usize = 3;

/// Maximum length of a flight reference
pub const MAX_FLIGHT_NUMBER_LENGTH: usize = 10;

/// Pickup/return location codes and their display names
pub const LOCATION_CODES: &[(&str, &str)] = &[
    ("NDR", "Aéroport Nador El Aroui"),
    ("AHU", "Aéroport Al Hoceima"),
    ("TNG", "Aéroport Tanger"),
    ("AGENCY", "Agence Al Hoceima"),
];

/// Maximum length of a rental-history note
pub const MAX_NOTE_LENGTH: usize = 2000;
