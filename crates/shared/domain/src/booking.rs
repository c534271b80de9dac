//! Booking entity and its lifecycle.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{LOCATION_CODES, MAX_FLIGHT_NUMBER_LENGTH, MIN_FLIGHT_NUMBER_LENGTH};
use crate::error::{DomainError, DomainResult};

static FLIGHT_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        "^[A-Z0-9]{{{},{}}}$",
        MIN_FLIGHT_NUMBER_LENGTH, MAX_FLIGHT_NUMBER_LENGTH
    ))
    .expect("flight number pattern is valid")
});

/// Booking status.
///
/// `pending -> confirmed -> completed`, with no way back from `completed`.
/// Deleting a confirmed booking releases its vehicle in the same write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Confirmed, BookingStatus::Completed)
        )
    }

    /// A live booking keeps its owner from being deleted.
    pub fn is_live(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            other => Err(DomainError::validation(format!(
                "Unknown booking status '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listing filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum BookingView {
    #[default]
    Active,
    Archived,
}

impl BookingView {
    pub fn matches(&self, booking: &Booking) -> bool {
        let archived = booking.archived || booking.status == BookingStatus::Completed;
        match self {
            BookingView::Active => !archived,
            BookingView::Archived => archived,
        }
    }
}

/// Booking domain entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub profile_id: Uuid,
    /// Live assignment, set only while the booking is confirmed
    pub vehicle_id: Option<Uuid>,
    /// Vehicle that served the rental, set at completion
    pub returned_vehicle_id: Option<Uuid>,
    /// Vehicle the client picked when requesting; no occupancy effect
    pub requested_vehicle_id: Option<Uuid>,
    pub pickup_location: String,
    pub return_location: String,
    pub pickup_at: DateTime<Utc>,
    pub return_at: DateTime<Utc>,
    /// Total price in MAD
    pub total_price: i64,
    pub flight_number: Option<String>,
    pub status: BookingStatus,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Create a pending booking from a validated request.
    pub fn pending(id: Uuid, profile_id: Uuid, request: BookingRequest) -> Self {
        let now = Utc::now();
        Self {
            id,
            profile_id,
            vehicle_id: None,
            returned_vehicle_id: None,
            requested_vehicle_id: request.requested_vehicle_id,
            pickup_location: expand_location(&request.pickup_location),
            return_location: expand_location(&request.return_location),
            pickup_at: request.pickup_at,
            return_at: request.return_at,
            total_price: request.total_price,
            flight_number: None,
            status: BookingStatus::Pending,
            archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Vehicle the booking currently occupies.
    pub fn holds_vehicle(&self) -> Option<Uuid> {
        match self.status {
            BookingStatus::Confirmed => self.vehicle_id,
            _ => None,
        }
    }

    /// Any vehicle tied to this booking, live or returned.
    pub fn served_by(&self) -> Option<Uuid> {
        self.vehicle_id.or(self.returned_vehicle_id)
    }
}

/// Client rental request
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub pickup_location: String,
    pub return_location: String,
    pub pickup_at: DateTime<Utc>,
    pub return_at: DateTime<Utc>,
    pub total_price: i64,
    pub requested_vehicle_id: Option<Uuid>,
}

impl BookingRequest {
    pub fn validate(&self) -> DomainResult<()> {
        if self.total_price < 0 {
            return Err(DomainError::validation("Price cannot be negative"));
        }
        if self.pickup_at > self.return_at {
            return Err(DomainError::validation(
                "Pickup must not be after return",
            ));
        }
        if self.pickup_location.trim().is_empty() || self.return_location.trim().is_empty() {
            return Err(DomainError::validation(
                "Pickup and return locations are required",
            ));
        }
        Ok(())
    }
}

/// Expand a known location code to its display name.
pub fn expand_location(location: &str) -> String {
    let trimmed = location.trim();
    LOCATION_CODES
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(trimmed))
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// Upper-case a flight reference and check its shape.
pub fn normalize_flight_number(raw: &str) -> DomainResult<String> {
    let normalized: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    if FLIGHT_NUMBER.is_match(&normalized) {
        Ok(normalized)
    } else {
        Err(DomainError::validation(format!(
            "Flight number must be {} to {} letters or digits",
            MIN_FLIGHT_NUMBER_LENGTH, MAX_FLIGHT_NUMBER_LENGTH
        )))
    }
}

/// Booking response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BookingResponse {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub returned_vehicle_id: Option<Uuid>,
    pub requested_vehicle_id: Option<Uuid>,
    pub pickup_location: String,
    pub return_location: String,
    pub pickup_at: DateTime<Utc>,
    pub return_at: DateTime<Utc>,
    pub total_price: i64,
    pub flight_number: Option<String>,
    pub status: BookingStatus,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            profile_id: b.profile_id,
            vehicle_id: b.vehicle_id,
            returned_vehicle_id: b.returned_vehicle_id,
            requested_vehicle_id: b.requested_vehicle_id,
            pickup_location: b.pickup_location,
            return_location: b.return_location,
            pickup_at: b.pickup_at,
            return_at: b.return_at,
            total_price: b.total_price,
            flight_number: b.flight_number,
            status: b.status,
            archived: b.archived,
            created_at: b.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn request() -> BookingRequest {
        let pickup = Utc::now() + Duration::days(3);
        BookingRequest {
            pickup_location: "ndr".to_string(),
            return_location: "Hotel Mercure".to_string(),
            pickup_at: pickup,
            return_at: pickup + Duration::days(3),
            total_price: 900,
            requested_vehicle_id: None,
        }
    }

    #[test]
    fn test_transitions_are_linear() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Confirmed));
        assert!(!Confirmed.can_transition_to(Pending));
    }

    #[test]
    fn test_request_validation() {
        assert!(request().validate().is_ok());

        let mut negative = request();
        negative.total_price = -1;
        assert!(negative.validate().is_err());

        let mut inverted = request();
        inverted.return_at = inverted.pickup_at - Duration::hours(1);
        assert!(inverted.validate().is_err());

        let mut same_time = request();
        same_time.return_at = same_time.pickup_at;
        assert!(same_time.validate().is_ok());
    }

    #[test]
    fn test_location_codes_expand() {
        let booking = Booking::pending(Uuid::new_v4(), Uuid::new_v4(), request());
        assert_eq!(booking.pickup_location, "Aéroport Nador El Aroui");
        assert_eq!(booking.return_location, "Hotel Mercure");
        assert_eq!(booking.status, BookingStatus::Pending);
        assert!(booking.vehicle_id.is_none());
    }

    #[test]
    fn test_views_partition_bookings() {
        let mut booking = Booking::pending(Uuid::new_v4(), Uuid::new_v4(), request());
        assert!(BookingView::Active.matches(&booking));
        assert!(!BookingView::Archived.matches(&booking));

        booking.archived = true;
        assert!(BookingView::Archived.matches(&booking));

        booking.archived = false;
        booking.status = BookingStatus::Completed;
        assert!(!BookingView::Active.matches(&booking));
        assert!(BookingView::Archived.matches(&booking));
    }

    #[test]
    fn test_flight_number_normalisation() {
        assert_eq!(normalize_flight_number(" at 812 ").unwrap(), "AT812");
        assert!(normalize_flight_number("A1").is_err());
        assert!(normalize_flight_number("AT-812").is_err());
    }
}
