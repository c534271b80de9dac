//! Vehicle entity and fleet validation rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{MAX_GALLERY_IMAGES, VEHICLE_CATEGORIES};
use crate::error::{DomainError, DomainResult};

/// Occupancy status of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    Available,
    Rented,
    Maintenance,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "available",
            VehicleStatus::Rented => "rented",
            VehicleStatus::Maintenance => "maintenance",
        }
    }
}

impl std::str::FromStr for VehicleStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(VehicleStatus::Available),
            "rented" => Ok(VehicleStatus::Rented),
            "maintenance" => Ok(VehicleStatus::Maintenance),
            other => Err(DomainError::validation(format!(
                "Unknown vehicle status '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Transmission {
    #[serde(alias = "Manuelle")]
    Manual,
    #[serde(alias = "Automatique")]
    Automatic,
}

impl Transmission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transmission::Manual => "manual",
            Transmission::Automatic => "automatic",
        }
    }
}

impl std::str::FromStr for Transmission {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" | "Manuelle" => Ok(Transmission::Manual),
            "automatic" | "Automatique" => Ok(Transmission::Automatic),
            other => Err(DomainError::validation(format!(
                "Unknown transmission '{}'",
                other
            ))),
        }
    }
}

/// Catalogue category, stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(try_from = "String", into = "String")]
pub struct VehicleCategory(String);

impl VehicleCategory {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VehicleCategory {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let upper = value.trim().to_uppercase();
        if VEHICLE_CATEGORIES.contains(&upper.as_str()) {
            Ok(Self(upper))
        } else {
            Err(DomainError::validation(format!(
                "Category must be one of {}",
                VEHICLE_CATEGORIES.join(", ")
            )))
        }
    }
}

impl From<VehicleCategory> for String {
    fn from(category: VehicleCategory) -> Self {
        category.0
    }
}

/// Vehicle domain entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Vehicle {
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub plate: String,
    pub status: VehicleStatus,
    pub category: VehicleCategory,
    /// Low-season day rate in MAD
    pub rate_low: i64,
    /// High-season day rate in MAD
    pub rate_high: i64,
    pub seats: i32,
    pub doors: i32,
    pub air_conditioning: bool,
    pub transmission: Transmission,
    pub mileage_policy: String,
    pub image_url: Option<String>,
    pub gallery: Vec<String>,
    /// Profile holding the vehicle while a booking is confirmed
    pub assigned_profile_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn from_spec(id: Uuid, spec: VehicleSpec) -> Self {
        let now = Utc::now();
        Self {
            id,
            make: spec.make,
            model: spec.model,
            plate: spec.plate,
            status: VehicleStatus::Available,
            category: spec.category,
            rate_low: spec.rate_low,
            rate_high: spec.rate_high,
            seats: spec.seats,
            doors: spec.doors,
            air_conditioning: spec.air_conditioning,
            transmission: spec.transmission,
            mileage_policy: spec.mileage_policy,
            image_url: spec.image_url,
            gallery: spec.gallery,
            assigned_profile_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// "Make Model", used in messages and listings.
    pub fn descriptor(&self) -> String {
        format!("{} {}", self.make, self.model)
    }

    pub fn is_available(&self) -> bool {
        self.status == VehicleStatus::Available
    }

    /// Replace the descriptive attributes, leaving status and assignment alone.
    pub fn apply_spec(&mut self, spec: VehicleSpec) {
        self.make = spec.make;
        self.model = spec.model;
        self.plate = spec.plate;
        self.category = spec.category;
        self.rate_low = spec.rate_low;
        self.rate_high = spec.rate_high;
        self.seats = spec.seats;
        self.doors = spec.doors;
        self.air_conditioning = spec.air_conditioning;
        self.transmission = spec.transmission;
        self.mileage_policy = spec.mileage_policy;
        self.image_url = spec.image_url;
        self.gallery = spec.gallery;
        self.updated_at = Utc::now();
    }
}

/// Descriptive attributes an admin sets when creating or editing a vehicle.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VehicleSpec {
    pub make: String,
    pub model: String,
    pub plate: String,
    pub category: VehicleCategory,
    pub rate_low: i64,
    pub rate_high: i64,
    pub seats: i32,
    pub doors: i32,
    pub air_conditioning: bool,
    pub transmission: Transmission,
    pub mileage_policy: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub gallery: Vec<String>,
}

impl VehicleSpec {
    pub fn validate(&self) -> DomainResult<()> {
        if self.make.trim().is_empty() || self.model.trim().is_empty() {
            return Err(DomainError::validation("Make and model are required"));
        }
        if self.plate.trim().is_empty() {
            return Err(DomainError::validation("License plate is required"));
        }
        if self.rate_low < 0 || self.rate_high < 0 {
            return Err(DomainError::validation("Day rates cannot be negative"));
        }
        if self.rate_high < self.rate_low {
            return Err(DomainError::validation(
                "High-season rate cannot be lower than the low-season rate",
            ));
        }
        if self.seats <= 0 || self.doors <= 0 {
            return Err(DomainError::validation("Seats and doors must be positive"));
        }
        if self.gallery.len() > MAX_GALLERY_IMAGES {
            return Err(DomainError::validation(format!(
                "A vehicle can have at most {} gallery images",
                MAX_GALLERY_IMAGES
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> VehicleSpec {
        VehicleSpec {
            make: "Dacia".to_string(),
            model: "Duster".to_string(),
            plate: "12345-A-6".to_string(),
            category: VehicleCategory::try_from("suv".to_string()).unwrap(),
            rate_low: 300,
            rate_high: 450,
            seats: 5,
            doors: 5,
            air_conditioning: true,
            transmission: Transmission::Manual,
            mileage_policy: "Illimité".to_string(),
            image_url: None,
            gallery: vec![],
        }
    }

    #[test]
    fn test_valid_spec() {
        assert!(spec().validate().is_ok());
        assert_eq!(spec().category.as_str(), "SUV");
    }

    #[test]
    fn test_gallery_is_bounded() {
        let mut s = spec();
        s.gallery = (0..=MAX_GALLERY_IMAGES).map(|i| format!("img-{i}")).collect();
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_rates_must_be_ordered() {
        let mut s = spec();
        s.rate_high = 200;
        assert!(s.validate().is_err());
        s.rate_low = -1;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_unknown_category_rejected() {
        assert!(VehicleCategory::try_from("LIMOUSINE".to_string()).is_err());
    }

    #[test]
    fn test_new_vehicle_is_available_and_unassigned() {
        let v = Vehicle::from_spec(Uuid::new_v4(), spec());
        assert!(v.is_available());
        assert!(v.assigned_profile_id.is_none());
        assert_eq!(v.descriptor(), "Dacia Duster");
    }
}
