//! Identity documents: upload slots, analysis output and the license
//! seniority rule.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::constants::LICENSE_SENIORITY_MONTHS;
use crate::error::{DomainError, DomainResult};

/// Document slots a profile can fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "kebab-case")]
pub enum DocumentSlot {
    IdFront,
    IdBack,
    Passport,
    LicenseFront,
    LicenseBack,
}

impl DocumentSlot {
    pub const ALL: [DocumentSlot; 5] = [
        DocumentSlot::IdFront,
        DocumentSlot::IdBack,
        DocumentSlot::Passport,
        DocumentSlot::LicenseFront,
        DocumentSlot::LicenseBack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentSlot::IdFront => "id-front",
            DocumentSlot::IdBack => "id-back",
            DocumentSlot::Passport => "passport",
            DocumentSlot::LicenseFront => "license-front",
            DocumentSlot::LicenseBack => "license-back",
        }
    }

    /// Driving license sides
    pub fn is_license(&self) -> bool {
        matches!(self, DocumentSlot::LicenseFront | DocumentSlot::LicenseBack)
    }
}

impl std::str::FromStr for DocumentSlot {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentSlot::ALL
            .into_iter()
            .find(|slot| slot.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("Unknown document slot '{}'", s)))
    }
}

impl std::fmt::Display for DocumentSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured fields read from a document image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzedDocument {
    pub full_name: Option<String>,
    pub document_number: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
}

/// Result of a document analysis call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Found(AnalyzedDocument),
    /// The image did not contain a recognisable document
    NoDocument,
}

/// Reject licenses issued less than the seniority window before `today`.
pub fn check_license_seniority(issued_on: NaiveDate, today: NaiveDate) -> DomainResult<()> {
    let eligible_on = issued_on
        .checked_add_months(Months::new(LICENSE_SENIORITY_MONTHS))
        .ok_or_else(|| DomainError::validation("License issue date out of range"))?;

    if today < eligible_on {
        return Err(DomainError::Seniority {
            issued_on,
            eligible_on,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_slot_round_trips_through_str() {
        for slot in DocumentSlot::ALL {
            assert_eq!(slot.as_str().parse::<DocumentSlot>().unwrap(), slot);
        }
        assert!("selfie".parse::<DocumentSlot>().is_err());
    }

    #[test]
    fn test_license_thirteen_months_old_is_rejected() {
        let today = date(2025, 6, 15);
        let err = check_license_seniority(date(2024, 5, 15), today).unwrap_err();
        assert_eq!(
            err,
            DomainError::Seniority {
                issued_on: date(2024, 5, 15),
                eligible_on: date(2026, 5, 15),
            }
        );
    }

    #[test]
    fn test_license_exactly_two_years_old_is_accepted() {
        assert!(check_license_seniority(date(2023, 6, 15), date(2025, 6, 15)).is_ok());
        assert!(check_license_seniority(date(2023, 6, 16), date(2025, 6, 15)).is_err());
    }
}
