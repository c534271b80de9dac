//! Profile entity and the verification sub-state-machine.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::actor::Role;
use crate::constants::{FALLBACK_LOCALE, MAX_NOTE_LENGTH, SUPPORTED_LOCALES};
use crate::document::{AnalyzedDocument, DocumentSlot};
use crate::error::{DomainError, DomainResult};

/// Verification status of a profile.
///
/// `unregistered -> registered -> pending -> verified`, with `rejected`
/// reachable from `pending` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Unregistered,
    Registered,
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Unregistered => "unregistered",
            VerificationStatus::Registered => "registered",
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
        }
    }

    /// Statuses from which a completed document submission moves the
    /// profile to `pending`. Rejected profiles may resubmit.
    pub fn can_submit_for_review(&self) -> bool {
        matches!(
            self,
            VerificationStatus::Registered | VerificationStatus::Rejected
        )
    }

    /// Statuses an admin correction can send back to `registered`.
    pub fn can_be_revoked(&self) -> bool {
        matches!(
            self,
            VerificationStatus::Verified | VerificationStatus::Rejected
        )
    }
}

impl std::str::FromStr for VerificationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unregistered" => Ok(VerificationStatus::Unregistered),
            "registered" => Ok(VerificationStatus::Registered),
            "pending" => Ok(VerificationStatus::Pending),
            "verified" => Ok(VerificationStatus::Verified),
            "rejected" => Ok(VerificationStatus::Rejected),
            other => Err(DomainError::validation(format!(
                "Unknown verification status '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Admin decision on a pending submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    /// `pending -> verified`
    Approve,
    /// `pending -> registered`, the client is invited to resubmit
    Reject,
    /// `pending -> rejected`
    Deny,
}

impl ReviewDecision {
    pub fn target_status(&self) -> VerificationStatus {
        match self {
            ReviewDecision::Approve => VerificationStatus::Verified,
            ReviewDecision::Reject => VerificationStatus::Registered,
            ReviewDecision::Deny => VerificationStatus::Rejected,
        }
    }
}

/// Declared origin of a client, which decides the required documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Domestic,
    Foreign,
}

impl Origin {
    pub fn required_slots(&self) -> &'static [DocumentSlot] {
        match self {
            Origin::Domestic => &[
                DocumentSlot::IdFront,
                DocumentSlot::IdBack,
                DocumentSlot::LicenseFront,
                DocumentSlot::LicenseBack,
            ],
            Origin::Foreign => &[
                DocumentSlot::Passport,
                DocumentSlot::LicenseFront,
                DocumentSlot::LicenseBack,
            ],
        }
    }

    pub fn requires_flight_number(&self) -> bool {
        matches!(self, Origin::Foreign)
    }
}

/// One entry of the append-only rental history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RentalNote {
    pub recorded_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub note: String,
}

impl RentalNote {
    /// Build a note, rejecting blank or oversized text.
    pub fn new(author_id: Uuid, note: &str, recorded_at: DateTime<Utc>) -> DomainResult<Self> {
        let note = note.trim();
        if note.is_empty() {
            return Err(DomainError::validation("Note cannot be empty"));
        }
        if note.chars().count() > MAX_NOTE_LENGTH {
            return Err(DomainError::validation(format!(
                "Note cannot exceed {} characters",
                MAX_NOTE_LENGTH
            )));
        }
        Ok(Self {
            recorded_at,
            author_id,
            note: note.to_string(),
        })
    }
}

impl std::fmt::Display for RentalNote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.recorded_at.format("%d/%m/%Y"), self.note)
    }
}

/// Stored image references, one per slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DocumentRefs {
    pub id_front_url: Option<String>,
    pub id_back_url: Option<String>,
    pub passport_url: Option<String>,
    pub license_front_url: Option<String>,
    pub license_back_url: Option<String>,
}

impl DocumentRefs {
    pub fn get(&self, slot: DocumentSlot) -> Option<&str> {
        match slot {
            DocumentSlot::IdFront => self.id_front_url.as_deref(),
            DocumentSlot::IdBack => self.id_back_url.as_deref(),
            DocumentSlot::Passport => self.passport_url.as_deref(),
            DocumentSlot::LicenseFront => self.license_front_url.as_deref(),
            DocumentSlot::LicenseBack => self.license_back_url.as_deref(),
        }
    }

    pub fn set(&mut self, slot: DocumentSlot, url: String) {
        let field = match slot {
            DocumentSlot::IdFront => &mut self.id_front_url,
            DocumentSlot::IdBack => &mut self.id_back_url,
            DocumentSlot::Passport => &mut self.passport_url,
            DocumentSlot::LicenseFront => &mut self.license_front_url,
            DocumentSlot::LicenseBack => &mut self.license_back_url,
        };
        *field = Some(url);
    }

    /// Slots required for `origin` that have no stored image yet.
    pub fn missing_for(&self, origin: Origin) -> Vec<DocumentSlot> {
        origin
            .required_slots()
            .iter()
            .copied()
            .filter(|slot| self.get(*slot).is_none())
            .collect()
    }
}

/// Fields copied from analysed documents for admin review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ExtractedFields {
    pub full_name: Option<String>,
    pub document_number: Option<String>,
    pub license_number: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub license_issue_date: Option<NaiveDate>,
}

impl ExtractedFields {
    /// Merge what the analysis found for `slot`. Absent values never erase
    /// previously extracted ones.
    pub fn absorb(&mut self, slot: DocumentSlot, doc: &AnalyzedDocument) {
        if slot.is_license() {
            if slot == DocumentSlot::LicenseFront {
                if let Some(number) = &doc.document_number {
                    self.license_number = Some(number.clone());
                }
                if let Some(issued) = doc.issue_date {
                    self.license_issue_date = Some(issued);
                }
            }
            return;
        }

        if let Some(name) = &doc.full_name {
            self.full_name = Some(name.clone());
        }
        if let Some(number) = &doc.document_number {
            self.document_number = Some(number.clone());
        }
        if let Some(birth) = doc.birth_date {
            self.birth_date = Some(birth);
        }
        if let Some(address) = &doc.address {
            self.address = Some(address.clone());
        }
    }
}

/// Profile domain entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: String,
    pub phone: Option<String>,
    pub email: String,
    pub country: Option<String>,
    pub locale: String,
    pub status: VerificationStatus,
    pub role: Role,
    pub rental_history: Vec<RentalNote>,
    pub documents: DocumentRefs,
    pub extracted: ExtractedFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Create a freshly registered client profile
    pub fn register(id: Uuid, data: NewProfile) -> Self {
        let now = Utc::now();
        Self {
            id,
            full_name: data.full_name.trim().to_string(),
            phone: data.phone,
            email: data.email.trim().to_lowercase(),
            country: data.country,
            locale: normalize_locale(data.locale.as_deref()),
            status: VerificationStatus::Registered,
            role: Role::Client,
            rental_history: Vec::new(),
            documents: DocumentRefs::default(),
            extracted: ExtractedFields::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Verification gate: verified clients and admins may book.
    pub fn can_initiate_booking(&self) -> bool {
        self.is_admin() || self.status == VerificationStatus::Verified
    }

    /// Apply a contact update in place.
    pub fn apply_contact(&mut self, update: ContactUpdate) {
        if let Some(name) = update.full_name {
            self.full_name = name.trim().to_string();
        }
        if let Some(phone) = update.phone {
            self.phone = Some(phone);
        }
        if let Some(email) = update.email {
            self.email = email.trim().to_lowercase();
        }
        if let Some(country) = update.country {
            self.country = Some(country);
        }
        if let Some(locale) = update.locale {
            self.locale = normalize_locale(Some(&locale));
        }
        self.updated_at = Utc::now();
    }
}

/// Map any locale tag onto a supported template locale.
pub fn normalize_locale(locale: Option<&str>) -> String {
    locale
        .map(|l| l.trim().to_lowercase())
        .and_then(|l| {
            let primary = l.split(['-', '_']).next().unwrap_or_default().to_string();
            SUPPORTED_LOCALES.contains(&primary.as_str()).then_some(primary)
        })
        .unwrap_or_else(|| FALLBACK_LOCALE.to_string())
}

/// Profile registration data
#[derive(Debug, Clone, Deserialize)]
pub struct NewProfile {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub locale: Option<String>,
}

/// Contact details a client may edit. Status and role are not editable here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub country: Option<String>,
    pub locale: Option<String>,
}

/// Profile response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProfileResponse {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub locale: String,
    pub status: VerificationStatus,
    pub role: Role,
    pub can_initiate_booking: bool,
    pub rental_history: Vec<RentalNote>,
    pub documents: DocumentRefs,
    pub extracted: ExtractedFields,
    pub created_at: DateTime<Utc>,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            can_initiate_booking: profile.can_initiate_booking(),
            id: profile.id,
            full_name: profile.full_name,
            email: profile.email,
            phone: profile.phone,
            country: profile.country,
            locale: profile.locale,
            status: profile.status,
            role: profile.role,
            rental_history: profile.rental_history,
            documents: profile.documents,
            extracted: profile.extracted,
            created_at: profile.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(status: VerificationStatus, role: Role) -> Profile {
        let mut p = Profile::register(
            Uuid::new_v4(),
            NewProfile {
                full_name: "Amina El Idrissi".to_string(),
                email: "amina@example.com".to_string(),
                phone: None,
                country: Some("MA".to_string()),
                locale: None,
            },
        );
        p.status = status;
        p.role = role;
        p
    }

    #[test]
    fn test_gate_allows_verified_and_admin_only() {
        assert!(!profile(VerificationStatus::Registered, Role::Client).can_initiate_booking());
        assert!(!profile(VerificationStatus::Pending, Role::Client).can_initiate_booking());
        assert!(!profile(VerificationStatus::Rejected, Role::Client).can_initiate_booking());
        assert!(profile(VerificationStatus::Verified, Role::Client).can_initiate_booking());
        assert!(profile(VerificationStatus::Registered, Role::Admin).can_initiate_booking());
    }

    #[test]
    fn test_locale_normalisation() {
        assert_eq!(normalize_locale(Some("en-GB")), "en");
        assert_eq!(normalize_locale(Some("NL")), "nl");
        assert_eq!(normalize_locale(Some("es")), "fr");
        assert_eq!(normalize_locale(None), "fr");
    }

    #[test]
    fn test_missing_documents_per_origin() {
        let mut refs = DocumentRefs::default();
        refs.set(DocumentSlot::LicenseFront, "a".to_string());
        refs.set(DocumentSlot::LicenseBack, "b".to_string());
        refs.set(DocumentSlot::Passport, "c".to_string());

        assert!(refs.missing_for(Origin::Foreign).is_empty());
        assert_eq!(
            refs.missing_for(Origin::Domestic),
            vec![DocumentSlot::IdFront, DocumentSlot::IdBack]
        );
    }

    #[test]
    fn test_license_fields_do_not_overwrite_identity_fields() {
        let mut fields = ExtractedFields::default();
        let id = AnalyzedDocument {
            full_name: Some("AMINA EL IDRISSI".to_string()),
            document_number: Some("R123456".to_string()),
            ..Default::default()
        };
        let license = AnalyzedDocument {
            full_name: Some("A. EL IDRISSI".to_string()),
            document_number: Some("12/345678".to_string()),
            issue_date: NaiveDate::from_ymd_opt(2019, 3, 1),
            ..Default::default()
        };

        fields.absorb(DocumentSlot::IdFront, &id);
        fields.absorb(DocumentSlot::LicenseFront, &license);

        assert_eq!(fields.full_name.as_deref(), Some("AMINA EL IDRISSI"));
        assert_eq!(fields.document_number.as_deref(), Some("R123456"));
        assert_eq!(fields.license_number.as_deref(), Some("12/345678"));
        assert_eq!(fields.license_issue_date, NaiveDate::from_ymd_opt(2019, 3, 1));
    }

    #[test]
    fn test_note_rendering_and_validation() {
        let at = DateTime::parse_from_rfc3339("2025-08-02T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let note = RentalNote::new(Uuid::new_v4(), "  scratch on rear bumper ", at).unwrap();
        assert_eq!(note.to_string(), "02/08/2025: scratch on rear bumper");
        assert!(RentalNote::new(Uuid::new_v4(), "   ", at).is_err());
    }
}
