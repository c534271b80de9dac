//! Document intake: image decoding, analysis, seniority rule and storage.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::document::check_license_seniority;
use domain::{AnalysisOutcome, AnalyzedDocument, DocumentSlot};

use crate::integrations::{DocumentAnalyzer, ObjectStore};

/// Decode an image sent as base64, optionally wrapped in a `data:` URL.
pub fn decode_image(payload: &str) -> AppResult<Vec<u8>> {
    let encoded = match payload.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => payload,
    };
    let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();

    STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|_| AppError::validation("Image is not valid base64"))
}

/// Keep letters, digits, dots, dashes and underscores.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches('_').is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}

/// Object path of a document scan.
pub fn document_path(profile_id: Uuid, slot: DocumentSlot, at: DateTime<Utc>) -> String {
    format!("{}/{}_{}.jpg", profile_id, slot, at.timestamp_millis())
}

pub struct DocumentIntake {
    analyzer: Arc<dyn DocumentAnalyzer>,
    objects: Arc<dyn ObjectStore>,
    max_bytes: usize,
}

impl DocumentIntake {
    pub fn new(
        analyzer: Arc<dyn DocumentAnalyzer>,
        objects: Arc<dyn ObjectStore>,
        max_bytes: usize,
    ) -> Self {
        Self {
            analyzer,
            objects,
            max_bytes,
        }
    }

    fn check_size(&self, image: &[u8]) -> AppResult<()> {
        if image.is_empty() {
            return Err(AppError::validation("Image is empty"));
        }
        if image.len() > self.max_bytes {
            return Err(AppError::validation(format!(
                "Image is {} bytes, the limit is {}",
                image.len(),
                self.max_bytes
            )));
        }
        Ok(())
    }

    /// Analyse an image for `slot`. License fronts must also pass the
    /// seniority rule against `today`.
    pub async fn analyze(
        &self,
        slot: DocumentSlot,
        image: &[u8],
        today: NaiveDate,
    ) -> AppResult<AnalyzedDocument> {
        self.check_size(image)?;

        let document = match self.analyzer.analyze(image).await? {
            AnalysisOutcome::Found(document) => document,
            AnalysisOutcome::NoDocument => {
                return Err(AppError::validation(
                    "No document found in the image, please retake the photo",
                ))
            }
        };

        if slot == DocumentSlot::LicenseFront {
            if let Some(issued_on) = document.issue_date {
                check_license_seniority(issued_on, today)?;
            }
        }
        Ok(document)
    }

    /// Upload a document scan and return its URL.
    pub async fn store(
        &self,
        profile_id: Uuid,
        slot: DocumentSlot,
        image: Vec<u8>,
        at: DateTime<Utc>,
    ) -> AppResult<String> {
        let path = document_path(profile_id, slot, at);
        self.objects.put(&path, image, "image/jpeg").await
    }

    /// Upload a fleet image and return its URL.
    pub async fn store_vehicle_image(
        &self,
        file_name: &str,
        image: Vec<u8>,
        content_type: &str,
    ) -> AppResult<String> {
        self.check_size(&image)?;
        let path = format!(
            "fleet/{}_{}",
            Utc::now().timestamp_millis(),
            sanitize_file_name(file_name)
        );
        self.objects.put(&path, image, content_type).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::{MockDocumentAnalyzer, MockObjectStore};
    use chrono::TimeZone;

    fn intake(analyzer: MockDocumentAnalyzer) -> DocumentIntake {
        DocumentIntake::new(Arc::new(analyzer), Arc::new(MockObjectStore::new()), 1024)
    }

    #[test]
    fn test_decode_plain_and_data_url() {
        assert_eq!(decode_image("aGVsbG8=").unwrap(), b"hello");
        assert_eq!(
            decode_image("data:image/jpeg;base64,aGVs\nbG8=").unwrap(),
            b"hello"
        );
        assert!(decode_image("not base64!").is_err());
    }

    #[test]
    fn test_paths() {
        let id = Uuid::nil();
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            document_path(id, DocumentSlot::LicenseFront, at),
            format!("{}/license-front_{}.jpg", id, at.timestamp_millis())
        );
        assert_eq!(sanitize_file_name("Range Rover (2).png"), "Range_Rover__2_.png");
        assert_eq!(sanitize_file_name("///"), "image");
    }

    #[tokio::test]
    async fn test_size_limits_checked_before_analysis() {
        let mut analyzer = MockDocumentAnalyzer::new();
        analyzer.expect_analyze().never();
        let intake = intake(analyzer);
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        let empty = intake.analyze(DocumentSlot::IdFront, &[], today).await;
        assert!(matches!(empty, Err(AppError::Validation(_))));

        let huge = intake.analyze(DocumentSlot::IdFront, &[0u8; 2048], today).await;
        assert!(matches!(huge, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_no_document_is_a_validation_error() {
        let mut analyzer = MockDocumentAnalyzer::new();
        analyzer
            .expect_analyze()
            .returning(|_| Ok(AnalysisOutcome::NoDocument));
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        let result = intake(analyzer)
            .analyze(DocumentSlot::Passport, b"jpeg", today)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_seniority_applies_to_license_front_only() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let recent = NaiveDate::from_ymd_opt(2024, 5, 1);
        let mut analyzer = MockDocumentAnalyzer::new();
        analyzer.expect_analyze().returning(move |_| {
            Ok(AnalysisOutcome::Found(AnalyzedDocument {
                issue_date: recent,
                ..Default::default()
            }))
        });
        let intake = intake(analyzer);

        let front = intake.analyze(DocumentSlot::LicenseFront, b"jpeg", today).await;
        assert!(matches!(front, Err(AppError::Seniority { .. })));

        let back = intake.analyze(DocumentSlot::LicenseBack, b"jpeg", today).await;
        assert!(back.is_ok());
    }
}
