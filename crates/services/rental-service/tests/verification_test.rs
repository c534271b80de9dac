//! Identity gate tests: document intake, submission and admin review.

mod support;

use chrono::{Months, NaiveDate, Utc};
use tokio_test::assert_ok;

use common::AppError;
use domain::{AnalysisOutcome, DocumentSlot, Origin, ReviewDecision, VerificationStatus};
use rental_service_lib::repository::RentalStore;
use rental_service_lib::service::{ServiceContainer, Submission};

use support::{found, request, Harness};

const DOMESTIC: [DocumentSlot; 4] = [
    DocumentSlot::IdFront,
    DocumentSlot::IdBack,
    DocumentSlot::LicenseFront,
    DocumentSlot::LicenseBack,
];

fn domestic() -> Submission {
    Submission {
        origin: Origin::Domestic,
        flight_number: None,
        booking_id: None,
    }
}

#[tokio::test]
async fn test_domestic_submission_then_approval() {
    let h = Harness::new().await;
    let client = h.client(VerificationStatus::Registered).await;
    let gate = h.services.verification();
    h.analyzer.set(found(NaiveDate::from_ymd_opt(2015, 9, 1)));

    for slot in DOMESTIC {
        let profile = gate
            .submit_document(client, client.profile_id, slot, b"jpeg".to_vec())
            .await
            .unwrap();
        assert_eq!(profile.status, VerificationStatus::Registered);
        assert!(profile.documents.get(slot).is_some());
    }

    let stored = h.store.find_profile(client.profile_id).await.unwrap().unwrap();
    assert_eq!(stored.extracted.full_name.as_deref(), Some("YASMINE BENALI"));
    assert_eq!(stored.extracted.license_issue_date, NaiveDate::from_ymd_opt(2015, 9, 1));
    assert_eq!(h.objects.paths.lock().unwrap().len(), 4);

    let pending = gate
        .finalize_submission(client, client.profile_id, domestic())
        .await
        .unwrap();
    assert_eq!(pending.status, VerificationStatus::Pending);
    assert!(!gate.can_initiate_booking(client, client.profile_id).await.unwrap());

    let mail = h.wait_for_mail(1).await;
    assert_eq!(mail[0].template, "submission-received");

    let verified = gate
        .review_decision(h.admin, client.profile_id, ReviewDecision::Approve)
        .await
        .unwrap();
    assert_eq!(verified.status, VerificationStatus::Verified);
    assert!(gate.can_initiate_booking(client, client.profile_id).await.unwrap());

    assert_ok!(
        h.services
            .bookings()
            .create_booking(client, client.profile_id, request(None))
            .await
    );
}

#[tokio::test]
async fn test_missing_documents_keep_profile_registered() {
    let h = Harness::new().await;
    let client = h.client(VerificationStatus::Registered).await;
    let gate = h.services.verification();

    gate.submit_document(client, client.profile_id, DocumentSlot::LicenseFront, b"jpeg".to_vec())
        .await
        .unwrap();

    let result = gate
        .finalize_submission(client, client.profile_id, domestic())
        .await;
    match result {
        Err(AppError::Validation(msg)) => {
            assert!(msg.contains("id-front"));
            assert!(msg.contains("license-back"));
        }
        other => panic!("expected a validation error, got {:?}", other),
    }

    let stored = h.store.find_profile(client.profile_id).await.unwrap().unwrap();
    assert_eq!(stored.status, VerificationStatus::Registered);
    assert!(h.sent_mail().is_empty());
}

#[tokio::test]
async fn test_recent_license_is_refused_before_upload() {
    let h = Harness::new().await;
    let client = h.client(VerificationStatus::Registered).await;
    let issued = Utc::now()
        .date_naive()
        .checked_sub_months(Months::new(13))
        .unwrap();
    h.analyzer.set(found(Some(issued)));

    let result = h
        .services
        .verification()
        .submit_document(client, client.profile_id, DocumentSlot::LicenseFront, b"jpeg".to_vec())
        .await;
    assert!(matches!(result, Err(AppError::Seniority { .. })));

    assert!(h.objects.paths.lock().unwrap().is_empty());
    let stored = h.store.find_profile(client.profile_id).await.unwrap().unwrap();
    assert_eq!(stored.documents.license_front_url, None);
    assert_eq!(stored.extracted.license_issue_date, None);
}

#[tokio::test]
async fn test_unreadable_image_is_a_validation_error() {
    let h = Harness::new().await;
    let client = h.client(VerificationStatus::Registered).await;
    h.analyzer.set(AnalysisOutcome::NoDocument);

    let result = h
        .services
        .verification()
        .submit_document(client, client.profile_id, DocumentSlot::Passport, b"blur".to_vec())
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(h.objects.paths.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_foreign_submission_needs_flight_and_writes_it_to_booking() {
    let h = Harness::new().await;
    let client = h.client(VerificationStatus::Registered).await;
    let vehicle = h.vehicle("12000-A-7").await;
    let gate = h.services.verification();

    for slot in [
        DocumentSlot::Passport,
        DocumentSlot::LicenseFront,
        DocumentSlot::LicenseBack,
    ] {
        gate.submit_document(client, client.profile_id, slot, b"jpeg".to_vec())
            .await
            .unwrap();
    }

    // Unverified clients cannot book themselves; an admin opens the request.
    let booking = h
        .services
        .bookings()
        .create_booking(h.admin, client.profile_id, request(Some(vehicle.id)))
        .await
        .unwrap();

    let without_flight = gate
        .finalize_submission(
            client,
            client.profile_id,
            Submission {
                origin: Origin::Foreign,
                flight_number: None,
                booking_id: Some(booking.id),
            },
        )
        .await;
    assert!(matches!(without_flight, Err(AppError::Validation(_))));

    let pending = gate
        .finalize_submission(
            client,
            client.profile_id,
            Submission {
                origin: Origin::Foreign,
                flight_number: Some("tb 3401".to_string()),
                booking_id: Some(booking.id),
            },
        )
        .await
        .unwrap();
    assert_eq!(pending.status, VerificationStatus::Pending);

    let stored = h.store.find_booking(booking.id).await.unwrap().unwrap();
    assert_eq!(stored.flight_number.as_deref(), Some("TB3401"));

    let mail = h.wait_for_mail(1).await;
    assert!(mail[0].text.contains("Dacia Duster"));
}

#[tokio::test]
async fn test_review_outcomes_and_resubmission() {
    let h = Harness::new().await;
    let client = h.client(VerificationStatus::Pending).await;
    let gate = h.services.verification();

    let denied = gate
        .review_decision(h.admin, client.profile_id, ReviewDecision::Deny)
        .await
        .unwrap();
    assert_eq!(denied.status, VerificationStatus::Rejected);

    let again = gate
        .review_decision(h.admin, client.profile_id, ReviewDecision::Approve)
        .await;
    assert!(matches!(again, Err(AppError::Conflict(_))));

    for slot in DOMESTIC {
        gate.submit_document(client, client.profile_id, slot, b"jpeg".to_vec())
            .await
            .unwrap();
    }
    let resubmitted = gate
        .finalize_submission(client, client.profile_id, domestic())
        .await
        .unwrap();
    assert_eq!(resubmitted.status, VerificationStatus::Pending);

    let invited = gate
        .review_decision(h.admin, client.profile_id, ReviewDecision::Reject)
        .await
        .unwrap();
    assert_eq!(invited.status, VerificationStatus::Registered);
}

#[tokio::test]
async fn test_revoke_and_admin_only_review() {
    let h = Harness::new().await;
    let client = h.client(VerificationStatus::Verified).await;
    let gate = h.services.verification();

    let self_review = gate
        .review_decision(client, client.profile_id, ReviewDecision::Approve)
        .await;
    assert!(matches!(self_review, Err(AppError::Forbidden(_))));

    let revoked = gate
        .revoke_verification(h.admin, client.profile_id)
        .await
        .unwrap();
    assert_eq!(revoked.status, VerificationStatus::Registered);

    let twice = gate.revoke_verification(h.admin, client.profile_id).await;
    assert!(matches!(twice, Err(AppError::Conflict(_))));
}
