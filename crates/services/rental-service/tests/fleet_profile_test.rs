//! Fleet and profile management tests.

mod support;

use tokio_test::assert_ok;
use uuid::Uuid;

use common::AppError;
use domain::{
    ActorContext, BookingStatus, ContactUpdate, NewProfile, VehicleStatus, VerificationStatus,
};
use rental_service_lib::repository::{Fault, RentalStore};
use rental_service_lib::service::ServiceContainer;

use support::{at, request, spec, Harness};

fn new_profile() -> NewProfile {
    NewProfile {
        full_name: "  Karim Tazi ".to_string(),
        email: "Karim@Example.com".to_string(),
        phone: None,
        country: Some("BE".to_string()),
        locale: Some("nl-BE".to_string()),
    }
}

#[tokio::test]
async fn test_register_once_per_account() {
    let h = Harness::new().await;
    let actor = ActorContext::client(Uuid::new_v4());
    let profiles = h.services.profiles();

    let profile = profiles.register(actor, new_profile()).await.unwrap();
    assert_eq!(profile.id, actor.profile_id);
    assert_eq!(profile.status, VerificationStatus::Registered);
    assert_eq!(profile.full_name, "Karim Tazi");
    assert_eq!(profile.email, "karim@example.com");
    assert_eq!(profile.locale, "nl");

    let again = profiles.register(actor, new_profile()).await;
    assert!(matches!(again, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_contact_update_keeps_status() {
    let h = Harness::new().await;
    let client = h.client(VerificationStatus::Verified).await;

    let updated = h
        .services
        .profiles()
        .update_contact(
            client,
            client.profile_id,
            ContactUpdate {
                phone: Some("+32470000000".to_string()),
                locale: Some("fr".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.phone.as_deref(), Some("+32470000000"));
    assert_eq!(updated.locale, "fr");
    assert_eq!(updated.status, VerificationStatus::Verified);

    let stranger = h.client(VerificationStatus::Verified).await;
    let result = h
        .services
        .profiles()
        .update_contact(stranger, client.profile_id, ContactUpdate::default())
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_admin_listing_excludes_admins() {
    let h = Harness::new().await;
    h.client(VerificationStatus::Pending).await;
    h.client(VerificationStatus::Verified).await;
    let profiles = h.services.profiles();

    let all = profiles.list_profiles(h.admin, None).await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|p| !p.is_admin()));

    let pending = profiles
        .list_profiles(h.admin, Some(VerificationStatus::Pending))
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
}

#[tokio::test]
async fn test_profile_with_live_booking_cannot_be_deleted() {
    let h = Harness::new().await;
    let client = h.client(VerificationStatus::Verified).await;
    let vehicle = h.vehicle("10101-A-1").await;
    let bookings = h.services.bookings();
    let profiles = h.services.profiles();

    let booking = bookings
        .create_booking(client, client.profile_id, request(None))
        .await
        .unwrap();
    bookings
        .assign_and_confirm(h.admin, booking.id, vehicle.id)
        .await
        .unwrap();

    let blocked = profiles.delete_profile(h.admin, client.profile_id).await;
    match blocked {
        Err(AppError::Conflict(msg)) => assert!(msg.contains("booking")),
        other => panic!("expected a conflict, got {:?}", other),
    }

    let completed = bookings
        .complete_return(h.admin, booking.id, None)
        .await
        .unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);

    assert_ok!(profiles.delete_profile(h.admin, client.profile_id).await);
    assert!(h.store.find_profile(client.profile_id).await.unwrap().is_none());
    assert!(h.store.find_booking(booking.id).await.unwrap().is_none());

    let own = profiles.delete_profile(h.admin, h.admin.profile_id).await;
    assert!(matches!(own, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_booking_placed_before_delete_locks_is_kept() {
    let h = Harness::new().await;
    let client = h.client(VerificationStatus::Verified).await;
    h.store.arm_fault(Fault::BookBeforeLock).await;

    let result = h
        .services
        .profiles()
        .delete_profile(h.admin, client.profile_id)
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    assert!(h.store.find_profile(client.profile_id).await.unwrap().is_some());
    let kept = h.store.list_bookings(Some(client.profile_id)).await.unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].status, BookingStatus::Pending);
}

#[tokio::test]
async fn test_vehicle_catalogue_rules() {
    let h = Harness::new().await;
    let fleet = h.services.fleet();

    let created = fleet
        .create_vehicle(h.admin, spec("20202-B-2", 300, 450))
        .await
        .unwrap();
    assert_eq!(created.status, VehicleStatus::Available);

    let duplicate = fleet
        .create_vehicle(h.admin, spec("20202-b-2", 250, 400))
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let inverted = fleet
        .create_vehicle(h.admin, spec("30303-C-3", 500, 400))
        .await;
    assert!(matches!(inverted, Err(AppError::Validation(_))));

    let client = h.client(VerificationStatus::Verified).await;
    let forbidden = fleet.create_vehicle(client, spec("40404-D-4", 300, 450)).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden(_))));

    let mut edited = spec("20202-B-2", 320, 480);
    edited.model = "Jogger".to_string();
    let updated = fleet
        .update_vehicle(h.admin, created.id, edited)
        .await
        .unwrap();
    assert_eq!(updated.model, "Jogger");
    assert_eq!(updated.status, VehicleStatus::Available);
}

#[tokio::test]
async fn test_rented_status_is_owned_by_bookings() {
    let h = Harness::new().await;
    let client = h.client(VerificationStatus::Verified).await;
    let vehicle = h.vehicle("50505-E-5").await;
    let fleet = h.services.fleet();

    let direct = fleet
        .set_vehicle_status(h.admin, vehicle.id, VehicleStatus::Rented)
        .await;
    assert!(matches!(direct, Err(AppError::Validation(_))));

    let parked = fleet
        .set_vehicle_status(h.admin, vehicle.id, VehicleStatus::Maintenance)
        .await
        .unwrap();
    assert_eq!(parked.status, VehicleStatus::Maintenance);
    fleet
        .set_vehicle_status(h.admin, vehicle.id, VehicleStatus::Available)
        .await
        .unwrap();

    let booking = h
        .services
        .bookings()
        .create_booking(client, client.profile_id, request(None))
        .await
        .unwrap();
    h.services
        .bookings()
        .assign_and_confirm(h.admin, booking.id, vehicle.id)
        .await
        .unwrap();

    let freed = fleet
        .set_vehicle_status(h.admin, vehicle.id, VehicleStatus::Available)
        .await;
    assert!(matches!(freed, Err(AppError::Conflict(_))));

    let deleted = fleet.delete_vehicle(h.admin, vehicle.id).await;
    assert!(matches!(deleted, Err(AppError::Conflict(_))));
    assert!(h.store.find_vehicle(vehicle.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_available_listing_and_quote() {
    let h = Harness::new().await;
    let fleet = h.services.fleet();

    let premium = fleet
        .create_vehicle(h.admin, spec("60606-F-6", 900, 1200))
        .await
        .unwrap();
    let budget = fleet
        .create_vehicle(h.admin, spec("70707-G-7", 250, 350))
        .await
        .unwrap();
    let parked = fleet
        .create_vehicle(h.admin, spec("80808-H-8", 100, 150))
        .await
        .unwrap();
    fleet
        .set_vehicle_status(h.admin, parked.id, VehicleStatus::Maintenance)
        .await
        .unwrap();

    let available = fleet.list_available().await.unwrap();
    let ids: Vec<Uuid> = available.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![budget.id, premium.id]);

    // 30 July to 2 August: every billed day is in high season.
    let quote = fleet
        .quote(budget.id, at(2025, 7, 30), at(2025, 8, 2))
        .await
        .unwrap();
    assert_eq!(quote.days, 3);
    assert_eq!(quote.total, 3 * 350);

    let quote = fleet
        .quote(budget.id, at(2025, 3, 1), at(2025, 3, 4))
        .await
        .unwrap();
    assert_eq!(quote.total, 3 * 250);

    let backwards = fleet
        .quote(budget.id, at(2025, 3, 4), at(2025, 3, 1))
        .await;
    assert!(matches!(backwards, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_vehicle_image_upload_path() {
    let h = Harness::new().await;

    let url = h
        .services
        .fleet()
        .upload_vehicle_image(
            h.admin,
            "Clio front.png".to_string(),
            b"png".to_vec(),
            "image/png".to_string(),
        )
        .await
        .unwrap();

    let paths = h.objects.paths.lock().unwrap().clone();
    assert_eq!(paths.len(), 1);
    assert!(paths[0].starts_with("fleet/"));
    assert!(paths[0].ends_with("_Clio_front.png"));
    assert!(url.ends_with(&paths[0]));
}
