//! Booking engine workflow tests against the in-memory store.

mod support;

use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

use common::AppError;
use domain::{BookingStatus, BookingView, VehicleStatus, VerificationStatus};
use rental_service_lib::repository::{Fault, RentalStore};
use rental_service_lib::service::ServiceContainer;

use support::{request, Harness};

#[tokio::test]
async fn test_create_booking_is_pending_and_active() {
    let h = Harness::new().await;
    let client = h.client(VerificationStatus::Verified).await;

    let booking = h
        .services
        .bookings()
        .create_booking(client, client.profile_id, request(None))
        .await
        .unwrap();

    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.vehicle_id, None);
    assert_ne!(booking.pickup_location, "AHU");

    let active = h
        .services
        .bookings()
        .list_bookings(client, BookingView::Active)
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, booking.id);
}

#[tokio::test]
async fn test_verification_gate_on_create() {
    let h = Harness::new().await;
    let client = h.client(VerificationStatus::Pending).await;

    let result = h
        .services
        .bookings()
        .create_booking(client, client.profile_id, request(None))
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    // Admins may book on behalf of any client.
    let booking = h
        .services
        .bookings()
        .create_booking(h.admin, client.profile_id, request(None))
        .await;
    assert_ok!(booking);
}

#[tokio::test]
async fn test_revocation_before_insert_blocks_booking() {
    let h = Harness::new().await;
    let client = h.client(VerificationStatus::Verified).await;
    h.store.arm_fault(Fault::RevokeBeforeLock).await;

    let result = h
        .services
        .bookings()
        .create_booking(client, client.profile_id, request(None))
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let stored = h.store.list_bookings(Some(client.profile_id)).await.unwrap();
    assert!(stored.is_empty());
}

#[tokio::test]
async fn test_create_rejects_bad_input() {
    let h = Harness::new().await;
    let client = h.client(VerificationStatus::Verified).await;

    let mut negative = request(None);
    negative.total_price = -1;
    let result = h
        .services
        .bookings()
        .create_booking(client, client.profile_id, negative)
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let result = h
        .services
        .bookings()
        .create_booking(h.admin, Uuid::new_v4(), request(None))
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let result = h
        .services
        .bookings()
        .create_booking(client, client.profile_id, request(Some(Uuid::new_v4())))
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_confirm_and_return_cycle() {
    let h = Harness::new().await;
    let client = h.client(VerificationStatus::Verified).await;
    let vehicle = h.vehicle("11111-A-1").await;
    let bookings = h.services.bookings();

    let booking = bookings
        .create_booking(client, client.profile_id, request(Some(vehicle.id)))
        .await
        .unwrap();

    let confirmed = bookings
        .assign_and_confirm(h.admin, booking.id, vehicle.id)
        .await
        .unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert_eq!(confirmed.vehicle_id, Some(vehicle.id));

    let rented = h.store.find_vehicle(vehicle.id).await.unwrap().unwrap();
    assert_eq!(rented.status, VehicleStatus::Rented);
    assert_eq!(rented.assigned_profile_id, Some(client.profile_id));

    let mail = h.wait_for_mail(1).await;
    assert_eq!(mail.len(), 1);
    assert_eq!(mail[0].template, "booking-confirmed");
    assert_eq!(mail[0].locale, "en");
    assert!(mail[0].text.contains("11111-A-1"));

    let completed = bookings
        .complete_return(h.admin, booking.id, Some("Returned with a full tank".to_string()))
        .await
        .unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);
    assert_eq!(completed.vehicle_id, None);
    assert_eq!(completed.returned_vehicle_id, Some(vehicle.id));

    let released = h.store.find_vehicle(vehicle.id).await.unwrap().unwrap();
    assert_eq!(released.status, VehicleStatus::Available);
    assert_eq!(released.assigned_profile_id, None);

    let profile = h.store.find_profile(client.profile_id).await.unwrap().unwrap();
    assert_eq!(profile.rental_history.len(), 1);
    assert_eq!(profile.rental_history[0].note, "Returned with a full tank");
    assert_eq!(profile.rental_history[0].author_id, h.admin.profile_id);

    let active = bookings
        .list_bookings(h.admin, BookingView::Active)
        .await
        .unwrap();
    assert!(active.is_empty());
    let archived = bookings
        .list_bookings(h.admin, BookingView::Archived)
        .await
        .unwrap();
    assert_eq!(archived.len(), 1);
}

#[tokio::test]
async fn test_confirm_unavailable_vehicle_leaves_booking_pending() {
    let h = Harness::new().await;
    let client = h.client(VerificationStatus::Verified).await;
    let mut vehicle = h.vehicle("22222-B-2").await;
    vehicle.status = VehicleStatus::Maintenance;
    h.store.seed_vehicle(vehicle.clone()).await;

    let booking = h
        .services
        .bookings()
        .create_booking(client, client.profile_id, request(None))
        .await
        .unwrap();

    let result = h
        .services
        .bookings()
        .assign_and_confirm(h.admin, booking.id, vehicle.id)
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let unchanged = h.store.find_booking(booking.id).await.unwrap().unwrap();
    assert_eq!(unchanged.status, BookingStatus::Pending);
    assert_eq!(unchanged.vehicle_id, None);
    assert!(h.sent_mail().is_empty());
}

#[tokio::test]
async fn test_lost_vehicle_write_rolls_back_confirmation() {
    let h = Harness::new().await;
    let client = h.client(VerificationStatus::Verified).await;
    let vehicle = h.vehicle("33333-C-3").await;

    let booking = h
        .services
        .bookings()
        .create_booking(client, client.profile_id, request(None))
        .await
        .unwrap();

    h.store.arm_fault(Fault::OccupyVehicle).await;
    let result = h
        .services
        .bookings()
        .assign_and_confirm(h.admin, booking.id, vehicle.id)
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let booking = h.store.find_booking(booking.id).await.unwrap().unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.vehicle_id, None);
    let vehicle = h.store.find_vehicle(vehicle.id).await.unwrap().unwrap();
    assert_eq!(vehicle.status, VehicleStatus::Available);
}

#[tokio::test]
async fn test_commit_failure_leaves_no_trace() {
    let h = Harness::new().await;
    let client = h.client(VerificationStatus::Verified).await;
    let vehicle = h.vehicle("44444-D-4").await;

    let booking = h
        .services
        .bookings()
        .create_booking(client, client.profile_id, request(None))
        .await
        .unwrap();

    h.store.arm_fault(Fault::Commit).await;
    let result = h
        .services
        .bookings()
        .assign_and_confirm(h.admin, booking.id, vehicle.id)
        .await;
    assert!(matches!(result, Err(AppError::Internal(_))));

    let booking = h.store.find_booking(booking.id).await.unwrap().unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
    let vehicle = h.store.find_vehicle(vehicle.id).await.unwrap().unwrap();
    assert_eq!(vehicle.status, VehicleStatus::Available);
}

#[tokio::test]
async fn test_concurrent_assignments_have_one_winner() {
    let h = Harness::new().await;
    let first = h.client(VerificationStatus::Verified).await;
    let second = h.client(VerificationStatus::Verified).await;
    let vehicle = h.vehicle("55555-E-5").await;
    let bookings = h.services.bookings();

    let a = bookings
        .create_booking(first, first.profile_id, request(None))
        .await
        .unwrap();
    let b = bookings
        .create_booking(second, second.profile_id, request(None))
        .await
        .unwrap();

    let (ra, rb) = tokio::join!(
        bookings.assign_and_confirm(h.admin, a.id, vehicle.id),
        bookings.assign_and_confirm(h.admin, b.id, vehicle.id),
    );

    let winners = [&ra, &rb].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    let loser = if ra.is_ok() { rb } else { ra };
    assert!(matches!(loser, Err(AppError::Conflict(_))));

    let confirmed: Vec<_> = bookings
        .list_bookings(h.admin, BookingView::Active)
        .await
        .unwrap()
        .into_iter()
        .filter(|b| b.status == BookingStatus::Confirmed)
        .collect();
    assert_eq!(confirmed.len(), 1);

    let rented = h.store.find_vehicle(vehicle.id).await.unwrap().unwrap();
    assert_eq!(rented.status, VehicleStatus::Rented);
    assert_eq!(rented.assigned_profile_id, Some(confirmed[0].profile_id));
}

#[tokio::test]
async fn test_concurrent_vehicles_for_one_booking_have_one_winner() {
    let h = Harness::new().await;
    let client = h.client(VerificationStatus::Verified).await;
    let first = h.vehicle("55555-E-6").await;
    let second = h.vehicle("55555-E-7").await;
    let bookings = h.services.bookings();

    let booking = bookings
        .create_booking(client, client.profile_id, request(None))
        .await
        .unwrap();

    let (r1, r2) = tokio::join!(
        bookings.assign_and_confirm(h.admin, booking.id, first.id),
        bookings.assign_and_confirm(h.admin, booking.id, second.id),
    );

    let winners = [&r1, &r2].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    let (winner, loser) = if r1.is_ok() {
        (first.id, r2)
    } else {
        (second.id, r1)
    };
    assert!(matches!(loser, Err(AppError::Conflict(_))));

    let confirmed = h.store.find_booking(booking.id).await.unwrap().unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert_eq!(confirmed.vehicle_id, Some(winner));

    for id in [first.id, second.id] {
        let vehicle = h.store.find_vehicle(id).await.unwrap().unwrap();
        if id == winner {
            assert_eq!(vehicle.status, VehicleStatus::Rented);
            assert_eq!(vehicle.assigned_profile_id, Some(client.profile_id));
        } else {
            assert_eq!(vehicle.status, VehicleStatus::Available);
            assert_eq!(vehicle.assigned_profile_id, None);
        }
    }
}

#[tokio::test]
async fn test_return_requires_confirmed() {
    let h = Harness::new().await;
    let client = h.client(VerificationStatus::Verified).await;

    let booking = h
        .services
        .bookings()
        .create_booking(client, client.profile_id, request(None))
        .await
        .unwrap();

    let result = h
        .services
        .bookings()
        .complete_return(h.admin, booking.id, None)
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_delete_confirmed_booking_releases_vehicle() {
    let h = Harness::new().await;
    let client = h.client(VerificationStatus::Verified).await;
    let vehicle = h.vehicle("66666-F-6").await;
    let bookings = h.services.bookings();

    let booking = bookings
        .create_booking(client, client.profile_id, request(None))
        .await
        .unwrap();
    bookings
        .assign_and_confirm(h.admin, booking.id, vehicle.id)
        .await
        .unwrap();

    assert_ok!(bookings.delete_booking(h.admin, booking.id).await);

    assert!(h.store.find_booking(booking.id).await.unwrap().is_none());
    let vehicle = h.store.find_vehicle(vehicle.id).await.unwrap().unwrap();
    assert_eq!(vehicle.status, VehicleStatus::Available);
    assert_eq!(vehicle.assigned_profile_id, None);

    let again = bookings.delete_booking(h.admin, booking.id).await;
    assert!(matches!(again, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_clients_cannot_run_admin_transitions() {
    let h = Harness::new().await;
    let client = h.client(VerificationStatus::Verified).await;
    let vehicle = h.vehicle("77777-G-7").await;
    let bookings = h.services.bookings();

    let booking = bookings
        .create_booking(client, client.profile_id, request(None))
        .await
        .unwrap();

    let confirm = bookings
        .assign_and_confirm(client, booking.id, vehicle.id)
        .await;
    assert!(matches!(confirm, Err(AppError::Forbidden(_))));
    assert_err!(bookings.delete_booking(client, booking.id).await);

    let stranger = h.client(VerificationStatus::Verified).await;
    let peek = bookings.get_booking(stranger, booking.id).await;
    assert!(matches!(peek, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_notification_failure_does_not_undo_confirmation() {
    let h = Harness::with_failing_mailer().await;
    let client = h.client(VerificationStatus::Verified).await;
    let vehicle = h.vehicle("88888-H-8").await;
    let bookings = h.services.bookings();

    let booking = bookings
        .create_booking(client, client.profile_id, request(None))
        .await
        .unwrap();
    let confirmed = bookings
        .assign_and_confirm(h.admin, booking.id, vehicle.id)
        .await;
    assert_ok!(confirmed);

    assert_eq!(h.wait_for_mail(1).await.len(), 1);
    let stored = h.store.find_booking(booking.id).await.unwrap().unwrap();
    assert_eq!(stored.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn test_flight_number_and_archive() {
    let h = Harness::new().await;
    let client = h.client(VerificationStatus::Verified).await;
    let vehicle = h.vehicle("99999-J-9").await;
    let bookings = h.services.bookings();

    let booking = bookings
        .create_booking(client, client.profile_id, request(None))
        .await
        .unwrap();

    let updated = bookings
        .set_flight_number(client, booking.id, "at 800".to_string())
        .await
        .unwrap();
    assert_eq!(updated.flight_number.as_deref(), Some("AT800"));

    let early = bookings.archive_booking(h.admin, booking.id).await;
    assert!(matches!(early, Err(AppError::Conflict(_))));

    bookings
        .assign_and_confirm(h.admin, booking.id, vehicle.id)
        .await
        .unwrap();
    let late = bookings
        .set_flight_number(client, booking.id, "AT801".to_string())
        .await;
    assert!(matches!(late, Err(AppError::Conflict(_))));

    bookings
        .complete_return(h.admin, booking.id, None)
        .await
        .unwrap();
    let archived = bookings.archive_booking(h.admin, booking.id).await.unwrap();
    assert!(archived.archived);

    let view = bookings
        .list_bookings(client, BookingView::Archived)
        .await
        .unwrap();
    assert_eq!(view.len(), 1);
}
