//! Shared fixtures: an in-memory store with recording collaborators.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{
    ActorContext, AnalysisOutcome, AnalyzedDocument, BookingRequest, NewProfile, Profile, Role,
    Transmission, Vehicle, VehicleCategory, VehicleSpec, VerificationStatus,
};
use rental_service_lib::integrations::{DocumentAnalyzer, Mailer, ObjectStore, OutboundEmail};
use rental_service_lib::repository::MemoryRentalStore;
use rental_service_lib::service::{Collaborators, Services};

pub const MAX_UPLOAD: usize = 64 * 1024;

/// Mailer that records every message, optionally failing after recording.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    pub sent: Arc<Mutex<Vec<OutboundEmail>>>,
    pub fail: bool,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutboundEmail) -> AppResult<()> {
        self.sent.lock().unwrap().push(email.clone());
        if self.fail {
            return Err(AppError::external("mail API down"));
        }
        Ok(())
    }
}

/// Analyzer returning a fixed outcome.
#[derive(Clone)]
pub struct ScriptedAnalyzer {
    pub outcome: Arc<Mutex<AnalysisOutcome>>,
}

impl ScriptedAnalyzer {
    pub fn set(&self, outcome: AnalysisOutcome) {
        *self.outcome.lock().unwrap() = outcome;
    }
}

impl Default for ScriptedAnalyzer {
    fn default() -> Self {
        Self {
            outcome: Arc::new(Mutex::new(AnalysisOutcome::Found(AnalyzedDocument::default()))),
        }
    }
}

#[async_trait]
impl DocumentAnalyzer for ScriptedAnalyzer {
    async fn analyze(&self, _image: &[u8]) -> AppResult<AnalysisOutcome> {
        Ok(self.outcome.lock().unwrap().clone())
    }
}

/// Object store that records paths and returns fake URLs.
#[derive(Clone, Default)]
pub struct RecordingObjectStore {
    pub paths: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ObjectStore for RecordingObjectStore {
    async fn put(&self, path: &str, _bytes: Vec<u8>, _content_type: &str) -> AppResult<String> {
        self.paths.lock().unwrap().push(path.to_string());
        Ok(format!("https://files.test/{}", path))
    }
}

pub struct Harness {
    pub store: MemoryRentalStore,
    pub services: Services,
    pub mailer: RecordingMailer,
    pub analyzer: ScriptedAnalyzer,
    pub objects: RecordingObjectStore,
    pub admin: ActorContext,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_mailer(RecordingMailer::default()).await
    }

    pub async fn with_failing_mailer() -> Self {
        Self::with_mailer(RecordingMailer {
            fail: true,
            ..Default::default()
        })
        .await
    }

    async fn with_mailer(mailer: RecordingMailer) -> Self {
        let store = MemoryRentalStore::new();
        let analyzer = ScriptedAnalyzer::default();
        let objects = RecordingObjectStore::default();
        let services = Services::new(
            Arc::new(store.clone()),
            Collaborators {
                analyzer: Arc::new(analyzer.clone()),
                objects: Arc::new(objects.clone()),
                mailer: Arc::new(mailer.clone()),
            },
            MAX_UPLOAD,
        );

        let admin_profile = profile_with(VerificationStatus::Registered, Role::Admin);
        let admin = ActorContext::admin(admin_profile.id);
        store.seed_profile(admin_profile).await;

        Self {
            store,
            services,
            mailer,
            analyzer,
            objects,
            admin,
        }
    }

    /// Seed a client profile in `status` and return its actor.
    pub async fn client(&self, status: VerificationStatus) -> ActorContext {
        let profile = profile_with(status, Role::Client);
        let actor = ActorContext::client(profile.id);
        self.store.seed_profile(profile).await;
        actor
    }

    /// Seed an available vehicle.
    pub async fn vehicle(&self, plate: &str) -> Vehicle {
        let vehicle = Vehicle::from_spec(Uuid::new_v4(), spec(plate, 300, 450));
        self.store.seed_vehicle(vehicle.clone()).await;
        vehicle
    }

    pub fn sent_mail(&self) -> Vec<OutboundEmail> {
        self.mailer.sent.lock().unwrap().clone()
    }

    /// Wait until `count` messages were handed to the mailer.
    pub async fn wait_for_mail(&self, count: usize) -> Vec<OutboundEmail> {
        for _ in 0..100 {
            let sent = self.sent_mail();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.sent_mail()
    }
}

pub fn profile_with(status: VerificationStatus, role: Role) -> Profile {
    let mut profile = Profile::register(
        Uuid::new_v4(),
        NewProfile {
            full_name: "Yasmine Benali".to_string(),
            email: "yasmine@example.com".to_string(),
            phone: Some("+212600000000".to_string()),
            country: Some("MA".to_string()),
            locale: Some("en".to_string()),
        },
    );
    profile.status = status;
    profile.role = role;
    profile
}

pub fn spec(plate: &str, rate_low: i64, rate_high: i64) -> VehicleSpec {
    VehicleSpec {
        make: "Dacia".to_string(),
        model: "Duster".to_string(),
        plate: plate.to_string(),
        category: VehicleCategory::try_from("SUV".to_string()).unwrap(),
        rate_low,
        rate_high,
        seats: 5,
        doors: 5,
        air_conditioning: true,
        transmission: Transmission::Manual,
        mileage_policy: "unlimited".to_string(),
        image_url: None,
        gallery: Vec::new(),
    }
}

pub fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
}

pub fn request(requested_vehicle_id: Option<Uuid>) -> BookingRequest {
    BookingRequest {
        pickup_location: "AHU".to_string(),
        return_location: "Tanger centre".to_string(),
        pickup_at: at(2025, 3, 1),
        return_at: at(2025, 3, 4),
        total_price: 900,
        requested_vehicle_id,
    }
}

pub fn found(issue_date: Option<NaiveDate>) -> AnalysisOutcome {
    AnalysisOutcome::Found(AnalyzedDocument {
        full_name: Some("YASMINE BENALI".to_string()),
        document_number: Some("K445566".to_string()),
        issue_date,
        ..Default::default()
    })
}
