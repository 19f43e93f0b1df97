use std::sync::Arc;

use facility_registry::{
    db::{self, DbConfig, DbPool},
    entities::{FacilityType, RoomType},
    services::facilities::{CapacityInput, FacilityService, GeoPoint, UpsertFacilityInput},
};

/// Helper harness backed by a private in-memory SQLite database.
pub struct TestDb {
    pub db: Arc<DbPool>,
}

impl TestDb {
    /// Construct a fresh, fully migrated database.
    pub async fn new() -> Self {
        let pool = db::establish_connection_with_config(&DbConfig::in_memory_sqlite())
            .await
            .expect("failed to open in-memory database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations");

        Self { db: Arc::new(pool) }
    }

    pub fn service(&self) -> FacilityService {
        FacilityService::new(self.db.clone())
    }
}

/// A complete, valid payload for a facility in `district_id`.
pub fn facility_payload(name: &str, district_id: i64) -> UpsertFacilityInput {
    UpsertFacilityInput {
        name: name.to_string(),
        district_id,
        local_body_id: Some(11),
        state_id: Some(1),
        facility_type: FacilityType::PrivateHospital,
        address: "1 Main Road".to_string(),
        location: Some(GeoPoint {
            latitude: 8.52,
            longitude: 76.94,
        }),
        oxygen_capacity: 40,
        phone_number: "0471123456".to_string(),
        capacity: Vec::new(),
    }
}

pub fn capacity(room_type: RoomType, total_capacity: i32, current_usage: i32) -> CapacityInput {
    CapacityInput {
        room_type,
        total_capacity,
        current_usage,
    }
}
