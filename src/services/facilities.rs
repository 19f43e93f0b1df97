use crate::{
    auth::Actor,
    db::{child_upsert::ChildModel, upsert_children_by_key, DbPool, KeyedChild},
    entities::{facility, facility_capacity, FacilityType, RoomType},
    errors::ServiceError,
};
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

/// Geographic position of a facility
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_geo_point"))]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Capacity figures for one room type of a facility
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_capacity_usage"))]
pub struct CapacityInput {
    pub room_type: RoomType,
    #[validate(range(min = 0))]
    pub total_capacity: i32,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub current_usage: i32,
}

/// Full facility payload accepted by [`FacilityService::upsert`].
///
/// Field validation is the caller's job; run
/// [`UpsertFacilityInput::validate_normalized`] before handing the payload to
/// the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct UpsertFacilityInput {
    #[validate(length(min = 1, max = 1000))]
    pub name: String,
    pub district_id: i64,
    #[serde(default)]
    pub local_body_id: Option<i64>,
    #[serde(default)]
    pub state_id: Option<i64>,
    pub facility_type: FacilityType,
    #[validate(length(min = 1, max = 1000))]
    pub address: String,
    #[serde(default)]
    #[validate]
    pub location: Option<GeoPoint>,
    #[validate(range(min = 0))]
    pub oxygen_capacity: i32,
    #[validate(length(min = 1, max = 14))]
    pub phone_number: String,
    #[serde(default)]
    #[validate]
    pub capacity: Vec<CapacityInput>,
}

impl UpsertFacilityInput {
    /// Validates the payload as it will be stored, i.e. after [`normalize`].
    /// A name of only spaces passes a plain `validate()` but not this.
    pub fn validate_normalized(&self) -> Result<(), ValidationErrors> {
        normalize(self.clone()).validate()
    }

    /// Writes every facility field carried by the payload onto `model`.
    /// `id` and `created_by` are never touched here.
    fn apply_to(&self, model: &mut facility::ActiveModel) {
        model.name = Set(self.name.clone());
        model.district_id = Set(self.district_id);
        model.local_body_id = Set(self.local_body_id);
        model.state_id = Set(self.state_id);
        model.facility_type = Set(self.facility_type);
        model.address = Set(self.address.clone());
        model.latitude = Set(self.location.map(|point| point.latitude));
        model.longitude = Set(self.location.map(|point| point.longitude));
        model.oxygen_capacity = Set(self.oxygen_capacity);
        model.phone_number = Set(self.phone_number.clone());
    }
}

fn validate_geo_point(point: &GeoPoint) -> Result<(), ValidationError> {
    if !(-90.0..=90.0).contains(&point.latitude) {
        let mut err = ValidationError::new("latitude");
        err.message = Some("Latitude must be between -90 and 90".into());
        return Err(err);
    }
    if !(-180.0..=180.0).contains(&point.longitude) {
        let mut err = ValidationError::new("longitude");
        err.message = Some("Longitude must be between -180 and 180".into());
        return Err(err);
    }
    Ok(())
}

fn validate_capacity_usage(input: &CapacityInput) -> Result<(), ValidationError> {
    if input.current_usage > input.total_capacity {
        let mut err = ValidationError::new("current_usage");
        err.message = Some("Current usage cannot exceed total capacity".into());
        return Err(err);
    }
    Ok(())
}

impl KeyedChild for CapacityInput {
    type ActiveModel = facility_capacity::ActiveModel;
    type Key = RoomType;

    fn key(&self) -> RoomType {
        self.room_type
    }

    fn stored_key(model: &ChildModel<Self>) -> RoomType {
        model.room_type
    }

    fn merge_into(self, mut model: facility_capacity::ActiveModel) -> facility_capacity::ActiveModel {
        model.total_capacity = Set(self.total_capacity);
        model.current_usage = Set(self.current_usage);
        model
    }

    fn into_child(self, facility_id: Uuid) -> facility_capacity::ActiveModel {
        facility_capacity::ActiveModel {
            id: Set(Uuid::new_v4()),
            facility_id: Set(facility_id),
            room_type: Set(self.room_type),
            total_capacity: Set(self.total_capacity),
            current_usage: Set(self.current_usage),
            ..Default::default()
        }
    }
}

/// Trims `value` and replaces each double space with a single space.
///
/// Only pairs are collapsed, in one left-to-right pass: three spaces become
/// two, four become two.
pub fn normalize_text(value: &str) -> String {
    value.trim().replace("  ", " ")
}

/// Cleans the free-text identity fields of a payload.
pub fn normalize(mut input: UpsertFacilityInput) -> UpsertFacilityInput {
    input.name = normalize_text(&input.name);
    input.phone_number = normalize_text(&input.phone_number);
    input
}

/// What an upsert will do once the matching facility (if any) is known
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertDecision {
    /// No facility has this name in this district yet
    Create,
    /// The actor may overwrite the matched facility
    Merge(facility::Model),
    /// The matched facility belongs to someone else
    Reject(String),
}

/// Resolves the create, merge or reject decision for a lookup result.
pub fn decide(existing: Option<facility::Model>, actor: &Actor) -> UpsertDecision {
    match existing {
        None => UpsertDecision::Create,
        Some(facility) if actor.can_modify(facility.created_by) => UpsertDecision::Merge(facility),
        Some(facility) => UpsertDecision::Reject(format!("{} is owned by another user", facility)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Created,
    Merged,
}

/// A facility together with all of its capacity records
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilityDetail {
    #[serde(flatten)]
    pub facility: facility::Model,
    pub capacity: Vec<facility_capacity::Model>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpsertResult {
    pub outcome: UpsertOutcome,
    #[serde(flatten)]
    pub detail: FacilityDetail,
}

/// Service owning writes to facility records and their capacities
#[derive(Clone)]
pub struct FacilityService {
    db: Arc<DbPool>,
}

impl FacilityService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Creates the facility or merges into the one with the same
    /// case-insensitive name in the same district, then reconciles its
    /// capacities by room type.
    ///
    /// Everything runs in one transaction. A rejected merge writes nothing.
    #[instrument(
        skip(self, input),
        fields(name = %input.name, district_id = input.district_id, actor = %actor.id)
    )]
    pub async fn upsert(
        &self,
        input: UpsertFacilityInput,
        actor: &Actor,
    ) -> Result<UpsertResult, ServiceError> {
        let mut input = normalize(input);
        let capacity = std::mem::take(&mut input.capacity);

        let txn = self.db.begin().await?;

        let existing = find_by_identity_on(&txn, &input.name, input.district_id).await?;

        let (outcome, facility) = match decide(existing, actor) {
            UpsertDecision::Create => {
                let mut model = facility::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    created_by: Set(actor.id),
                    ..Default::default()
                };
                input.apply_to(&mut model);
                let created = model.insert(&txn).await.map_err(ServiceError::from_write)?;
                (UpsertOutcome::Created, created)
            }
            UpsertDecision::Merge(existing) => {
                let mut model: facility::ActiveModel = existing.into();
                input.apply_to(&mut model);
                let merged = model.update(&txn).await.map_err(ServiceError::from_write)?;
                (UpsertOutcome::Merged, merged)
            }
            UpsertDecision::Reject(reason) => {
                warn!("Facility upsert rejected: {}", reason);
                txn.rollback().await?;
                return Err(ServiceError::PermissionDenied(reason));
            }
        };

        let stored = capacities_of(&txn, facility.id).await?;
        upsert_children_by_key(&txn, facility.id, stored, capacity)
            .await
            .map_err(ServiceError::from_write)?;
        let capacity = capacities_of(&txn, facility.id).await?;

        txn.commit().await.map_err(ServiceError::from_write)?;

        info!(
            facility_id = %facility.id,
            outcome = ?outcome,
            capacity_records = capacity.len(),
            "Facility upserted"
        );

        Ok(UpsertResult {
            outcome,
            detail: FacilityDetail { facility, capacity },
        })
    }

    /// Direct updates are disabled; every write goes through [`Self::upsert`].
    pub async fn update(
        &self,
        facility_id: Uuid,
        _input: UpsertFacilityInput,
        _actor: &Actor,
    ) -> Result<UpsertResult, ServiceError> {
        Err(ServiceError::NotSupported(format!(
            "facility {} cannot be updated directly; submit the record through upsert",
            facility_id
        )))
    }

    /// Gets a facility and its capacities by ID
    #[instrument(skip(self))]
    pub async fn get_facility(&self, facility_id: Uuid) -> Result<FacilityDetail, ServiceError> {
        let db = &*self.db;
        let facility = facility::Entity::find_by_id(facility_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Facility {} not found", facility_id)))?;
        let capacity = capacities_of(db, facility_id).await?;

        Ok(FacilityDetail { facility, capacity })
    }

    /// Looks up the facility an upsert with this name and district would
    /// resolve to, without writing anything.
    #[instrument(skip(self))]
    pub async fn find_by_identity(
        &self,
        name: &str,
        district_id: i64,
    ) -> Result<Option<facility::Model>, ServiceError> {
        let name = normalize_text(name);
        Ok(find_by_identity_on(&*self.db, &name, district_id).await?)
    }
}

/// Case-insensitive match on name within a district. Both sides are folded
/// by the database's `lower()`, the same function the unique index uses.
/// Several matches can only exist if the index is missing; the oldest wins.
async fn find_by_identity_on<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    district_id: i64,
) -> Result<Option<facility::Model>, DbErr> {
    facility::Entity::find()
        .filter(
            Expr::expr(Func::lower(Expr::col((
                facility::Entity,
                facility::Column::Name,
            ))))
            .eq(Func::lower(Expr::val(name))),
        )
        .filter(facility::Column::DistrictId.eq(district_id))
        .order_by_asc(facility::Column::CreatedAt)
        .order_by_asc(facility::Column::Id)
        .one(conn)
        .await
}

async fn capacities_of<C: ConnectionTrait>(
    conn: &C,
    facility_id: Uuid,
) -> Result<Vec<facility_capacity::Model>, DbErr> {
    facility_capacity::Entity::find()
        .filter(facility_capacity::Column::FacilityId.eq(facility_id))
        .order_by_asc(facility_capacity::Column::RoomType)
        .all(conn)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    fn stored_facility(created_by: Uuid) -> facility::Model {
        facility::Model {
            id: Uuid::new_v4(),
            name: "City Hospital".into(),
            district_id: 7,
            local_body_id: None,
            state_id: Some(1),
            facility_type: FacilityType::PrivateHospital,
            address: "1 Main Road".into(),
            latitude: None,
            longitude: None,
            oxygen_capacity: 10,
            phone_number: "0471123456".into(),
            created_by,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn payload() -> UpsertFacilityInput {
        UpsertFacilityInput {
            name: "City Hospital".into(),
            district_id: 7,
            local_body_id: Some(3),
            state_id: Some(1),
            facility_type: FacilityType::PrivateHospital,
            address: "1 Main Road".into(),
            location: Some(GeoPoint {
                latitude: 8.5,
                longitude: 76.9,
            }),
            oxygen_capacity: 40,
            phone_number: "0471123456".into(),
            capacity: vec![CapacityInput {
                room_type: RoomType::Icu,
                total_capacity: 10,
                current_usage: 2,
            }],
        }
    }

    #[rstest]
    #[case("City Hospital", "City Hospital")]
    #[case("  City Hospital \t", "City Hospital")]
    #[case("City  Hospital", "City Hospital")]
    #[case("City   Hospital", "City  Hospital")]
    #[case("City    Hospital", "City  Hospital")]
    #[case("", "")]
    fn normalize_text_collapses_only_double_spaces(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_text(raw), expected);
    }

    #[test]
    fn normalize_cleans_name_and_phone_only() {
        let mut input = payload();
        input.name = " City  Hospital ".into();
        input.phone_number = " 0471  123456 ".into();
        input.address = " 1  Main Road ".into();

        let cleaned = normalize(input);
        assert_eq!(cleaned.name, "City Hospital");
        assert_eq!(cleaned.phone_number, "0471 123456");
        assert_eq!(cleaned.address, " 1  Main Road ");
    }

    #[test]
    fn decide_creates_when_nothing_matches() {
        let actor = Actor::user(Uuid::new_v4());
        assert_eq!(decide(None, &actor), UpsertDecision::Create);
    }

    #[test]
    fn decide_merges_for_owner_and_superuser() {
        let owner = Uuid::new_v4();
        let existing = stored_facility(owner);

        assert_eq!(
            decide(Some(existing.clone()), &Actor::user(owner)),
            UpsertDecision::Merge(existing.clone())
        );
        assert_eq!(
            decide(Some(existing.clone()), &Actor::superuser(Uuid::new_v4())),
            UpsertDecision::Merge(existing)
        );
    }

    #[test]
    fn decide_rejects_other_users() {
        let existing = stored_facility(Uuid::new_v4());

        assert_eq!(
            decide(Some(existing), &Actor::user(Uuid::new_v4())),
            UpsertDecision::Reject("City Hospital is owned by another user".into())
        );
    }

    #[test]
    fn valid_payload_passes_validation() {
        assert!(payload().validate().is_ok());
    }

    #[rstest]
    #[case("   ", "0471123456", "name")]
    #[case("City Hospital", "  ", "phone_number")]
    fn blank_after_normalizing_is_rejected(
        #[case] name: &str,
        #[case] phone_number: &str,
        #[case] field: &str,
    ) {
        let mut input = payload();
        input.name = name.into();
        input.phone_number = phone_number.into();

        let errors = input.validate_normalized().unwrap_err();
        assert!(errors.field_errors().contains_key(field));
    }

    #[test]
    fn validate_normalized_leaves_payload_untouched() {
        let mut input = payload();
        input.name = " City   Hospital ".into();

        assert!(input.validate_normalized().is_ok());
        assert_eq!(input.name, " City   Hospital ");
    }

    #[test]
    fn usage_above_total_is_rejected() {
        let mut input = payload();
        input.capacity[0].current_usage = 11;
        assert!(input.validate().is_err());
    }

    #[test]
    fn out_of_range_location_is_rejected() {
        let mut input = payload();
        input.location = Some(GeoPoint {
            latitude: 91.0,
            longitude: 0.0,
        });
        assert!(input.validate().is_err());
    }

    #[test]
    fn negative_oxygen_capacity_is_rejected() {
        let mut input = payload();
        input.oxygen_capacity = -1;
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("oxygen_capacity"));
    }

    #[test]
    fn payload_uses_integer_codes() {
        let json = serde_json::json!({
            "name": "City Hospital",
            "district_id": 7,
            "facility_type": 2,
            "address": "1 Main Road",
            "oxygen_capacity": 0,
            "phone_number": "0471123456",
            "capacity": [{ "room_type": 10, "total_capacity": 5 }]
        });

        let input: UpsertFacilityInput = serde_json::from_value(json).unwrap();
        assert_eq!(input.facility_type, FacilityType::PrivateHospital);
        assert_eq!(input.capacity[0].room_type, RoomType::Icu);
        assert_eq!(input.capacity[0].current_usage, 0);
        assert_eq!(input.location, None);

        let unknown = serde_json::json!({ "room_type": 11, "total_capacity": 5 });
        assert!(serde_json::from_value::<CapacityInput>(unknown).is_err());
    }

    #[test]
    fn room_types_display_their_labels() {
        assert_eq!(RoomType::Icu.to_string(), "ICU");
        assert_eq!(RoomType::GeneralBed.to_string(), "General Bed");
        assert_eq!(FacilityType::GovtHospital.to_string(), "Govt Hospital");
    }
}
