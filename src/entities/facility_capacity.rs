use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Room category a capacity record counts, stored as its integer code.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
#[serde(try_from = "i32", into = "i32")]
pub enum RoomType {
    #[sea_orm(num_value = 0)]
    #[strum(serialize = "Total")]
    Total,
    #[sea_orm(num_value = 1)]
    #[strum(serialize = "General Bed")]
    GeneralBed,
    #[sea_orm(num_value = 2)]
    #[strum(serialize = "Hostel")]
    Hostel,
    #[sea_orm(num_value = 3)]
    #[strum(serialize = "Single Room with Attached Bathroom")]
    SingleRoomWithBathroom,
    #[sea_orm(num_value = 10)]
    #[strum(serialize = "ICU")]
    Icu,
    #[sea_orm(num_value = 20)]
    #[strum(serialize = "Ventilator")]
    Ventilator,
    #[sea_orm(num_value = 30)]
    #[strum(serialize = "Covid Beds")]
    CovidBed,
    #[sea_orm(num_value = 100)]
    #[strum(serialize = "Covid Ventilators")]
    CovidVentilator,
    #[sea_orm(num_value = 110)]
    #[strum(serialize = "Covid ICU")]
    CovidIcu,
    #[sea_orm(num_value = 120)]
    #[strum(serialize = "Covid Oxygen beds")]
    CovidOxygenBed,
    #[sea_orm(num_value = 150)]
    #[strum(serialize = "Oxygen beds")]
    OxygenBed,
}

impl TryFrom<i32> for RoomType {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::try_from_value(&code).map_err(|_| format!("unknown room type code {}", code))
    }
}

impl From<RoomType> for i32 {
    fn from(value: RoomType) -> Self {
        value.to_value()
    }
}

/// The `facility_capacities` table. One row per (facility, room type).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "facility_capacities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub facility_id: Uuid,
    pub room_type: RoomType,
    pub total_capacity: i32,
    pub current_usage: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::facility::Entity",
        from = "Column::FacilityId",
        to = "super::facility::Column::Id",
        on_delete = "Cascade"
    )]
    Facility,
}

impl Related<super::facility::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Facility.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            if let ActiveValue::NotSet = active_model.created_at {
                active_model.created_at = Set(now);
            }
        }
        active_model.updated_at = Set(now);

        Ok(active_model)
    }
}
