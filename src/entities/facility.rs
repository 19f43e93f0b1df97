use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of facility, stored as its integer code.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
#[serde(try_from = "i32", into = "i32")]
pub enum FacilityType {
    #[sea_orm(num_value = 1)]
    #[strum(serialize = "Educational Inst")]
    EducationalInst,
    #[sea_orm(num_value = 2)]
    #[strum(serialize = "Private Hospital")]
    PrivateHospital,
    #[sea_orm(num_value = 3)]
    #[strum(serialize = "Other")]
    Other,
    #[sea_orm(num_value = 4)]
    #[strum(serialize = "Hostel")]
    Hostel,
    #[sea_orm(num_value = 5)]
    #[strum(serialize = "Hotel")]
    Hotel,
    #[sea_orm(num_value = 6)]
    #[strum(serialize = "Lodge")]
    Lodge,
    #[sea_orm(num_value = 7)]
    #[strum(serialize = "TeleMedicine")]
    TeleMedicine,
    #[sea_orm(num_value = 8)]
    #[strum(serialize = "Govt Hospital")]
    GovtHospital,
    #[sea_orm(num_value = 9)]
    #[strum(serialize = "Labs")]
    Labs,
    #[sea_orm(num_value = 800)]
    #[strum(serialize = "Primary Health Centres")]
    PrimaryHealthCentre,
    #[sea_orm(num_value = 801)]
    #[strum(serialize = "24x7 Public Health Centres")]
    PublicHealthCentre24x7,
    #[sea_orm(num_value = 802)]
    #[strum(serialize = "Family Health Centres")]
    FamilyHealthCentre,
    #[sea_orm(num_value = 803)]
    #[strum(serialize = "Community Health Centres")]
    CommunityHealthCentre,
    #[sea_orm(num_value = 820)]
    #[strum(serialize = "Urban Primary Health Center")]
    UrbanPrimaryHealthCenter,
    #[sea_orm(num_value = 830)]
    #[strum(serialize = "Taluk Hospitals")]
    TalukHospital,
    #[sea_orm(num_value = 831)]
    #[strum(serialize = "Taluk Headquarters Hospitals")]
    TalukHeadquartersHospital,
    #[sea_orm(num_value = 840)]
    #[strum(serialize = "Women and Child Health Centres")]
    WomenAndChildHealthCentre,
    #[sea_orm(num_value = 850)]
    #[strum(serialize = "General hospitals")]
    GeneralHospital,
    #[sea_orm(num_value = 860)]
    #[strum(serialize = "District Hospitals")]
    DistrictHospital,
    #[sea_orm(num_value = 870)]
    #[strum(serialize = "Govt Medical College Hospitals")]
    GovtMedicalCollegeHospital,
    #[sea_orm(num_value = 950)]
    #[strum(serialize = "Corona Testing Labs")]
    CoronaTestingLab,
    #[sea_orm(num_value = 1000)]
    #[strum(serialize = "Corona Care Centre")]
    CoronaCareCentre,
}

impl TryFrom<i32> for FacilityType {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::try_from_value(&code).map_err(|_| format!("unknown facility type code {}", code))
    }
}

impl From<FacilityType> for i32 {
    fn from(value: FacilityType) -> Self {
        value.to_value()
    }
}

/// The `facilities` table.
///
/// `(lower(name), district_id)` is unique at the storage level.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "facilities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub district_id: i64,
    pub local_body_id: Option<i64>,
    pub state_id: Option<i64>,
    pub facility_type: FacilityType,
    #[sea_orm(column_type = "Text")]
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub oxygen_capacity: i32,
    pub phone_number: String,
    /// Actor that first created the record. Never rewritten by a merge.
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::facility_capacity::Entity")]
    FacilityCapacity,
}

impl Related<super::facility_capacity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FacilityCapacity.def()
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

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
