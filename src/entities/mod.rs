pub mod facility;
pub mod facility_capacity;

pub use facility::{Entity as Facility, FacilityType, Model as FacilityModel};
pub use facility_capacity::{
    Entity as FacilityCapacity, Model as FacilityCapacityModel, RoomType,
};
