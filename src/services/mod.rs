// Facility records and their per-room-type capacities
pub mod facilities;

pub use facilities::{FacilityDetail, FacilityService, UpsertOutcome, UpsertResult};
