//! Facility Registry Library
//!
//! Create-or-merge writes for healthcare facility records, keyed by
//! case-insensitive name within a district, with ownership checks and
//! per-room-type capacity reconciliation.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod services;

pub use auth::Actor;
pub use errors::ServiceError;
pub use services::facilities::{
    CapacityInput, FacilityService, GeoPoint, UpsertFacilityInput, UpsertOutcome,
};
