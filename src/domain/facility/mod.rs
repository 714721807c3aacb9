//! Facility aggregate: parkings, zones and spaces
//!
//! Reference data managed elsewhere; the lifecycle engine only reads it
//! and drives space occupancy.

pub mod model;
pub mod repository;

pub use model::{Parking, RecordStatus, Space, SpaceEvent, SpaceStatus, Zone};
pub use repository::FacilityRepository;
