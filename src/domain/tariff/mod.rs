//! Tariff aggregate
//!
//! Shifts (recurring time-of-day windows), rates and the per-parking
//! shift → rate assignments, plus the pure clock-walking partition used
//! by the tariff resolver.

pub mod model;
pub mod partition;
pub mod repository;

pub use model::{AssignedRate, RoundingPolicy, Shift, TariffLine, TariffQuote};
pub use partition::{partition_stay, ShiftSegment, UncoveredInstant};
pub use repository::TariffRepository;
