//! Database entities module

pub mod customer;
pub mod parking;
pub mod parking_transaction;
pub mod payment;
pub mod rate;
pub mod shift;
pub mod shift_rate_assignment;
pub mod space;
pub mod vehicle;
pub mod zone;

pub use customer::Entity as Customer;
pub use parking::Entity as Parking;
pub use parking_transaction::Entity as ParkingTransaction;
pub use payment::Entity as Payment;
pub use rate::Entity as Rate;
pub use shift::Entity as Shift;
pub use shift_rate_assignment::Entity as ShiftRateAssignment;
pub use space::Entity as Space;
pub use vehicle::Entity as Vehicle;
pub use zone::Entity as Zone;
