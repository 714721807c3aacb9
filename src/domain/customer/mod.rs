//! Customer and vehicle identity

pub mod model;
pub mod repository;

pub use model::{normalize_plate, ContactInfo, Customer, DocumentRef, Vehicle};
pub use repository::CustomerRepository;
