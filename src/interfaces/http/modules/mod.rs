pub mod health;
pub mod metrics;
pub mod payments;
pub mod request_id;
pub mod spaces;
pub mod tariffs;
pub mod transactions;
