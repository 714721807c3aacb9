pub mod model;
pub mod repository;

pub use model::{NewPayment, Payment, PaymentPolicy, PaymentRecordStatus, RefundDetails};
pub use repository::PaymentRepository;
