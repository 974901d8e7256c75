pub mod reservation;
pub mod repository;
pub mod payment;
pub mod notification;
pub mod signature;
pub mod webhook;

pub use reservation::{Claimant, ClaimedItem, ClaimOutcome, ItemKind, ReservationKey, ReservationRecord, ReservationStatus};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Availability store error: {0}")]
    StoreError(String),
    #[error("Payment provider error: {0}")]
    PaymentError(String),
    #[error("Notification failed: {0}")]
    NotificationError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
