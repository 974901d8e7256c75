use std::sync::Arc;
use arena_booking::{CheckoutInitiator, ConfirmationReceiver};
use arena_core::repository::AvailabilityStore;
use arena_shared::models::events::ReservationClaimedEvent;
use crate::middleware::RateLimiter;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct RateLimit {
    pub limiter: Arc<dyn RateLimiter>,
    pub per_minute: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AvailabilityStore>,
    pub initiator: Arc<CheckoutInitiator>,
    pub receiver: Arc<ConfirmationReceiver>,
    pub sse_tx: broadcast::Sender<ReservationClaimedEvent>,
    /// `None` disables rate limiting.
    pub rate_limit: Option<RateLimit>,
    pub allowed_origin: Option<String>,
}
