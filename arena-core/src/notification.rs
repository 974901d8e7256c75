use async_trait::async_trait;
use serde::Serialize;

use crate::reservation::ItemKind;
use crate::CoreResult;

/// Everything the confirmation message shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservationDetails {
    pub kind: ItemKind,
    pub item_id: String,
    pub category: String,
    pub event_id: String,
    pub event_name: String,
    pub event_date: String,
    pub venue: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_confirmation(&self, to: &str, details: &ReservationDetails) -> CoreResult<()>;
}
