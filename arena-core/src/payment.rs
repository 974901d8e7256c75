use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::reservation::{ItemKind, ReservationKey};
use crate::CoreResult;

pub const META_ITEM_ID: &str = "itemId";
pub const META_EVENT_ID: &str = "eventId";
pub const META_CATEGORY: &str = "category";
pub const META_KIND: &str = "kind";

/// Opaque round-trip data attached to a hosted session and echoed back on
/// confirmation. The provider never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutMetadata {
    pub item_id: String,
    pub event_id: String,
    pub category: String,
    pub kind: ItemKind,
}

impl CheckoutMetadata {
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            (META_ITEM_ID, self.item_id.clone()),
            (META_EVENT_ID, self.event_id.clone()),
            (META_CATEGORY, self.category.clone()),
            (META_KIND, self.kind.as_str().to_string()),
        ]
    }

    /// `None` when any field is missing, blank or the kind is unknown.
    pub fn from_map(map: &HashMap<String, String>) -> Option<Self> {
        let field = |name: &str| {
            map.get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Some(Self {
            item_id: field(META_ITEM_ID)?,
            event_id: field(META_EVENT_ID)?,
            category: field(META_CATEGORY)?,
            kind: field(META_KIND)?.parse().ok()?,
        })
    }

    pub fn reservation_key(&self) -> ReservationKey {
        ReservationKey::new(self.kind, &self.item_id, &self.event_id, &self.category)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSessionRequest {
    pub price_reference: String,
    pub metadata: CheckoutMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a hosted checkout session for one unit of `price_reference`.
    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> CoreResult<CheckoutSession>;
}
