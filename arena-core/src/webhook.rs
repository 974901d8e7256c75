use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::payment::CheckoutMetadata;

pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

#[derive(Debug, Deserialize)]
struct RawEvent {
    id: String,
    #[serde(rename = "type")]
    type_: String,
    data: RawEventData,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    #[serde(default)]
    object: RawSessionObject,
}

#[derive(Debug, Default, Deserialize)]
struct RawSessionObject {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    metadata: Option<HashMap<String, Value>>,
    #[serde(default)]
    customer_details: Option<CustomerDetails>,
    #[serde(default)]
    customer_email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CustomerDetails {
    #[serde(default)]
    email: Option<String>,
}

/// A payment notification whose signature has already been verified.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentEvent {
    pub id: String,
    pub event_type: String,
    pub session_id: Option<String>,
    pub metadata: HashMap<String, String>,
    pub buyer_email: Option<String>,
}

impl PaymentEvent {
    pub fn parse(payload: &[u8]) -> Result<Self, serde_json::Error> {
        let raw: RawEvent = serde_json::from_slice(payload)?;
        let object = raw.data.object;

        // metadata values are strings on the wire; tolerate numbers
        let metadata = object
            .metadata
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(k, v)| match v {
                Value::String(s) => Some((k, s)),
                Value::Number(n) => Some((k, n.to_string())),
                Value::Bool(b) => Some((k, b.to_string())),
                _ => None,
            })
            .collect();

        let buyer_email = object
            .customer_details
            .and_then(|d| d.email)
            .or(object.customer_email)
            .filter(|e| !e.trim().is_empty());

        Ok(Self {
            id: raw.id,
            event_type: raw.type_,
            session_id: object.id,
            metadata,
            buyer_email,
        })
    }

    pub fn is_checkout_completed(&self) -> bool {
        self.event_type == CHECKOUT_SESSION_COMPLETED
    }

    pub fn checkout_metadata(&self) -> Option<CheckoutMetadata> {
        CheckoutMetadata::from_map(&self.metadata)
    }
}
