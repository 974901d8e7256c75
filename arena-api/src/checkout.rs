use axum::{
    extract::{rejection::JsonRejection, Json, State},
    routing::post,
    Router,
};
use arena_booking::CheckoutRequest;
use arena_core::ItemKind;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use crate::error::AppError;
use crate::state::AppState;

/// Body posted by the storefront page.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutBody {
    #[serde(default, alias = "suiteNumber", deserialize_with = "lenient_id")]
    pub item_id: Option<String>,
    #[serde(default)]
    pub is_table: bool,
    #[serde(default)]
    pub event_id: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub table_number: Option<String>,
    #[serde(default)]
    pub price_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateCheckoutResponse {
    pub url: String,
}

/// Item numbers arrive as strings or bare numbers.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl CreateCheckoutBody {
    pub fn into_request(self) -> Result<CheckoutRequest, AppError> {
        let kind = if self.is_table { ItemKind::Table } else { ItemKind::Suite };
        let item_id = match kind {
            ItemKind::Table => self.table_number.or(self.item_id),
            ItemKind::Suite => self.item_id,
        }
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::ValidationError("Missing item number".to_string()))?;

        if self.event_id.trim().is_empty() {
            return Err(AppError::ValidationError("Missing eventId".to_string()));
        }

        Ok(CheckoutRequest {
            item_id: item_id.trim().to_string(),
            event_id: self.event_id.trim().to_string(),
            category: self.category,
            kind,
            price_reference: self.price_id,
        })
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/create-checkout-session", post(create_checkout_session))
}

async fn create_checkout_session(
    State(state): State<AppState>,
    body: Result<Json<CreateCheckoutBody>, JsonRejection>,
) -> Result<Json<CreateCheckoutResponse>, AppError> {
    let Json(body) = body?;
    let request = body.into_request()?;
    let session = state.initiator.initiate(&request).await?;
    Ok(Json(CreateCheckoutResponse { url: session.url }))
}
