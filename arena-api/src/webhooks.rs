use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use arena_booking::Acknowledgement;
use arena_core::signature::SIGNATURE_HEADER;
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/webhook", post(handle_payment_webhook))
}

/// POST /webhook
/// Raw body is required: the signature covers the exact bytes sent.
pub async fn handle_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

    let ack = state.receiver.on_notification(&body, signature).await.map_err(|e| {
        tracing::warn!("Rejected webhook: {}", e);
        AppError::from(e)
    })?;

    match &ack {
        Acknowledgement::Claimed(key) => tracing::info!("Webhook claimed {}", key),
        other => tracing::debug!("Webhook acknowledged: {:?}", other),
    }
    Ok(StatusCode::OK)
}
