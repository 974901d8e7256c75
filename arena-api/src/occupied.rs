use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use arena_core::{ClaimedItem, ItemKind};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use arena_shared::models::events::ReservationClaimedEvent;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupiedQuery {
    #[serde(default)]
    pub event_id: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct OccupiedEntry {
    pub numero: String,
    pub category: String,
}

#[derive(Debug, Serialize, Default, PartialEq)]
pub struct OccupiedResponse {
    pub suites: Vec<OccupiedEntry>,
    pub mesas: Vec<OccupiedEntry>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ClaimedPush {
    pub numero: String,
    pub category: String,
    pub kind: String,
}

impl From<Vec<ClaimedItem>> for OccupiedResponse {
    fn from(items: Vec<ClaimedItem>) -> Self {
        let mut response = OccupiedResponse::default();
        for item in items {
            let entry = OccupiedEntry {
                numero: item.item_id,
                category: item.category,
            };
            match item.kind {
                ItemKind::Suite => response.suites.push(entry),
                ItemKind::Table => response.mesas.push(entry),
            }
        }
        response
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/occupied", get(list_occupied))
        .route("/api/occupied/stream", get(stream_occupied))
}

/// GET /api/occupied?eventId=...
/// A store outage reads as "nothing sold"; the claim itself stays authoritative.
async fn list_occupied(
    State(state): State<AppState>,
    query: Result<Query<OccupiedQuery>, QueryRejection>,
) -> Result<Json<OccupiedResponse>, AppError> {
    let Query(query) = query?;
    let event_id = query.event_id.trim();
    if event_id.is_empty() {
        return Err(AppError::ValidationError("Missing eventId".to_string()));
    }

    match state.store.list_claimed(event_id).await {
        Ok(items) => Ok(Json(items.into())),
        Err(e) => {
            tracing::warn!("Availability read failed for {}: {}", event_id, e);
            Ok(Json(OccupiedResponse::default()))
        }
    }
}

/// GET /api/occupied/stream?eventId=...
async fn stream_occupied(
    State(state): State<AppState>,
    query: Result<Query<OccupiedQuery>, QueryRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let Query(query) = query?;
    let event_id = query.event_id.trim().to_string();
    if event_id.is_empty() {
        return Err(AppError::ValidationError("Missing eventId".to_string()));
    }

    let stream = claimed_pushes(state.sse_tx.subscribe(), event_id).filter_map(|push| async move {
        let data = serde_json::to_string(&push).ok()?;
        Some(Ok(Event::default().event("claimed").data(data)))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Claims for `event_id` only. Lagged receivers skip what they missed.
pub fn claimed_pushes(
    rx: broadcast::Receiver<ReservationClaimedEvent>,
    event_id: String,
) -> impl Stream<Item = ClaimedPush> {
    BroadcastStream::new(rx).filter_map(move |result| {
        let event_id = event_id.clone();
        async move {
            let claimed = result.ok()?;
            if claimed.event_id != event_id {
                return None;
            }
            Some(ClaimedPush {
                numero: claimed.item_id,
                category: claimed.category,
                kind: claimed.kind,
            })
        }
    })
}
