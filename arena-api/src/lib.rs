use axum::{
    http::{HeaderValue, Method},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod checkout;
pub mod error;
pub mod middleware;
pub mod occupied;
pub mod state;
pub mod webhooks;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let origin = state
        .allowed_origin
        .as_deref()
        .and_then(|o| HeaderValue::from_str(o).ok())
        .map(AllowOrigin::exact)
        .unwrap_or_else(AllowOrigin::any);

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .merge(checkout::routes())
        .merge(webhooks::routes())
        .merge(occupied::routes())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit_middleware,
        ))
        // wraps the limiter: 429s carry CORS headers too
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
