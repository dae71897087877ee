//! Route configuration for the vote API.

use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::{get, post, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{health_check, list_subjects, record_vote};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/subjects", get(list_subjects))
        .route("/vote", post(record_vote))
        .with_state(state)
        .layer(build_cors_layer())
        .layer(TraceLayer::new_for_http())
}

/// Any origin, `GET,POST,OPTIONS`, `Content-Type`. The layer answers every
/// OPTIONS request itself.
fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
