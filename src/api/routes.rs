use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Feed
        .route("/feed", get(handlers::get_feed))
        .route("/feed/like", post(handlers::like))
        .route("/feed/dislike", post(handlers::dislike))
        .route("/feed/skip", post(handlers::skip))
        .route("/feed/refresh", post(handlers::refresh))
        // Session
        .route("/session/reset", post(handlers::reset_session))
        .route("/history", get(handlers::get_history))
        // Preferences
        .route("/preferences/field", put(handlers::set_field))
        .route("/preferences/history", put(handlers::set_history_visibility))
}
