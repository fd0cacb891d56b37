use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Camera binding
        .route("/camera/status", get(handlers::get_status))
        .route("/camera/bind", post(handlers::bind_camera))
        .route("/camera/lens/toggle", post(handlers::toggle_lens))
        .route(
            "/camera/displays/:display_id/rotation",
            post(handlers::rotate_display),
        )
        // Recording control
        .route("/recording/start", post(handlers::start_recording))
        .route("/recording/stop", post(handlers::stop_recording))
        .route("/recording/toggle", post(handlers::toggle_recording))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
