//! Router configuration for the HTTP API.
//!
//! Sets up all routes, middleware (CORS, compression, tracing) and returns
//! the axum router ready for serving.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // The planner UI is served from a different origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Lesson plans
        // `{id}` is the owner id for GET and the lesson id for DELETE.
        .route(
            "/lesson-plans/{id}",
            get(handlers::list_lesson_plans).delete(handlers::delete_lesson_plan),
        )
        .route("/lesson-plans/{id}/push-tomorrow", put(handlers::push_tomorrow))
        .route("/mark-holiday", put(handlers::mark_holiday))
        // Generation
        .route("/parse-and-map", post(handlers::parse_and_map))
        .route("/generate-lesson-plans", post(handlers::generate_lesson_plans))
        // Job management
        .route("/jobs/{job_id}", get(handlers::get_job_status))
        .route("/jobs/{job_id}/logs", get(handlers::stream_job_logs));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
