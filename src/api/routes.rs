use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Personalized
        .route(
            "/users/:user_id/recommendations",
            get(handlers::recommend_for_user),
        )
        // Catalog
        .route("/movies/by-genre", get(handlers::movies_by_genre))
        .route("/movies/trending", get(handlers::trending))
        .route("/movies/:movie_id", get(handlers::get_movie))
        .route("/genres", get(handlers::list_genres))
        // Dataset
        .route("/stats", get(handlers::stats))
        .route("/admin/reload", post(handlers::reload))
}
