use axum::{
    middleware,
    routing::{delete, get, post},
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
        .route("/", get(handlers::health::home))
        .route("/health", get(handlers::health::health_check))
        // Accounts
        .route("/signup", post(handlers::auth::signup))
        .route("/login", post(handlers::auth::login))
        .route("/mypage", get(handlers::auth::mypage))
        // Recommendations
        .route("/recommend", post(handlers::recommend::recommend))
        // Saved user data
        .route(
            "/rating",
            post(handlers::ratings::rate_place).get(handlers::ratings::list_ratings),
        )
        .route(
            "/bookmarks",
            post(handlers::bookmarks::add_bookmark).get(handlers::bookmarks::list_bookmarks),
        )
        .route("/bookmarks/:place_id", delete(handlers::bookmarks::remove_bookmark))
        .route(
            "/tags",
            get(handlers::tags::get_tags).put(handlers::tags::save_tags),
        )
        // request id is assigned before the trace span is created
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
        .with_state(state)
}
