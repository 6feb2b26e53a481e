//! Router configuration for the HTTP API.

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    add_user, can_send, create_room, get_messages, get_room, get_user, join_room, leave_room,
    list_rooms, post_message, remove_room, remove_user, stats,
};
use super::middleware::create_cors_layer;
use crate::rpc::Dispatcher;

/// Create the main API router.
pub fn create_router(dispatcher: Arc<Dispatcher>, cors_origins: &[String]) -> Router {
    let room_routes = Router::new()
        .route("/", get(list_rooms).post(create_room))
        .route("/:name", get(get_room).delete(remove_room))
        .route("/:name/members", post(join_room))
        .route("/:name/members/:username", delete(leave_room))
        .route("/:name/members/:username/can-send", get(can_send))
        .route("/:name/messages", get(get_messages).post(post_message));

    let user_routes = Router::new()
        .route("/", post(add_user))
        .route("/:username", get(get_user).delete(remove_user));

    let api_routes = Router::new()
        .nest("/rooms", room_routes)
        .nest("/users", user_routes)
        .route("/stats", get(stats));

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .with_state(dispatcher)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
