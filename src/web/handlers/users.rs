//! User handlers for the HTTP API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::rpc::{Reply, Request};
use crate::web::error::ApiError;
use crate::web::extract::ApiJson;

use super::{run, AppState};

/// Register user request.
#[derive(Debug, Deserialize)]
pub struct AddUserRequest {
    /// Username to register.
    pub username: String,
}

/// POST /api/users - Register a user.
pub async fn add_user(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<AddUserRequest>,
) -> Result<Json<Reply>, ApiError> {
    run(
        &state,
        Request::AddClient {
            username: req.username,
        },
    )
}

/// DELETE /api/users/:username - Deregister a user.
pub async fn remove_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Reply>, ApiError> {
    run(&state, Request::RemoveClient { username })
}

/// GET /api/users/:username - Look up a user.
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Reply>, ApiError> {
    run(&state, Request::SearchClient { username })
}
