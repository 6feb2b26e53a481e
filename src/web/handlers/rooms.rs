//! Room handlers for the HTTP API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::rpc::{Reply, Request};
use crate::web::error::ApiError;
use crate::web::extract::ApiJson;

use super::{run, AppState};

/// Create room request.
#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    /// Room name.
    pub name: String,
}

/// Join room request.
#[derive(Debug, Deserialize)]
pub struct JoinRoomRequest {
    /// Joining user.
    pub username: String,
}

/// Post message request.
#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    /// Sending user.
    pub username: String,
    /// Message body.
    pub body: String,
}

/// Room listing query.
#[derive(Debug, Deserialize)]
pub struct ListRoomsQuery {
    /// User whose joined rooms are tagged.
    pub username: Option<String>,
}

/// POST /api/rooms - Create a room.
pub async fn create_room(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateRoomRequest>,
) -> Result<Json<Reply>, ApiError> {
    run(&state, Request::CreateRoom { name: req.name })
}

/// DELETE /api/rooms/:name - Remove a room.
pub async fn remove_room(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Reply>, ApiError> {
    run(&state, Request::RemoveRoom { name })
}

/// GET /api/rooms/:name - Look up a room.
pub async fn get_room(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Reply>, ApiError> {
    run(&state, Request::SearchRoom { name })
}

/// GET /api/rooms?username= - Room listing for a user.
pub async fn list_rooms(
    State(state): State<AppState>,
    Query(query): Query<ListRoomsQuery>,
) -> Result<Json<Reply>, ApiError> {
    let username = query
        .username
        .ok_or_else(|| ApiError::bad_request("username query parameter is required"))?;
    run(&state, Request::ListRooms { username })
}

/// POST /api/rooms/:name/members - Join a room.
pub async fn join_room(
    State(state): State<AppState>,
    Path(room): Path<String>,
    ApiJson(req): ApiJson<JoinRoomRequest>,
) -> Result<Json<Reply>, ApiError> {
    run(
        &state,
        Request::JoinRoom {
            username: req.username,
            room,
        },
    )
}

/// DELETE /api/rooms/:name/members/:username - Leave a room.
pub async fn leave_room(
    State(state): State<AppState>,
    Path((room, username)): Path<(String, String)>,
) -> Result<Json<Reply>, ApiError> {
    run(&state, Request::LeaveRoom { username, room })
}

/// GET /api/rooms/:name/members/:username/can-send - Check send permission.
pub async fn can_send(
    State(state): State<AppState>,
    Path((room, username)): Path<(String, String)>,
) -> Result<Json<Reply>, ApiError> {
    run(&state, Request::CanSendMessage { username, room })
}

/// POST /api/rooms/:name/messages - Post a message.
pub async fn post_message(
    State(state): State<AppState>,
    Path(room): Path<String>,
    ApiJson(req): ApiJson<PostMessageRequest>,
) -> Result<Json<Reply>, ApiError> {
    run(
        &state,
        Request::AddMessage {
            username: req.username,
            room,
            body: req.body,
        },
    )
}

/// GET /api/rooms/:name/messages - Read a room's messages.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(room): Path<String>,
) -> Result<Json<Reply>, ApiError> {
    run(&state, Request::GetMessages { room })
}
