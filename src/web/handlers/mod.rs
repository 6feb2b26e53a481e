//! API handlers for the HTTP surface.
//!
//! Every handler builds an RPC [`Request`](crate::rpc::Request) and runs it
//! through the shared dispatcher, so the HTTP API and the line protocol
//! always agree on validation and results.

pub mod rooms;
pub mod users;

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::rpc::{Dispatcher, Reply, Request};
use crate::web::error::ApiError;

pub use rooms::*;
pub use users::*;

/// Shared handler state.
pub type AppState = Arc<Dispatcher>;

/// Run a request through the dispatcher and wrap the reply.
fn run(state: &AppState, request: Request) -> Result<Json<Reply>, ApiError> {
    Ok(Json(state.dispatch(request)?))
}

/// Directory counters.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Number of rooms.
    pub rooms: usize,
    /// Number of registered users.
    pub users: usize,
}

/// GET /api/stats - Directory counters.
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let (rooms, users) = state.directory().counts();
    Json(StatsResponse { rooms, users })
}
