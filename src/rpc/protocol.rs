//! Wire schema for the directory RPC.
//!
//! Requests and responses are JSON objects, one per line. Every request
//! carries the protocol version and a caller-chosen id that the response
//! echoes back:
//!
//! ```text
//! {"v":1,"id":7,"op":"join_room","username":"alice","room":"general"}
//! {"v":1,"id":7,"ok":{"kind":"bool","value":true}}
//! ```
//!
//! Logical outcomes (including `false` and `null`) always travel in `ok`.
//! The `error` branch is only used for protocol faults.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::chat::{RoomInfo, UserInfo};

/// Protocol version spoken by this build.
pub const PROTOCOL_VERSION: u32 = 1;

/// A directory operation and its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    /// Create an empty room.
    CreateRoom { name: String },
    /// Remove a room.
    RemoveRoom { name: String },
    /// Look up a room.
    SearchRoom { name: String },
    /// List all rooms from a user's point of view.
    ListRooms { username: String },
    /// Register a user.
    AddClient { username: String },
    /// Deregister a user.
    RemoveClient { username: String },
    /// Look up a user.
    SearchClient { username: String },
    /// Join a room.
    JoinRoom { username: String, room: String },
    /// Leave a room.
    LeaveRoom { username: String, room: String },
    /// Post a message to a room.
    AddMessage {
        username: String,
        room: String,
        body: String,
    },
    /// Read a room's messages.
    GetMessages { room: String },
    /// Check whether a user may post to a room.
    CanSendMessage { username: String, room: String },
}

impl Request {
    /// Get the operation name as it appears on the wire.
    pub fn op_name(&self) -> &'static str {
        match self {
            Request::CreateRoom { .. } => "create_room",
            Request::RemoveRoom { .. } => "remove_room",
            Request::SearchRoom { .. } => "search_room",
            Request::ListRooms { .. } => "list_rooms",
            Request::AddClient { .. } => "add_client",
            Request::RemoveClient { .. } => "remove_client",
            Request::SearchClient { .. } => "search_client",
            Request::JoinRoom { .. } => "join_room",
            Request::LeaveRoom { .. } => "leave_room",
            Request::AddMessage { .. } => "add_message",
            Request::GetMessages { .. } => "get_messages",
            Request::CanSendMessage { .. } => "can_send_message",
        }
    }
}

/// Result of a directory operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Reply {
    /// Success flag.
    Bool(bool),
    /// Room snapshot, or null if the room does not exist.
    Room(Option<RoomInfo>),
    /// Room listing text.
    Listing(String),
    /// User snapshot, or null if the user does not exist (or, for
    /// `add_client`, already exists).
    User(Option<UserInfo>),
    /// Rendered messages in send order, or null if the room does not exist.
    Messages(Option<Vec<String>>),
}

impl Reply {
    /// Get the reply kind as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Reply::Bool(_) => "bool",
            Reply::Room(_) => "room",
            Reply::Listing(_) => "listing",
            Reply::User(_) => "user",
            Reply::Messages(_) => "messages",
        }
    }
}

/// Protocol error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The line is not a valid request envelope.
    MalformedRequest,
    /// The request uses a protocol version this server does not speak.
    UnsupportedVersion,
    /// An argument is blank or exceeds its length limit.
    InvalidArgument,
    /// The request line exceeds the configured maximum.
    LineTooLong,
}

impl ErrorCode {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MalformedRequest => "malformed_request",
            ErrorCode::UnsupportedVersion => "unsupported_version",
            ErrorCode::InvalidArgument => "invalid_argument",
            ErrorCode::LineTooLong => "line_too_long",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A protocol fault reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code}: {message}")]
pub struct ProtocolError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a malformed request error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MalformedRequest, message)
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }
}

/// A request as sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Protocol version.
    pub v: u32,
    /// Caller-chosen request id.
    pub id: u64,
    /// The operation.
    #[serde(flatten)]
    pub request: Request,
}

impl RequestEnvelope {
    /// Wrap a request with the current protocol version.
    pub fn new(id: u64, request: Request) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            id,
            request,
        }
    }
}

/// A response as sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Protocol version.
    pub v: u32,
    /// Id of the request this answers, if it could be read.
    pub id: Option<u64>,
    /// Operation result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<Reply>,
    /// Protocol fault.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ProtocolError>,
}

impl ResponseEnvelope {
    /// Create a successful response.
    pub fn ok(id: u64, reply: Reply) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            id: Some(id),
            ok: Some(reply),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<u64>, error: ProtocolError) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            id,
            ok: None,
            error: Some(error),
        }
    }

    /// Convert into the reply or the protocol error it carries.
    pub fn into_result(self) -> Result<Reply, ProtocolError> {
        match (self.ok, self.error) {
            (_, Some(error)) => Err(error),
            (Some(reply), None) => Ok(reply),
            (None, None) => Err(ProtocolError::malformed(
                "response carries neither ok nor error",
            )),
        }
    }
}

/// Decode a request line.
///
/// On failure, returns the request id (when it could be read) together with
/// the error so the response can still be correlated.
pub fn decode_request(line: &str) -> Result<RequestEnvelope, (Option<u64>, ProtocolError)> {
    let value: Value = serde_json::from_str(line)
        .map_err(|e| (None, ProtocolError::malformed(format!("invalid JSON: {e}"))))?;

    let id = value.get("id").and_then(Value::as_u64);
    match value.get("v").and_then(Value::as_u64) {
        Some(v) if v == u64::from(PROTOCOL_VERSION) => {}
        Some(v) => {
            return Err((
                id,
                ProtocolError::new(
                    ErrorCode::UnsupportedVersion,
                    format!("unsupported protocol version {v}, expected {PROTOCOL_VERSION}"),
                ),
            ))
        }
        None => {
            return Err((id, ProtocolError::malformed("missing protocol version")));
        }
    }

    serde_json::from_value(value)
        .map_err(|e| (id, ProtocolError::malformed(format!("invalid request: {e}"))))
}
