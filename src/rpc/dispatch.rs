//! Request dispatch onto the directory.
//!
//! The dispatcher is shared by every transport: it checks argument limits,
//! runs the matching directory operation and turns the outcome into a
//! [`Reply`].

use std::sync::Arc;

use tracing::{debug, warn};

use crate::chat::{render_messages, Directory};
use crate::config::DirectoryConfig;

use super::protocol::{decode_request, ProtocolError, Reply, Request, ResponseEnvelope};

/// Argument limits enforced before a request reaches the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum length of room names and usernames, in characters.
    pub max_name_length: usize,
    /// Maximum length of a message body, in characters.
    pub max_message_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self::from(&DirectoryConfig::default())
    }
}

impl From<&DirectoryConfig> for Limits {
    fn from(config: &DirectoryConfig) -> Self {
        Self {
            max_name_length: config.max_name_length,
            max_message_length: config.max_message_length,
        }
    }
}

impl Limits {
    fn check_name(&self, field: &str, value: &str) -> Result<(), ProtocolError> {
        if value.trim().is_empty() {
            return Err(ProtocolError::invalid_argument(format!(
                "{field} is required"
            )));
        }
        // Tabs and line breaks would corrupt the room listing
        if value.chars().any(char::is_control) {
            return Err(ProtocolError::invalid_argument(format!(
                "{field} must not contain control characters"
            )));
        }
        if value.chars().count() > self.max_name_length {
            return Err(ProtocolError::invalid_argument(format!(
                "{field} exceeds {} characters",
                self.max_name_length
            )));
        }
        Ok(())
    }

    fn check_body(&self, body: &str) -> Result<(), ProtocolError> {
        if body.chars().count() > self.max_message_length {
            return Err(ProtocolError::invalid_argument(format!(
                "body exceeds {} characters",
                self.max_message_length
            )));
        }
        Ok(())
    }

    /// Check every argument of a request.
    pub fn validate(&self, request: &Request) -> Result<(), ProtocolError> {
        match request {
            Request::CreateRoom { name }
            | Request::RemoveRoom { name }
            | Request::SearchRoom { name } => self.check_name("name", name),
            Request::ListRooms { username }
            | Request::AddClient { username }
            | Request::RemoveClient { username }
            | Request::SearchClient { username } => self.check_name("username", username),
            Request::JoinRoom { username, room }
            | Request::LeaveRoom { username, room }
            | Request::CanSendMessage { username, room } => {
                self.check_name("username", username)?;
                self.check_name("room", room)
            }
            Request::AddMessage {
                username,
                room,
                body,
            } => {
                self.check_name("username", username)?;
                self.check_name("room", room)?;
                self.check_body(body)
            }
            Request::GetMessages { room } => self.check_name("room", room),
        }
    }
}

/// Routes requests to a shared [`Directory`].
#[derive(Debug, Clone)]
pub struct Dispatcher {
    directory: Arc<Directory>,
    limits: Limits,
}

impl Dispatcher {
    /// Create a dispatcher over the given directory.
    pub fn new(directory: Arc<Directory>, limits: Limits) -> Self {
        Self { directory, limits }
    }

    /// Get the directory this dispatcher serves.
    pub fn directory(&self) -> &Arc<Directory> {
        &self.directory
    }

    /// Get the argument limits.
    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Validate and execute a request.
    pub fn dispatch(&self, request: Request) -> Result<Reply, ProtocolError> {
        self.limits.validate(&request)?;
        debug!(op = request.op_name(), "dispatching request");
        Ok(self.execute(request))
    }

    fn execute(&self, request: Request) -> Reply {
        let directory = &self.directory;
        match request {
            Request::CreateRoom { name } => Reply::Bool(directory.create_room(&name)),
            Request::RemoveRoom { name } => Reply::Bool(directory.remove_room(&name)),
            Request::SearchRoom { name } => Reply::Room(directory.search_room(&name)),
            Request::ListRooms { username } => {
                Reply::Listing(directory.list_rooms_for_user(&username))
            }
            Request::AddClient { username } => Reply::User(directory.add_client(&username)),
            Request::RemoveClient { username } => Reply::Bool(directory.remove_client(&username)),
            Request::SearchClient { username } => Reply::User(directory.search_client(&username)),
            Request::JoinRoom { username, room } => {
                Reply::Bool(directory.join_room(&username, &room))
            }
            Request::LeaveRoom { username, room } => {
                Reply::Bool(directory.leave_room(&username, &room))
            }
            Request::AddMessage {
                username,
                room,
                body,
            } => Reply::Bool(directory.add_message(&username, &room, &body)),
            Request::GetMessages { room } => Reply::Messages(
                directory
                    .get_messages(&room)
                    .map(|messages| render_messages(&messages)),
            ),
            Request::CanSendMessage { username, room } => {
                Reply::Bool(directory.can_send_message(&username, &room))
            }
        }
    }

    /// Decode a request line, execute it and build the response.
    pub fn handle_line(&self, line: &str) -> ResponseEnvelope {
        let envelope = match decode_request(line) {
            Ok(envelope) => envelope,
            Err((id, error)) => {
                warn!(code = %error.code, "rejecting request: {}", error.message);
                return ResponseEnvelope::error(id, error);
            }
        };

        match self.dispatch(envelope.request) {
            Ok(reply) => ResponseEnvelope::ok(envelope.id, reply),
            Err(error) => {
                debug!(id = envelope.id, code = %error.code, "request failed validation");
                ResponseEnvelope::error(Some(envelope.id), error)
            }
        }
    }
}
