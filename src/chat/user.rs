//! Registered chat user.

/// A registered user and the rooms it has joined.
///
/// Joined rooms are tracked by name. Only the user's own side of the
/// membership relation lives here; the directory keeps the room side in step.
#[derive(Debug, Clone)]
pub struct User {
    /// Username (immutable).
    username: String,
    /// Names of joined rooms, in join order.
    rooms: Vec<String>,
}

impl User {
    /// Create a new user with no joined rooms.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            rooms: Vec::new(),
        }
    }

    /// Get the username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Get the names of joined rooms.
    pub fn rooms(&self) -> &[String] {
        &self.rooms
    }

    /// Record that this user joined a room.
    ///
    /// Returns false if the room was already joined.
    pub fn join_room(&mut self, room: &str) -> bool {
        if self.can_send(room) {
            return false;
        }
        self.rooms.push(room.to_string());
        true
    }

    /// Record that this user left a room.
    ///
    /// Returns false if the room was not joined.
    pub fn leave_room(&mut self, room: &str) -> bool {
        match self.rooms.iter().position(|r| r == room) {
            Some(pos) => {
                self.rooms.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Check whether this user has joined the room.
    pub fn can_send(&self, room: &str) -> bool {
        self.rooms.iter().any(|r| r == room)
    }
}
