//! Chat directory.
//!
//! The directory is the single owner of every room and user and the only
//! place where the membership relation is changed. All state sits behind one
//! mutex; each public method holds it for its whole duration, so every
//! operation is atomic with respect to every other one and no caller can
//! observe a half-updated relation.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::listing::format_room_listing;
use super::message::Message;
use super::room::Room;
use super::user::User;

/// Snapshot of a room, safe to hand to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    /// Room name.
    pub name: String,
    /// Member usernames, in join order.
    pub members: Vec<String>,
    /// Number of messages in the room's log.
    pub message_count: usize,
    /// Time of the most recent message, or None for an empty log.
    pub last_message_at: Option<DateTime<Utc>>,
}

impl From<&Room> for RoomInfo {
    fn from(room: &Room) -> Self {
        Self {
            name: room.name().to_string(),
            members: room.members().to_vec(),
            message_count: room.message_count(),
            last_message_at: room.last_message_at(),
        }
    }
}

/// Snapshot of a user, safe to hand to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Username.
    pub username: String,
    /// Joined room names, in join order.
    pub rooms: Vec<String>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            username: user.username().to_string(),
            rooms: user.rooms().to_vec(),
        }
    }
}

/// A consistent view of the whole directory taken under a single lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectorySnapshot {
    /// Rooms in creation order.
    pub rooms: Vec<RoomInfo>,
    /// Users in registration order.
    pub users: Vec<UserInfo>,
}

impl DirectorySnapshot {
    /// Check that user `u` is in room `r`'s members exactly when `r` is in
    /// `u`'s joined rooms, and that every reference resolves.
    ///
    /// Returns the first violation found.
    pub fn check_membership_symmetry(&self) -> Result<(), String> {
        for room in &self.rooms {
            for member in &room.members {
                let user = self
                    .users
                    .iter()
                    .find(|u| &u.username == member)
                    .ok_or_else(|| format!("room {} lists unknown user {}", room.name, member))?;
                if !user.rooms.contains(&room.name) {
                    return Err(format!(
                        "user {} is a member of {} but has not joined it",
                        member, room.name
                    ));
                }
            }
        }
        for user in &self.users {
            for joined in &user.rooms {
                let room = self
                    .rooms
                    .iter()
                    .find(|r| &r.name == joined)
                    .ok_or_else(|| format!("user {} joined unknown room {}", user.username, joined))?;
                if !room.members.contains(&user.username) {
                    return Err(format!(
                        "user {} joined {} but is not a member",
                        user.username, joined
                    ));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct DirectoryState {
    /// Rooms in creation order.
    rooms: Vec<Room>,
    /// Users in registration order.
    users: Vec<User>,
}

impl DirectoryState {
    fn room_index(&self, name: &str) -> Option<usize> {
        self.rooms.iter().position(|r| r.name() == name)
    }

    fn user_index(&self, username: &str) -> Option<usize> {
        self.users.iter().position(|u| u.username() == username)
    }

    fn room(&self, name: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.name() == name)
    }

    fn user(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username() == username)
    }

    /// Resolve both ends of a membership pair.
    fn pair(&self, username: &str, room: &str) -> Option<(usize, usize)> {
        Some((self.user_index(username)?, self.room_index(room)?))
    }
}

/// The chat directory.
///
/// Construct one per hosting process and share it as `Arc<Directory>`.
#[derive(Debug, Default)]
pub struct Directory {
    state: Mutex<DirectoryState>,
}

impl Directory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory seeded with the given rooms.
    ///
    /// Duplicate names are skipped.
    pub fn with_rooms<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let directory = Self::new();
        for name in names {
            directory.create_room(name.as_ref());
        }
        directory
    }

    /// Acquire the directory lock.
    ///
    /// Every mutation runs its checks before touching either side of the
    /// relation, so a poisoned lock still guards consistent state.
    fn lock(&self) -> MutexGuard<'_, DirectoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create an empty room.
    ///
    /// Returns false if a room with that name already exists.
    pub fn create_room(&self, name: &str) -> bool {
        let mut state = self.lock();
        if state.room_index(name).is_some() {
            debug!(room = %name, "room already exists");
            return false;
        }
        state.rooms.push(Room::new(name));
        debug!(room = %name, "room created");
        true
    }

    /// Remove a room and drop it from every member's joined rooms.
    ///
    /// Returns false if the room does not exist.
    pub fn remove_room(&self, name: &str) -> bool {
        let mut state = self.lock();
        let Some(index) = state.room_index(name) else {
            debug!(room = %name, "cannot remove unknown room");
            return false;
        };

        let room = state.rooms.remove(index);
        for member in room.members() {
            if let Some(user) = state.users.iter_mut().find(|u| u.username() == member) {
                user.leave_room(name);
            }
        }
        debug!(room = %name, members = room.member_count(), "room removed");
        true
    }

    /// Look up a room by name.
    pub fn search_room(&self, name: &str) -> Option<RoomInfo> {
        self.lock().room(name).map(RoomInfo::from)
    }

    /// List every room in creation order, tagging the ones `username` has
    /// joined.
    ///
    /// An unknown username yields an empty listing.
    pub fn list_rooms_for_user(&self, username: &str) -> String {
        let state = self.lock();
        if state.user(username).is_none() {
            debug!(username = %username, "listing requested for unknown user");
            return String::new();
        }
        format_room_listing(&state.rooms, username)
    }

    /// Register a new user.
    ///
    /// Returns None if the username is already taken.
    pub fn add_client(&self, username: &str) -> Option<UserInfo> {
        let mut state = self.lock();
        if state.user_index(username).is_some() {
            debug!(username = %username, "user already exists");
            return None;
        }
        let user = User::new(username);
        let info = UserInfo::from(&user);
        state.users.push(user);
        debug!(username = %username, "user added");
        Some(info)
    }

    /// Deregister a user and remove it from every room's members.
    ///
    /// Messages the user sent stay in the room logs. Returns false if the
    /// user is unknown.
    pub fn remove_client(&self, username: &str) -> bool {
        let mut state = self.lock();
        let Some(index) = state.user_index(username) else {
            debug!(username = %username, "cannot remove unknown user");
            return false;
        };

        state.users.remove(index);
        for room in state.rooms.iter_mut() {
            room.remove_client(username);
        }
        debug!(username = %username, "user removed");
        true
    }

    /// Look up a user by username.
    pub fn search_client(&self, username: &str) -> Option<UserInfo> {
        self.lock().user(username).map(UserInfo::from)
    }

    /// Add `username` to `room` on both sides of the relation.
    ///
    /// Returns false if either is unknown or the user already joined.
    pub fn join_room(&self, username: &str, room: &str) -> bool {
        let mut state = self.lock();
        let Some((u, r)) = state.pair(username, room) else {
            debug!(username = %username, room = %room, "cannot join: unknown user or room");
            return false;
        };
        if state.users[u].can_send(room) || state.rooms[r].has_user(username) {
            debug!(username = %username, room = %room, "already joined");
            return false;
        }

        let joined = state.users[u].join_room(room);
        let added = state.rooms[r].add_client(username);
        debug!(username = %username, room = %room, "joined room");
        joined && added
    }

    /// Remove `username` from `room` on both sides of the relation.
    ///
    /// Returns false if either is unknown or the user has not joined.
    pub fn leave_room(&self, username: &str, room: &str) -> bool {
        let mut state = self.lock();
        let Some((u, r)) = state.pair(username, room) else {
            debug!(username = %username, room = %room, "cannot leave: unknown user or room");
            return false;
        };
        if !state.users[u].can_send(room) || !state.rooms[r].has_user(username) {
            debug!(username = %username, room = %room, "not joined");
            return false;
        }

        let left = state.users[u].leave_room(room);
        let removed = state.rooms[r].remove_client(username);
        debug!(username = %username, room = %room, "left room");
        left && removed
    }

    /// Append a message from `username` to `room`.
    ///
    /// Returns false if either is unknown or the user is not a member.
    pub fn add_message(&self, username: &str, room: &str, body: &str) -> bool {
        let mut state = self.lock();
        let Some((u, r)) = state.pair(username, room) else {
            debug!(username = %username, room = %room, "cannot send: unknown user or room");
            return false;
        };
        if !state.users[u].can_send(room) {
            debug!(username = %username, room = %room, "cannot send: not a member");
            return false;
        }

        let appended = state.rooms[r].add_message(username, body);
        debug!(username = %username, room = %room, "message added");
        appended
    }

    /// Get a room's messages in send order.
    ///
    /// Returns None if the room does not exist.
    pub fn get_messages(&self, room: &str) -> Option<Vec<Message>> {
        self.lock().room(room).map(|r| r.messages().to_vec())
    }

    /// Check whether `username` may currently send to `room`.
    pub fn can_send_message(&self, username: &str, room: &str) -> bool {
        let state = self.lock();
        match state.pair(username, room) {
            Some((u, _)) => state.users[u].can_send(room),
            None => false,
        }
    }

    /// Get the number of rooms.
    pub fn room_count(&self) -> usize {
        self.lock().rooms.len()
    }

    /// Get the number of registered users.
    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    /// Get the room and user counts under a single lock acquisition.
    pub fn counts(&self) -> (usize, usize) {
        let state = self.lock();
        (state.rooms.len(), state.users.len())
    }

    /// Take a consistent snapshot of all rooms and users.
    pub fn snapshot(&self) -> DirectorySnapshot {
        let state = self.lock();
        DirectorySnapshot {
            rooms: state.rooms.iter().map(RoomInfo::from).collect(),
            users: state.users.iter().map(UserInfo::from).collect(),
        }
    }
}
