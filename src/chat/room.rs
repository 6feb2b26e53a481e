//! Chat room implementation.
//!
//! A room holds its member set and an append-only message log. Members are
//! stored by username; the directory is the only caller that mutates a room
//! and always updates the matching user alongside it.

use chrono::{DateTime, Utc};

use super::message::Message;

/// A named chat room.
#[derive(Debug, Clone)]
pub struct Room {
    /// Room name (immutable).
    name: String,
    /// Member usernames, in join order.
    members: Vec<String>,
    /// Message log, in send order.
    messages: Vec<Message>,
}

impl Room {
    /// Create a new empty room.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            messages: Vec::new(),
        }
    }

    /// Get the room name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the member usernames.
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Get the number of members.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Get the message log.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Get the number of messages in the log.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Get the time of the most recent message, if any.
    pub fn last_message_at(&self) -> Option<DateTime<Utc>> {
        self.messages.last().map(Message::sent_at)
    }

    /// Check if a user is a member of the room.
    pub fn has_user(&self, username: &str) -> bool {
        self.members.iter().any(|m| m == username)
    }

    /// Add a user to the member set.
    ///
    /// Returns false if the user is already a member.
    pub fn add_client(&mut self, username: &str) -> bool {
        if self.has_user(username) {
            return false;
        }
        self.members.push(username.to_string());
        true
    }

    /// Remove a user from the member set.
    ///
    /// Returns false if the user was not a member.
    pub fn remove_client(&mut self, username: &str) -> bool {
        match self.members.iter().position(|m| m == username) {
            Some(pos) => {
                self.members.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Append a message from a member.
    ///
    /// Membership is checked again here even though the directory already did,
    /// so a non-member can never end up in the log.
    pub fn add_message(&mut self, author: &str, body: impl Into<String>) -> bool {
        if !self.has_user(author) {
            return false;
        }
        let seq = self.messages.len() as u64;
        self.messages.push(Message::new(author, body, seq));
        true
    }
}
