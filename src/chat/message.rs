//! Chat message value.

use chrono::{DateTime, Utc};

/// A message posted to a room.
///
/// Messages are immutable once created. The author is stored by username so a
/// message outlives the user that wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Username of the sender.
    author: String,
    /// Message body.
    body: String,
    /// Position in the room's log, starting at 0.
    seq: u64,
    /// Timestamp when the message was appended.
    sent_at: DateTime<Utc>,
}

impl Message {
    /// Create a new message at the given log position.
    pub fn new(author: impl Into<String>, body: impl Into<String>, seq: u64) -> Self {
        Self {
            author: author.into(),
            body: body.into(),
            seq,
            sent_at: Utc::now(),
        }
    }

    /// Get the sender's username.
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Get the message body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Get the position of this message in its room.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Get the time the message was appended.
    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }

    /// Format the message for display: `<username>:\n<body>`.
    pub fn render(&self) -> String {
        format!("{}:\n{}", self.author, self.body)
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:\n{}", self.author, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_new() {
        let msg = Message::new("alice", "hi", 0);
        assert_eq!(msg.author(), "alice");
        assert_eq!(msg.body(), "hi");
        assert_eq!(msg.seq(), 0);
    }

    #[test]
    fn test_message_sent_at() {
        let before = Utc::now();
        let msg = Message::new("alice", "hi", 0);
        let after = Utc::now();
        assert!(msg.sent_at() >= before);
        assert!(msg.sent_at() <= after);
    }

    #[test]
    fn test_message_render() {
        let msg = Message::new("alice", "hi", 3);
        assert_eq!(msg.render(), "alice:\nhi");
    }

    #[test]
    fn test_message_render_multiline_body() {
        let msg = Message::new("bob", "\tline one\n\tline two\n", 0);
        assert_eq!(msg.render(), "bob:\n\tline one\n\tline two\n");
    }

    #[test]
    fn test_message_display_matches_render() {
        let msg = Message::new("carol", "hello there", 1);
        assert_eq!(msg.to_string(), msg.render());
    }
}
