//! Text formats handed to terminal clients.
//!
//! The room listing is one line per room in creation order:
//! a tab, the room name, ` [joined]` if the queried user is a member, and a
//! line break. Messages render as `<username>:\n<body>`.

use super::message::Message;
use super::room::Room;

/// Suffix appended to rooms the queried user has joined.
pub const JOINED_TAG: &str = " [joined]";

/// One parsed line of a room listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Room name.
    pub name: String,
    /// Whether the queried user is a member.
    pub joined: bool,
}

/// Format a single listing line, including the trailing line break.
pub fn format_listing_line(name: &str, joined: bool) -> String {
    if joined {
        format!("\t{name}{JOINED_TAG}\n")
    } else {
        format!("\t{name}\n")
    }
}

/// Format the listing of `rooms` from the point of view of `username`.
pub fn format_room_listing<'a>(rooms: impl IntoIterator<Item = &'a Room>, username: &str) -> String {
    rooms
        .into_iter()
        .map(|room| format_listing_line(room.name(), room.has_user(username)))
        .collect()
}

/// Parse a listing produced by [`format_room_listing`].
///
/// Lines that do not start with a tab are ignored.
pub fn parse_room_listing(text: &str) -> Vec<ListingEntry> {
    text.lines()
        .filter_map(|line| line.strip_prefix('\t'))
        .map(|rest| match rest.strip_suffix(JOINED_TAG) {
            Some(name) => ListingEntry {
                name: name.to_string(),
                joined: true,
            },
            None => ListingEntry {
                name: rest.to_string(),
                joined: false,
            },
        })
        .collect()
}

/// Render a message log for display, preserving order.
pub fn render_messages(messages: &[Message]) -> Vec<String> {
    messages.iter().map(Message::render).collect()
}
