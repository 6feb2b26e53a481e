//! Chat module for Confab.
//!
//! This module provides the in-memory chat directory:
//! - Rooms with a member set and an append-only message log
//! - Registered users and the rooms they joined
//! - The directory that owns both and keeps membership symmetric
//! - The listing and message text formats consumed by terminal clients

mod directory;
mod listing;
mod message;
mod room;
mod user;

pub use directory::{Directory, DirectorySnapshot, RoomInfo, UserInfo};
pub use listing::{
    format_listing_line, format_room_listing, parse_room_listing, render_messages, ListingEntry,
    JOINED_TAG,
};
pub use message::Message;
pub use room::Room;
pub use user::User;
