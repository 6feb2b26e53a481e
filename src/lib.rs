//! Confab - an in-memory multi-room chat directory.
//!
//! Rooms, users and per-room message histories live in a single
//! [`Directory`] guarded by one lock. The directory is served over a
//! line-delimited JSON protocol on TCP and, optionally, a JSON HTTP API.

pub mod chat;
pub mod config;
pub mod error;
pub mod logging;
pub mod rpc;
pub mod server;
pub mod web;

pub use chat::{
    format_room_listing, parse_room_listing, render_messages, Directory, DirectorySnapshot,
    ListingEntry, Message, Room, RoomInfo, User, UserInfo, JOINED_TAG,
};
pub use config::Config;
pub use error::{ConfabError, Result};
pub use rpc::{
    Dispatcher, ErrorCode, Limits, ProtocolError, Reply, Request, RpcClient, PROTOCOL_VERSION,
};
pub use server::{RpcServer, RpcSession};
pub use web::WebServer;
