//! Remote-call layer for the chat directory.
//!
//! This module defines the versioned wire schema, the dispatcher that maps
//! requests onto [`crate::chat::Directory`] operations, and a typed client.

mod client;
mod dispatch;
mod protocol;

pub use client::RpcClient;
pub use dispatch::{Dispatcher, Limits};
pub use protocol::{
    decode_request, ErrorCode, ProtocolError, Reply, Request, RequestEnvelope, ResponseEnvelope,
    PROTOCOL_VERSION,
};
