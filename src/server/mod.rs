//! RPC server module.
//!
//! This module provides the TCP listener and connection handling for the
//! directory RPC.

mod listener;
mod session;

pub use listener::{ConnectionPermit, RpcServer};
pub use session::RpcSession;
