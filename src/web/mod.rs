//! HTTP API for Confab.
//!
//! A JSON mirror of the line protocol, served by axum alongside the TCP
//! listener and backed by the same dispatcher.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::{create_health_router, create_router};
pub use server::WebServer;
