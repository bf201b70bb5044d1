//! HTTP API for sentient-api
//!
//! Server setup, routing and request handlers.

pub mod handlers;
pub mod server;

pub use server::{build_router, AppContext};
