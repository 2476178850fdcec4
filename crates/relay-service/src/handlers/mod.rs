//! HTTP and WebSocket request handlers.

pub mod auth;
pub mod rooms;
pub mod ws;
