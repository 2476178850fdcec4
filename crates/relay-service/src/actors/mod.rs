//! Actor-based relay core.
//!
//! Each room runs as an independent tokio task that owns all of its state
//! and is reached only through a message channel. The registry maps room
//! identifiers to live actors, and each WebSocket connection bridges a
//! socket to one room.

pub mod connection;
pub mod registry;
pub mod room;
