//! Switchboard Relay Service Library
//!
//! Real-time session relay: ephemeral rooms that fan JSON text frames out to
//! every connected WebSocket, plus the account endpoints that issue the
//! tokens used to claim a named identity inside a room.
//!
//! Rooms are actors. Each one is a tokio task reached only through its
//! mailbox, owning the connection set, the participant identities, and the
//! display-name map. The registry maps room ids to live actors, creating
//! them on first join and dropping them when the last connection leaves.
//!
//! # Modules
//!
//! - `actors`: room actor, room registry, and per-connection pump
//! - `protocol`: wire messages and inbound frame filtering
//! - `handlers`: HTTP and WebSocket endpoints
//! - `middleware`: bearer-token authentication
//! - `repositories`: Postgres persistence for the credential engine
//! - `config`: environment-based configuration
//! - `routes`: router assembly and shared state
//! - `errors`: service errors and their HTTP mapping

pub mod actors;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod protocol;
pub mod repositories;
pub mod routes;
