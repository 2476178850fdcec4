//! Common utilities shared across Switchboard crates.

#![warn(clippy::pedantic)]

/// Module for random identifier generation
pub mod ids;

/// Module for secret types that prevent accidental logging
pub mod secret;
