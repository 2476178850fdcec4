//! Credential Engine Library
//!
//! This library provides account and token lifecycle management for the
//! Switchboard relay:
//!
//! - User registration and password login (bcrypt-hashed, never stored in
//!   plaintext)
//! - HS256 access tokens with a fixed lifetime
//! - Single-use renewal secrets: 32 random bytes handed out once, stored only
//!   as a SHA-256 hash, revoked on rotation before the replacement is issued
//! - Active-session listing per user
//!
//! Storage is abstracted behind the [`store::CredentialStore`] trait. The
//! in-memory implementation in [`store::memory`] backs tests and
//! storage-free deployments; the relay service binds a Postgres
//! implementation.
//!
//! # Modules
//!
//! - `errors` - Error taxonomy with stable codes and client-safe messages
//! - `service` - Business logic layer
//! - `signer` - Access token issuance and verification
//! - `store` - Storage trait, models, and the in-memory backend

pub mod errors;
pub mod service;
pub mod signer;
pub mod store;
