//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports from the [`secrecy`] crate, which every Switchboard crate uses
//! for sensitive values: passwords in flight, the token-signing secret,
//! database URLs with embedded credentials, and renewal secrets before they
//! are hashed.
//!
//! `SecretString` and `SecretBox<T>` implement `Debug` with redaction, so a
//! struct that derives `Debug` around a secret field cannot leak it through
//! `{:?}` formatting or tracing fields. Reading the value requires an explicit
//! [`ExposeSecret::expose_secret`] call, which keeps every exposure grep-able.
//! Values are zeroized on drop.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct LoginAttempt {
//!     username: String,
//!     password: SecretString,
//! }
//!
//! let attempt = LoginAttempt {
//!     username: "alice".to_string(),
//!     password: SecretString::from("correct horse"),
//! };
//!
//! // Redacted: the password never appears in Debug output.
//! let rendered = format!("{attempt:?}");
//! assert!(!rendered.contains("correct horse"));
//!
//! // Explicit exposure is required to read the value.
//! let plaintext: &str = attempt.password.expose_secret();
//! # let _ = plaintext;
//! ```
//!
//! # Guidelines
//!
//! Use `SecretString` for passwords, bearer/renewal secrets, signing keys
//! supplied as text, and connection URLs. Use `SecretBox<T>` for binary key
//! material. Config structs holding either should also hand-implement `Debug`
//! so the redaction is visible field-by-field.

// Re-export the main types from secrecy
pub use secrecy::{ExposeSecret, SecretBox, SecretString};
