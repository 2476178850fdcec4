//! Random identifier generation.
//!
//! Room identifiers and anonymous client identifiers are 128-bit values drawn
//! from the OS CSPRNG and rendered as lowercase hex (32 characters). The
//! width is what makes an unlisted room unguessable, so these must never be
//! downgraded to a weaker source or a shorter rendering.

use ring::rand::{SecureRandom, SystemRandom};

/// Number of random bytes in a generated identifier (128 bits).
pub const ID_BYTES: usize = 16;

/// Generate a 128-bit random identifier as lowercase hex.
///
/// Used for room identifiers and for the identity of connections that join
/// without a verifiable access token.
#[must_use]
#[allow(clippy::expect_used)] // CSPRNG fill on 16 bytes only fails if the OS entropy source is gone
pub fn random_hex_id() -> String {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; ID_BYTES];
    SecureRandom::fill(&rng, &mut bytes).expect("CSPRNG should not fail on 16 bytes");
    hex::encode(bytes)
}
