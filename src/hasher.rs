//! Content hashing of emitted build artifacts.

use sha2::{Digest as _, Sha256};

use crate::types::ContentHash;

/// Hash artifact text with SHA-256, rendered as lowercase hex.
///
/// The text is hashed byte for byte, so any change to the artifact,
/// whitespace included, yields a different hash.
pub fn hash_text(text: &str) -> ContentHash {
    let digest = Sha256::digest(text.as_bytes());
    return ContentHash(format!("{digest:x}"));
}
