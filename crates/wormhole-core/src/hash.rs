use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Display;

/// Width of [`UrlHash`] in hex characters (128 bits).
pub const URL_HASH_LEN: usize = 32;

/// Fixed-width content hash of a normalized URL.
///
/// This is the column the storage layer puts its uniqueness constraint on:
/// two requests for the same normalized URL always collide here.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UrlHash(String);

impl UrlHash {
    /// Hashes a normalized URL: the first 16 bytes of its SHA-256, hex encoded.
    pub fn of(url: &str) -> Self {
        let digest = Sha256::digest(url.as_bytes());
        Self(hex::encode(&digest[..URL_HASH_LEN / 2]))
    }

    /// Wraps a hash read back from storage.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UrlHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
