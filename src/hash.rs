//! Content hash value object
//!
//! Used by the build manifest to skip rewriting unchanged artifacts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// SHA-256 of an artifact, rendered as `sha256:<hex>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    pub const PREFIX: &'static str = "sha256:";

    pub fn from_bytes(content: &[u8]) -> Self {
        use sha2::{Digest, Sha256};
        Self(format!("{}{:x}", Self::PREFIX, Sha256::digest(content)))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
