//! Hashing utilities for stable names and model fingerprints.
//!
//! This module provides:
//! - `ObjectHash`: a truncated hash of a JSON-serialized value
//! - `Hashable`: computes an `ObjectHash` for any serializable type
//! - `hash_bytes()`: full SHA-256 of arbitrary bytes

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Length of an [`ObjectHash`] in hex characters.
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

pub type HashError = serde_json::Error;

/// A content hash identifying a unique value.
///
/// The hash is a 20-character truncated SHA-256 of the JSON-serialized value.
/// Maps in the crate's model types are ordered, so equal values always
/// serialize, and therefore hash, identically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHash(pub String);

impl std::fmt::Display for ObjectHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

pub trait Hashable: Serialize {
  fn compute_hash(&self) -> Result<ObjectHash, HashError> {
    let serialized = serde_json::to_string(self)?;
    let full = hash_bytes(serialized.as_bytes());
    Ok(ObjectHash(full[..OBJ_HASH_PREFIX_LEN].to_string()))
  }
}

/// Hash arbitrary bytes.
///
/// Returns the full 64-character lowercase hex SHA-256.
pub fn hash_bytes(data: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(data);
  hex::encode(hasher.finalize())
}
