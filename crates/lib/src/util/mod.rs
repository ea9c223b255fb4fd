//! Shared utilities.
//!
//! Common utilities used across the crate including hashing, size parsing and
//! test fixtures.

pub mod hash;
pub mod size;

#[cfg(test)]
pub mod testutil;

use std::collections::HashSet;
use std::hash::Hash;

/// Remove duplicates, keeping the first occurrence of every item.
pub fn dedup_stable<T: Eq + Hash + Clone>(items: impl IntoIterator<Item = T>) -> Vec<T> {
  let mut seen = HashSet::new();
  items.into_iter().filter(|item| seen.insert(item.clone())).collect()
}
