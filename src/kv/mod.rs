//! Key-value storage seam for tempmail.
//!
//! The mail store only talks to storage through [`KeyValueStore`], a
//! Redis-shaped set of primitives (strings, hashes, sets and lists with
//! per-key expiry). [`MemoryStore`] is the in-process backend.
//!
//! Every call is expected to finish within a bounded time; backends report
//! an unreachable or overloaded store as
//! [`TempMailError::StoreUnavailable`](crate::TempMailError::StoreUnavailable).

mod memory;
mod pattern;

pub use memory::MemoryStore;
pub use pattern::glob_match;

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

/// Redis-style key-value primitives.
///
/// Collections follow Redis semantics: a hash, set or list whose last
/// element is removed disappears, and operations on a missing key behave
/// as if it held an empty collection.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get a string value.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set a string value, clearing any expiry on the key.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete keys, returning how many existed.
    async fn del(&self, keys: &[&str]) -> Result<usize>;

    /// Check whether a key exists.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Set a time-to-live on an existing key. Returns false if the key is missing.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Remaining time-to-live; `None` if the key is missing or never expires.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>>;

    /// All live keys matching a glob pattern (`*`, `?`, `\` escapes).
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// Set hash fields, returning how many fields were newly created.
    async fn hset(&self, key: &str, fields: &[(&str, &str)]) -> Result<usize>;

    /// Get one hash field.
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>>;

    /// Get every field of a hash.
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>>;

    /// Remove a hash field. Returns true if it existed.
    async fn hdel(&self, key: &str, field: &str) -> Result<bool>;

    /// Add a set member. Returns true if it was not already present.
    async fn sadd(&self, key: &str, member: &str) -> Result<bool>;

    /// All members of a set.
    async fn smembers(&self, key: &str) -> Result<HashSet<String>>;

    /// Check set membership.
    async fn sismember(&self, key: &str, member: &str) -> Result<bool>;

    /// Remove a set member. Returns true if it was present.
    async fn srem(&self, key: &str, member: &str) -> Result<bool>;

    /// Append to a list, returning the new length.
    async fn rpush(&self, key: &str, value: &str) -> Result<usize>;

    /// List slice with inclusive bounds; negative indices count from the end.
    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>>;

    /// Remove every occurrence of `value` from a list, returning the count removed.
    async fn lrem(&self, key: &str, value: &str) -> Result<usize>;
}
