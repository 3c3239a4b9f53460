//! In-memory key-value backend.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{glob_match, KeyValueStore};
use crate::{Result, TempMailError};

/// Default upper bound for acquiring the store lock.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Hash(HashMap<String, String>),
    Set(HashSet<String>),
    List(Vec<String>),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Hash(_) => "hash",
            Value::Set(_) => "set",
            Value::List(_) => "list",
        }
    }

    fn is_empty_collection(&self) -> bool {
        match self {
            Value::Str(_) => false,
            Value::Hash(h) => h.is_empty(),
            Value::Set(s) => s.is_empty(),
            Value::List(l) => l.is_empty(),
        }
    }
}

#[derive(Debug)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

type Entries = HashMap<String, Entry>;

fn wrong_type(key: &str, found: &Value) -> TempMailError {
    TempMailError::Serialization(format!(
        "WRONGTYPE key {key} holds a {} value",
        found.type_name()
    ))
}

/// Live entry for `key`, treating an expired entry as absent.
fn live<'a>(entries: &'a Entries, key: &str) -> Option<&'a Entry> {
    entries.get(key).filter(|e| !e.is_expired(Instant::now()))
}

/// Mutable live entry for `key`, dropping it first if it has expired.
fn live_mut<'a>(entries: &'a mut Entries, key: &str) -> Option<&'a mut Entry> {
    if entries.get(key).is_some_and(|e| e.is_expired(Instant::now())) {
        entries.remove(key);
    }
    entries.get_mut(key)
}

/// Remove `key` if its collection became empty.
fn drop_if_empty(entries: &mut Entries, key: &str) {
    if entries.get(key).is_some_and(|e| e.value.is_empty_collection()) {
        entries.remove(key);
    }
}

/// Resolve Redis-style inclusive range bounds against a list length.
fn resolve_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if len == 0 || start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

/// Process-local key-value store.
///
/// All data lives behind one async `RwLock`; each call is a single critical
/// section, so individual operations are atomic. Lock acquisition is bounded
/// by a timeout and reported as `StoreUnavailable` when it elapses.
pub struct MemoryStore {
    entries: RwLock<Entries>,
    timeout: Duration,
}

impl MemoryStore {
    /// Create an empty store with the default timeout.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create an empty store with a custom call timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            timeout,
        }
    }

    async fn read(&self) -> Result<RwLockReadGuard<'_, Entries>> {
        tokio::time::timeout(self.timeout, self.entries.read())
            .await
            .map_err(|_| TempMailError::StoreUnavailable("timed out waiting for store".into()))
    }

    async fn write(&self) -> Result<RwLockWriteGuard<'_, Entries>> {
        tokio::time::timeout(self.timeout, self.entries.write())
            .await
            .map_err(|_| TempMailError::StoreUnavailable("timed out waiting for store".into()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.read().await?;
        match live(&entries, key).map(|e| &e.value) {
            None => Ok(None),
            Some(Value::Str(s)) => Ok(Some(s.clone())),
            Some(other) => Err(wrong_type(key, other)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.write().await?;
        entries.insert(key.to_string(), Entry::new(Value::Str(value.to_string())));
        Ok(())
    }

    async fn del(&self, keys: &[&str]) -> Result<usize> {
        let mut entries = self.write().await?;
        let now = Instant::now();
        let removed = keys
            .iter()
            .filter_map(|key| entries.remove(*key))
            .filter(|e| !e.is_expired(now))
            .count();
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let entries = self.read().await?;
        Ok(live(&entries, key).is_some())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut entries = self.write().await?;
        match live_mut(&mut entries, key) {
            Some(entry) => {
                entry.expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let entries = self.read().await?;
        Ok(live(&entries, key)
            .and_then(|e| e.expires_at)
            .map(|at| at.saturating_duration_since(Instant::now())))
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut entries = self.write().await?;
        let now = Instant::now();
        entries.retain(|_, e| !e.is_expired(now));

        let mut keys: Vec<String> = entries
            .keys()
            .filter(|k| glob_match(pattern, k))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn hset(&self, key: &str, fields: &[(&str, &str)]) -> Result<usize> {
        let mut entries = self.write().await?;
        if live_mut(&mut entries, key).is_none() {
            entries.insert(key.to_string(), Entry::new(Value::Hash(HashMap::new())));
        }
        let entry = entries
            .get_mut(key)
            .ok_or_else(|| TempMailError::StoreUnavailable(format!("lost key {key}")))?;
        match &mut entry.value {
            Value::Hash(hash) => Ok(fields
                .iter()
                .filter(|(f, v)| hash.insert(f.to_string(), v.to_string()).is_none())
                .count()),
            other => Err(wrong_type(key, other)),
        }
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        let entries = self.read().await?;
        match live(&entries, key).map(|e| &e.value) {
            None => Ok(None),
            Some(Value::Hash(hash)) => Ok(hash.get(field).cloned()),
            Some(other) => Err(wrong_type(key, other)),
        }
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        let entries = self.read().await?;
        match live(&entries, key).map(|e| &e.value) {
            None => Ok(HashMap::new()),
            Some(Value::Hash(hash)) => Ok(hash.clone()),
            Some(other) => Err(wrong_type(key, other)),
        }
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool> {
        let mut entries = self.write().await?;
        let removed = match live_mut(&mut entries, key).map(|e| &mut e.value) {
            None => false,
            Some(Value::Hash(hash)) => hash.remove(field).is_some(),
            Some(other) => return Err(wrong_type(key, other)),
        };
        drop_if_empty(&mut entries, key);
        Ok(removed)
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<bool> {
        let mut entries = self.write().await?;
        if live_mut(&mut entries, key).is_none() {
            entries.insert(key.to_string(), Entry::new(Value::Set(HashSet::new())));
        }
        match entries.get_mut(key).map(|e| &mut e.value) {
            Some(Value::Set(set)) => Ok(set.insert(member.to_string())),
            Some(other) => Err(wrong_type(key, other)),
            None => Err(TempMailError::StoreUnavailable(format!("lost key {key}"))),
        }
    }

    async fn smembers(&self, key: &str) -> Result<HashSet<String>> {
        let entries = self.read().await?;
        match live(&entries, key).map(|e| &e.value) {
            None => Ok(HashSet::new()),
            Some(Value::Set(set)) => Ok(set.clone()),
            Some(other) => Err(wrong_type(key, other)),
        }
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        let entries = self.read().await?;
        match live(&entries, key).map(|e| &e.value) {
            None => Ok(false),
            Some(Value::Set(set)) => Ok(set.contains(member)),
            Some(other) => Err(wrong_type(key, other)),
        }
    }

    async fn srem(&self, key: &str, member: &str) -> Result<bool> {
        let mut entries = self.write().await?;
        let removed = match live_mut(&mut entries, key).map(|e| &mut e.value) {
            None => false,
            Some(Value::Set(set)) => set.remove(member),
            Some(other) => return Err(wrong_type(key, other)),
        };
        drop_if_empty(&mut entries, key);
        Ok(removed)
    }

    async fn rpush(&self, key: &str, value: &str) -> Result<usize> {
        let mut entries = self.write().await?;
        if live_mut(&mut entries, key).is_none() {
            entries.insert(key.to_string(), Entry::new(Value::List(Vec::new())));
        }
        match entries.get_mut(key).map(|e| &mut e.value) {
            Some(Value::List(list)) => {
                list.push(value.to_string());
                Ok(list.len())
            }
            Some(other) => Err(wrong_type(key, other)),
            None => Err(TempMailError::StoreUnavailable(format!("lost key {key}"))),
        }
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        let entries = self.read().await?;
        match live(&entries, key).map(|e| &e.value) {
            None => Ok(Vec::new()),
            Some(Value::List(list)) => Ok(resolve_range(list.len(), start, stop)
                .map(|(from, to)| list[from..=to].to_vec())
                .unwrap_or_default()),
            Some(other) => Err(wrong_type(key, other)),
        }
    }

    async fn lrem(&self, key: &str, value: &str) -> Result<usize> {
        let mut entries = self.write().await?;
        let removed = match live_mut(&mut entries, key).map(|e| &mut e.value) {
            None => 0,
            Some(Value::List(list)) => {
                let before = list.len();
                list.retain(|v| v != value);
                before - list.len()
            }
            Some(other) => return Err(wrong_type(key, other)),
        };
        drop_if_empty(&mut entries, key);
        Ok(removed)
    }
}
