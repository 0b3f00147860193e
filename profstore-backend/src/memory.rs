// Copyright 2026 profstore Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use parking_lot::Mutex;
use profstore_common::error::{Error, ErrorKind, Result};
use tokio::time::Instant;

use crate::backend::KvBackend;

#[derive(Debug)]
enum Value {
    Hash(HashMap<String, Vec<u8>>),
    Set(HashSet<String>),
}

#[derive(Debug)]
struct Slot {
    value: Value,
    expire_at: Option<Instant>,
}

impl Slot {
    fn new(value: Value) -> Self {
        Self { value, expire_at: None }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expire_at.is_some_and(|at| at <= now)
    }
}

fn wrong_type(key: &str) -> Error {
    Error::new(
        ErrorKind::Backend,
        "WRONGTYPE operation against a key holding the wrong kind of value",
    )
    .with_context("key", key)
}

/// Remove `key` if its TTL has passed.
fn purge(map: &mut HashMap<String, Slot>, key: &str, now: Instant) {
    if map.get(key).is_some_and(|slot| slot.is_expired(now)) {
        map.remove(key);
    }
}

/// In-process key-value backend.
///
/// Expired keys are dropped lazily when they are touched. Clones share the same data, so one [`MemoryBackend`] can
/// back several profile stores in a single process, or in tests.
///
/// Time is measured with [`tokio::time::Instant`], so TTLs follow a paused tokio clock.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<HashMap<String, Slot>>>,
}

impl MemoryBackend {
    /// Create an empty in-process backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if `key` exists and has not expired.
    pub fn contains_key(&self, key: &str) -> bool {
        let mut map = self.inner.lock();
        purge(&mut map, key, Instant::now());
        map.contains_key(key)
    }
}

impl KvBackend for MemoryBackend {
    async fn hset(&self, key: &str, field: &str, value: Vec<u8>) -> Result<()> {
        let mut map = self.inner.lock();
        purge(&mut map, key, Instant::now());
        let slot = map
            .entry(key.to_string())
            .or_insert_with(|| Slot::new(Value::Hash(HashMap::new())));
        match &mut slot.value {
            Value::Hash(hash) => {
                hash.insert(field.to_string(), value);
                Ok(())
            }
            Value::Set(_) => Err(wrong_type(key)),
        }
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
        let mut map = self.inner.lock();
        purge(&mut map, key, Instant::now());
        match map.get(key).map(|slot| &slot.value) {
            None => Ok(None),
            Some(Value::Hash(hash)) => Ok(hash.get(field).cloned()),
            Some(Value::Set(_)) => Err(wrong_type(key)),
        }
    }

    async fn hgetall(&self, key: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let mut map = self.inner.lock();
        purge(&mut map, key, Instant::now());
        match map.get(key).map(|slot| &slot.value) {
            None => Ok(vec![]),
            Some(Value::Hash(hash)) => Ok(hash.iter().map(|(f, v)| (f.clone(), v.clone())).collect()),
            Some(Value::Set(_)) => Err(wrong_type(key)),
        }
    }

    async fn hdel(&self, key: &str, fields: &[String]) -> Result<usize> {
        let mut map = self.inner.lock();
        purge(&mut map, key, Instant::now());
        let (removed, empty) = match map.get_mut(key).map(|slot| &mut slot.value) {
            None => return Ok(0),
            Some(Value::Hash(hash)) => {
                let removed = fields.iter().filter(|field| hash.remove(field.as_str()).is_some()).count();
                (removed, hash.is_empty())
            }
            Some(Value::Set(_)) => return Err(wrong_type(key)),
        };
        // Like redis, a hash without fields is no key at all.
        if empty {
            map.remove(key);
        }
        Ok(removed)
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<bool> {
        let mut map = self.inner.lock();
        purge(&mut map, key, Instant::now());
        let slot = map
            .entry(key.to_string())
            .or_insert_with(|| Slot::new(Value::Set(HashSet::new())));
        match &mut slot.value {
            Value::Set(set) => Ok(set.insert(member.to_string())),
            Value::Hash(_) => Err(wrong_type(key)),
        }
    }

    async fn srem(&self, key: &str, member: &str) -> Result<bool> {
        let mut map = self.inner.lock();
        purge(&mut map, key, Instant::now());
        let (removed, empty) = match map.get_mut(key).map(|slot| &mut slot.value) {
            None => return Ok(false),
            Some(Value::Set(set)) => (set.remove(member), set.is_empty()),
            Some(Value::Hash(_)) => return Err(wrong_type(key)),
        };
        if empty {
            map.remove(key);
        }
        Ok(removed)
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let mut map = self.inner.lock();
        purge(&mut map, key, Instant::now());
        match map.get(key).map(|slot| &slot.value) {
            None => Ok(vec![]),
            Some(Value::Set(set)) => Ok(set.iter().cloned().collect()),
            Some(Value::Hash(_)) => Err(wrong_type(key)),
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut map = self.inner.lock();
        let now = Instant::now();
        purge(&mut map, key, now);
        if ttl.is_zero() {
            return Ok(map.remove(key).is_some());
        }
        match map.get_mut(key) {
            None => Ok(false),
            Some(slot) => {
                // A TTL past the clock's range never fires.
                slot.expire_at = now.checked_add(ttl);
                Ok(true)
            }
        }
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let mut map = self.inner.lock();
        let now = Instant::now();
        purge(&mut map, key, now);
        Ok(map
            .get(key)
            .and_then(|slot| slot.expire_at)
            .map(|at| at.saturating_duration_since(now)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash() {
        let backend = MemoryBackend::new();

        backend.hset("h", "a", b"1".to_vec()).await.unwrap();
        backend.hset("h", "b", b"2".to_vec()).await.unwrap();
        backend.hset("h", "a", b"3".to_vec()).await.unwrap();

        assert_eq!(backend.hget("h", "a").await.unwrap(), Some(b"3".to_vec()));
        assert_eq!(backend.hget("h", "c").await.unwrap(), None);
        assert_eq!(backend.hget("missing", "a").await.unwrap(), None);

        let mut all = backend.hgetall("h").await.unwrap();
        all.sort();
        assert_eq!(all, vec![("a".to_string(), b"3".to_vec()), ("b".to_string(), b"2".to_vec())]);

        let removed = backend
            .hdel("h", &["a".to_string(), "c".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(backend.contains_key("h"));

        assert_eq!(backend.hdel("h", &["b".to_string()]).await.unwrap(), 1);
        assert!(!backend.contains_key("h"));
        assert!(backend.hgetall("h").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set() {
        let backend = MemoryBackend::new();

        assert!(backend.sadd("s", "x").await.unwrap());
        assert!(!backend.sadd("s", "x").await.unwrap());
        assert!(backend.sadd("s", "y").await.unwrap());

        let mut members = backend.smembers("s").await.unwrap();
        members.sort();
        assert_eq!(members, vec!["x".to_string(), "y".to_string()]);

        assert!(backend.srem("s", "x").await.unwrap());
        assert!(!backend.srem("s", "x").await.unwrap());
        assert!(backend.srem("s", "y").await.unwrap());
        assert!(!backend.contains_key("s"));
        assert!(backend.smembers("s").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_type() {
        let backend = MemoryBackend::new();

        backend.sadd("k", "x").await.unwrap();
        let err = backend.hset("k", "f", vec![]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Backend);
        assert!(backend.hgetall("k").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire() {
        let backend = MemoryBackend::new();

        assert!(!backend.expire("s", Duration::from_secs(10)).await.unwrap());
        assert_eq!(backend.ttl("s").await.unwrap(), None);

        backend.sadd("s", "x").await.unwrap();
        assert_eq!(backend.ttl("s").await.unwrap(), None);
        assert!(backend.expire("s", Duration::from_secs(10)).await.unwrap());
        assert_eq!(backend.ttl("s").await.unwrap(), Some(Duration::from_secs(10)));

        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(backend.ttl("s").await.unwrap(), Some(Duration::from_secs(6)));
        // Writes do not touch the TTL.
        backend.sadd("s", "y").await.unwrap();
        assert_eq!(backend.ttl("s").await.unwrap(), Some(Duration::from_secs(6)));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(!backend.contains_key("s"));
        assert!(backend.smembers("s").await.unwrap().is_empty());

        // A key recreated after expiry starts without TTL.
        backend.sadd("s", "z").await.unwrap();
        assert_eq!(backend.ttl("s").await.unwrap(), None);
        assert!(backend.expire("s", Duration::ZERO).await.unwrap());
        assert!(!backend.contains_key("s"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire_huge_ttl() {
        let backend = MemoryBackend::new();

        backend.sadd("s", "x").await.unwrap();
        assert!(backend.expire("s", Duration::MAX).await.unwrap());
        assert_eq!(backend.ttl("s").await.unwrap(), None);

        tokio::time::advance(Duration::from_secs(3600)).await;
        assert!(backend.contains_key("s"));
    }
}
