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

use std::{fmt::Debug, future::Future, time::Duration};

use profstore_common::error::Result;

/// The key-value service the profile store is built on.
///
/// The primitives mirror a Redis-like store: hashes, sets, and per-key expiry. Every primitive is expected to be
/// atomic on its own. Nothing is assumed across primitives.
///
/// Implementations are shared by all clones of a profile store and are called concurrently.
pub trait KvBackend: Send + Sync + 'static + Debug {
    /// Set `field` of the hash at `key` to `value`, creating the hash if absent.
    #[must_use]
    fn hset(&self, key: &str, field: &str, value: Vec<u8>) -> impl Future<Output = Result<()>> + Send;

    /// Get `field` of the hash at `key`.
    #[must_use]
    fn hget(&self, key: &str, field: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Get all fields and values of the hash at `key`, in no particular order.
    ///
    /// A missing key is an empty hash.
    #[must_use]
    fn hgetall(&self, key: &str) -> impl Future<Output = Result<Vec<(String, Vec<u8>)>>> + Send;

    /// Delete `fields` from the hash at `key` in one request, returning how many fields were removed.
    #[must_use]
    fn hdel(&self, key: &str, fields: &[String]) -> impl Future<Output = Result<usize>> + Send;

    /// Add `member` to the set at `key`, creating the set if absent.
    ///
    /// Returns `true` if the member is newly added.
    #[must_use]
    fn sadd(&self, key: &str, member: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Remove `member` from the set at `key`.
    ///
    /// Returns `true` if the member was present.
    #[must_use]
    fn srem(&self, key: &str, member: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Get all members of the set at `key`, in no particular order.
    ///
    /// A missing key is an empty set.
    #[must_use]
    fn smembers(&self, key: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Expire the whole `key` after `ttl` from now, replacing any previous TTL.
    ///
    /// Returns `false` if the key does not exist.
    #[must_use]
    fn expire(&self, key: &str, ttl: Duration) -> impl Future<Output = Result<bool>> + Send;

    /// Get the remaining TTL of `key`.
    ///
    /// Returns `None` if the key does not exist or has no TTL.
    #[must_use]
    fn ttl(&self, key: &str) -> impl Future<Output = Result<Option<Duration>>> + Send;
}
