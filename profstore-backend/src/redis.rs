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

use std::{collections::HashMap, fmt::Debug, time::Duration};

use profstore_common::error::{Error, Result};
use redis::{aio::ConnectionManager, RedisError};

use crate::backend::KvBackend;

fn map_err<'a>(op: &'static str, key: &'a str) -> impl FnOnce(RedisError) -> Error + 'a {
    move |e| {
        let err = if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout() {
            Error::connection(e)
        } else {
            Error::backend(e)
        };
        err.with_context("op", op).with_context("key", key)
    }
}

/// Redis backend over a multiplexed, auto-reconnecting connection.
///
/// Each primitive is a single redis command. Expiry uses `PEXPIRE`/`PTTL`, so TTLs keep millisecond precision.
#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
}

impl Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend").finish_non_exhaustive()
    }
}

impl RedisBackend {
    /// Connect to the redis server at `url`, e.g. `redis://127.0.0.1:6379/0`.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| Error::connection(e).with_context("url", url))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| Error::connection(e).with_context("url", url))?;
        tracing::debug!("[redis backend]: connected to {url}");
        Ok(Self::new(conn))
    }

    /// Use an established connection manager.
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

impl KvBackend for RedisBackend {
    async fn hset(&self, key: &str, field: &str, value: Vec<u8>) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: i64 = redis::cmd("HSET")
            .arg(key)
            .arg(field)
            .arg(value)
            .query_async(&mut conn)
            .await
            .map_err(map_err("hset", key))?;
        Ok(())
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        redis::cmd("HGET")
            .arg(key)
            .arg(field)
            .query_async(&mut conn)
            .await
            .map_err(map_err("hget", key))
    }

    async fn hgetall(&self, key: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let mut conn = self.conn.clone();
        let all: HashMap<String, Vec<u8>> = redis::cmd("HGETALL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(map_err("hgetall", key))?;
        Ok(all.into_iter().collect())
    }

    async fn hdel(&self, key: &str, fields: &[String]) -> Result<usize> {
        // `HDEL` without fields is a syntax error.
        if fields.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        redis::cmd("HDEL")
            .arg(key)
            .arg(fields)
            .query_async(&mut conn)
            .await
            .map_err(map_err("hdel", key))
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        redis::cmd("SADD")
            .arg(key)
            .arg(member)
            .query_async(&mut conn)
            .await
            .map_err(map_err("sadd", key))
    }

    async fn srem(&self, key: &str, member: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        redis::cmd("SREM")
            .arg(key)
            .arg(member)
            .query_async(&mut conn)
            .await
            .map_err(map_err("srem", key))
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        redis::cmd("SMEMBERS")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(map_err("smembers", key))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        redis::cmd("PEXPIRE")
            .arg(key)
            .arg(millis)
            .query_async(&mut conn)
            .await
            .map_err(map_err("expire", key))
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let mut conn = self.conn.clone();
        let millis: i64 = redis::cmd("PTTL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(map_err("ttl", key))?;
        // -2: no such key, -1: no expiry.
        Ok(u64::try_from(millis).ok().map(Duration::from_millis))
    }
}
