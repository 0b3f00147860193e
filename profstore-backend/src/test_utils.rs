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

//! Test utils for the `profstore-backend` crate.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use parking_lot::Mutex;
use profstore_common::error::{Error, ErrorKind, Result};

use crate::backend::KvBackend;

/// A backend wrapper that fails every command while switched off.
#[derive(Debug, Clone)]
pub struct FaultyBackend<B> {
    inner: B,
    failing: Arc<AtomicBool>,
}

impl<B> FaultyBackend<B> {
    /// Wrap `inner`. The wrapper starts healthy.
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            failing: Arc::default(),
        }
    }

    /// Make every following command fail, or succeed again.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }

    /// Get the wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    fn check(&self, op: &'static str) -> Result<()> {
        if self.failing.load(Ordering::Acquire) {
            return Err(Error::new(ErrorKind::Connection, "injected fault").with_context("op", op));
        }
        Ok(())
    }
}

impl<B: KvBackend> KvBackend for FaultyBackend<B> {
    async fn hset(&self, key: &str, field: &str, value: Vec<u8>) -> Result<()> {
        self.check("hset")?;
        self.inner.hset(key, field, value).await
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
        self.check("hget")?;
        self.inner.hget(key, field).await
    }

    async fn hgetall(&self, key: &str) -> Result<Vec<(String, Vec<u8>)>> {
        self.check("hgetall")?;
        self.inner.hgetall(key).await
    }

    async fn hdel(&self, key: &str, fields: &[String]) -> Result<usize> {
        self.check("hdel")?;
        self.inner.hdel(key, fields).await
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<bool> {
        self.check("sadd")?;
        self.inner.sadd(key, member).await
    }

    async fn srem(&self, key: &str, member: &str) -> Result<bool> {
        self.check("srem")?;
        self.inner.srem(key, member).await
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        self.check("smembers")?;
        self.inner.smembers(key).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.check("expire")?;
        self.inner.expire(key, ttl).await
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        self.check("ttl")?;
        self.inner.ttl(key).await
    }
}

/// A backend wrapper that records the name of every command it forwards.
#[derive(Debug, Clone)]
pub struct RecordingBackend<B> {
    inner: B,
    ops: Arc<Mutex<Vec<&'static str>>>,
}

impl<B> RecordingBackend<B> {
    /// Wrap `inner`.
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            ops: Arc::default(),
        }
    }

    /// Get the wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Commands forwarded so far, in order.
    pub fn ops(&self) -> Vec<&'static str> {
        self.ops.lock().clone()
    }

    /// Count of forwarded commands named `op`.
    pub fn count(&self, op: &str) -> usize {
        self.ops.lock().iter().filter(|o| **o == op).count()
    }

    /// Forget the recorded commands.
    pub fn clear(&self) {
        self.ops.lock().clear();
    }

    fn record(&self, op: &'static str) {
        self.ops.lock().push(op);
    }
}

impl<B: KvBackend> KvBackend for RecordingBackend<B> {
    async fn hset(&self, key: &str, field: &str, value: Vec<u8>) -> Result<()> {
        self.record("hset");
        self.inner.hset(key, field, value).await
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
        self.record("hget");
        self.inner.hget(key, field).await
    }

    async fn hgetall(&self, key: &str) -> Result<Vec<(String, Vec<u8>)>> {
        self.record("hgetall");
        self.inner.hgetall(key).await
    }

    async fn hdel(&self, key: &str, fields: &[String]) -> Result<usize> {
        self.record("hdel");
        self.inner.hdel(key, fields).await
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<bool> {
        self.record("sadd");
        self.inner.sadd(key, member).await
    }

    async fn srem(&self, key: &str, member: &str) -> Result<bool> {
        self.record("srem");
        self.inner.srem(key, member).await
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        self.record("smembers");
        self.inner.smembers(key).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.record("expire");
        self.inner.expire(key, ttl).await
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        self.record("ttl");
        self.inner.ttl(key).await
    }
}
