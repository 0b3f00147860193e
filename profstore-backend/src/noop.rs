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

use std::time::Duration;

use profstore_common::error::Result;

use crate::backend::KvBackend;

/// A backend that accepts every write and forgets it at once.
///
/// Useful to keep the profiler wiring in place while profiling storage is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBackend;

impl KvBackend for NoopBackend {
    async fn hset(&self, _: &str, _: &str, _: Vec<u8>) -> Result<()> {
        Ok(())
    }

    async fn hget(&self, _: &str, _: &str) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn hgetall(&self, _: &str) -> Result<Vec<(String, Vec<u8>)>> {
        Ok(vec![])
    }

    async fn hdel(&self, _: &str, _: &[String]) -> Result<usize> {
        Ok(0)
    }

    async fn sadd(&self, _: &str, _: &str) -> Result<bool> {
        Ok(true)
    }

    async fn srem(&self, _: &str, _: &str) -> Result<bool> {
        Ok(false)
    }

    async fn smembers(&self, _: &str) -> Result<Vec<String>> {
        Ok(vec![])
    }

    async fn expire(&self, _: &str, _: Duration) -> Result<bool> {
        Ok(false)
    }

    async fn ttl(&self, _: &str) -> Result<Option<Duration>> {
        Ok(None)
    }
}
