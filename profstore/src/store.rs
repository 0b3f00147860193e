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
    fmt::Debug,
    future::Future,
    marker::PhantomData,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use itertools::Itertools;
use profstore_backend::KvBackend;
use profstore_common::{
    code::Code,
    error::{Error, ErrorKind, Result},
    metrics::model::{Metrics, Op},
};

use crate::{
    namespace::Namespace,
    record::{Profile, ProfileId, ProfileRecord},
    sweep::SweepGate,
};

/// Order of the ids returned by [`ProfileStore::list`], by record start time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListOrder {
    /// Oldest first.
    Ascending,
    /// Newest first.
    #[default]
    Descending,
}

/// Query of [`ProfileStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Maximum count of returned ids.
    pub max_results: usize,
    /// Only records that started strictly after.
    pub since: Option<DateTime<Utc>>,
    /// Only records that started strictly before.
    pub until: Option<DateTime<Utc>>,
    /// Order by start time.
    pub order: ListOrder,
}

impl ListQuery {
    /// Query the newest `max_results` records.
    pub fn new(max_results: usize) -> Self {
        Self {
            max_results,
            since: None,
            until: None,
            order: ListOrder::default(),
        }
    }

    /// Only list records that started strictly after `since`.
    pub fn with_since<Tz: TimeZone>(mut self, since: DateTime<Tz>) -> Self {
        self.since = Some(since.with_timezone(&Utc));
        self
    }

    /// Only list records that started strictly before `until`.
    pub fn with_until<Tz: TimeZone>(mut self, until: DateTime<Tz>) -> Self {
        self.until = Some(until.with_timezone(&Utc));
        self
    }

    /// Set the order.
    pub fn with_order(mut self, order: ListOrder) -> Self {
        self.order = order;
        self
    }

    fn contains(&self, started_at: DateTime<Utc>) -> bool {
        self.since.is_none_or(|since| since < started_at) && self.until.is_none_or(|until| started_at < until)
    }
}

/// Records fetched from the results collection, split by state.
struct Snapshot<R> {
    /// Live records with their field names.
    live: Vec<(String, R)>,
    /// Fields that cannot be decoded.
    broken: Vec<String>,
    /// Count of expired fields removed.
    swept: usize,
}

pub(crate) struct ProfileStoreConfig<B> {
    pub name: String,
    pub backend: B,
    pub namespace: Namespace,
    pub cache_duration: Duration,
    pub sweep_interval: Option<Duration>,
    pub metrics: Arc<Metrics>,
}

struct Inner<B> {
    name: String,
    backend: B,
    namespace: Namespace,
    cache_duration_ms: AtomicU64,
    gate: SweepGate,
    metrics: Arc<Metrics>,
}

/// Shared storage of profiling records over a [`KvBackend`].
///
/// All clones share the same backend handle and configuration. Nothing is locked in-process, concurrent
/// operations only rely on the atomicity of each backend command.
///
/// Records expire `cache_duration` after they started. Expired records are removed lazily by the sweep that runs
/// with [`ProfileStore::load`] and [`ProfileStore::list`], and are never returned by them.
pub struct ProfileStore<B, R = Profile> {
    inner: Arc<Inner<B>>,
    _marker: PhantomData<fn() -> R>,
}

impl<B, R> Debug for ProfileStore<B, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileStore")
            .field("name", &self.inner.name)
            .field("namespace", &self.inner.namespace)
            .field("cache_duration", &self.cache_duration())
            .finish()
    }
}

impl<B, R> Clone for ProfileStore<B, R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

/// Longest cache duration a store accepts. Longer ones are clamped.
///
/// Keeps TTLs and start time horizons within what backends and clocks represent.
pub const MAX_CACHE_DURATION: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX).max(1)
}

fn clamp_cache_duration(name: &str, cache_duration: Duration) -> Duration {
    if cache_duration > MAX_CACHE_DURATION {
        tracing::warn!(
            "[profile store]: clamp cache duration {cache_duration:?} of {name} to {MAX_CACHE_DURATION:?}"
        );
        return MAX_CACHE_DURATION;
    }
    cache_duration
}

impl<B, R> ProfileStore<B, R> {
    pub(crate) fn new(config: ProfileStoreConfig<B>) -> Self {
        let cache_duration = clamp_cache_duration(&config.name, config.cache_duration);
        let inner = Inner {
            name: config.name,
            backend: config.backend,
            namespace: config.namespace,
            cache_duration_ms: AtomicU64::new(duration_to_millis(cache_duration)),
            gate: SweepGate::new(config.sweep_interval),
            metrics: config.metrics,
        };
        Self {
            inner: Arc::new(inner),
            _marker: PhantomData,
        }
    }

    /// Name of the store instance.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Keys of the store in the backend.
    pub fn namespace(&self) -> &Namespace {
        &self.inner.namespace
    }

    /// How long records and unviewed sets live.
    pub fn cache_duration(&self) -> Duration {
        Duration::from_millis(self.inner.cache_duration_ms.load(Ordering::Relaxed))
    }

    /// Change how long records and unviewed sets live.
    ///
    /// Takes effect for the following operations. Records already stored are judged by the new duration. The TTL
    /// of unviewed sets that already expire is kept. A zero duration is ignored, one longer than
    /// [`MAX_CACHE_DURATION`] is clamped.
    pub fn set_cache_duration(&self, cache_duration: Duration) {
        if cache_duration.is_zero() {
            tracing::warn!("[profile store]: ignore zero cache duration for {}", self.inner.name);
            return;
        }
        let cache_duration = clamp_cache_duration(&self.inner.name, cache_duration);
        self.inner
            .cache_duration_ms
            .store(duration_to_millis(cache_duration), Ordering::Relaxed);
    }

    /// Records that started before the horizon are expired.
    fn horizon(&self) -> DateTime<Utc> {
        let delta = TimeDelta::from_std(self.cache_duration()).unwrap_or(TimeDelta::MAX);
        Utc::now().checked_sub_signed(delta).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    async fn instrument<T>(&self, op: Op, f: impl Future<Output = Result<T>>) -> Result<T> {
        let now = Instant::now();
        let res = f.await;

        let metrics = self.inner.metrics.op(op);
        metrics.total.increase(1);
        metrics.duration.record(now.elapsed().as_secs_f64());
        if res.is_err() {
            metrics.error.increase(1);
        }

        res
    }

    fn degrade<T: Default>(&self, op: Op, res: Result<T>) -> T {
        res.unwrap_or_else(|e| {
            tracing::warn!(
                "[profile store]: {op} on {name} failed, degrade to default, error: {e}",
                op = op.as_str(),
                name = self.inner.name,
            );
            T::default()
        })
    }
}

impl<B, R> ProfileStore<B, R>
where
    B: KvBackend,
    R: ProfileRecord,
{
    /// Store `record` under its id, replacing any record with the same id.
    ///
    /// The whole results collection expires `cache_duration` after the last save.
    pub async fn save(&self, record: &R) {
        let res = self.try_save(record).await;
        self.degrade(Op::Save, res)
    }

    /// Fallible [`ProfileStore::save`].
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "profstore::store::save"))]
    pub async fn try_save(&self, record: &R) -> Result<()> {
        self.instrument(Op::Save, async {
            let buf = record.encode_to_vec()?;
            let key = self.inner.namespace.results_key();
            self.inner.backend.hset(key, &record.id().to_string(), buf).await?;
            self.inner.backend.expire(key, self.cache_duration()).await?;
            Ok(())
        })
        .await
    }

    /// Load the record with `id`.
    ///
    /// Returns `None` if the record is missing, expired, or cannot be decoded, or if the backend fails.
    pub async fn load(&self, id: ProfileId) -> Option<R> {
        let res = self.try_load(id).await;
        self.degrade(Op::Load, res)
    }

    /// Fallible [`ProfileStore::load`].
    ///
    /// A record that cannot be decoded is a [`ErrorKind::Codec`] error.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "profstore::store::load"))]
    pub async fn try_load(&self, id: ProfileId) -> Result<Option<R>> {
        let res = self
            .instrument(Op::Load, async {
                let field = id.to_string();

                if self.inner.gate.try_enter() {
                    let snapshot = self.snapshot(true).await?;
                    if snapshot.broken.contains(&field) {
                        return Err(Error::new(ErrorKind::Codec, "undecodable record").with_context("id", id));
                    }
                    let record = snapshot.live.into_iter().find(|(f, _)| *f == field).map(|(_, r)| r);
                    return Ok(record);
                }

                let key = self.inner.namespace.results_key();
                let Some(buf) = self.inner.backend.hget(key, &field).await? else {
                    return Ok(None);
                };
                let record = R::decode_from_slice(&buf).map_err(|e| e.with_context("id", id))?;
                // Not swept yet.
                if record.started_at() < self.horizon() {
                    return Ok(None);
                }
                Ok(Some(record))
            })
            .await;

        if let Ok(record) = &res {
            match record {
                Some(_) => self.inner.metrics.load_hit.increase(1),
                None => self.inner.metrics.load_miss.increase(1),
            }
        }
        res
    }

    /// List ids of live records matching `query`.
    ///
    /// Returns an empty list if the backend fails.
    pub async fn list(&self, query: &ListQuery) -> Vec<ProfileId> {
        let res = self.try_list(query).await;
        self.degrade(Op::List, res)
    }

    /// Fallible [`ProfileStore::list`].
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "profstore::store::list"))]
    pub async fn try_list(&self, query: &ListQuery) -> Result<Vec<ProfileId>> {
        self.instrument(Op::List, async {
            let sweep = self.inner.gate.try_enter();
            let snapshot = self.snapshot(sweep).await?;

            let mut records = snapshot
                .live
                .into_iter()
                .map(|(_, record)| record)
                .filter(|record| query.contains(record.started_at()))
                .collect_vec();
            // Stable, ties keep the fetch order.
            match query.order {
                ListOrder::Ascending => records.sort_by_key(|record| record.started_at()),
                ListOrder::Descending => records.sort_by(|a, b| b.started_at().cmp(&a.started_at())),
            }

            Ok(records
                .into_iter()
                .take(query.max_results)
                .map(|record| record.id())
                .collect_vec())
        })
        .await
    }

    /// Remove all expired records now, regardless of the sweep interval.
    ///
    /// Returns the count of removed records.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "profstore::store::sweep"))]
    pub async fn try_sweep(&self) -> Result<usize> {
        self.instrument(Op::Sweep, async {
            self.inner.gate.mark();
            let snapshot = self.snapshot(true).await?;
            Ok(snapshot.swept)
        })
        .await
    }

    /// Fetch the whole results collection, removing expired records in one batch if `sweep` is set.
    ///
    /// Expired records are never part of the snapshot. Undecodable fields are left for the collection TTL.
    async fn snapshot(&self, sweep: bool) -> Result<Snapshot<R>> {
        let res = self.fetch_snapshot(sweep).await;
        if sweep && res.is_err() {
            // A failed sweep is retried by the next read.
            self.inner.gate.reset();
        }
        res
    }

    async fn fetch_snapshot(&self, sweep: bool) -> Result<Snapshot<R>> {
        let key = self.inner.namespace.results_key();
        let horizon = self.horizon();
        let fields = self.inner.backend.hgetall(key).await?;

        let mut live = vec![];
        let mut expired = vec![];
        let mut broken = vec![];
        for (field, buf) in fields {
            match R::decode_from_slice(&buf) {
                Ok(record) if record.started_at() < horizon => expired.push(field),
                Ok(record) => live.push((field, record)),
                Err(e) => {
                    tracing::warn!("[profile store]: skip undecodable record {field} in {key}, error: {e}");
                    broken.push(field);
                }
            }
        }

        let mut swept = 0;
        if sweep && !expired.is_empty() {
            swept = self.inner.backend.hdel(key, &expired).await?;
            self.inner.metrics.swept.increase(swept as u64);
            tracing::debug!(
                "[profile store]: swept {swept} expired records from {key}, {live} live",
                live = live.len()
            );
        }

        Ok(Snapshot { live, broken, swept })
    }

    /// Ids `user` has not viewed yet.
    ///
    /// Returns an empty list if the backend fails.
    pub async fn get_unviewed_ids(&self, user: &str) -> Vec<ProfileId> {
        let res = self.try_get_unviewed_ids(user).await;
        self.degrade(Op::GetUnviewed, res)
    }

    /// Fallible [`ProfileStore::get_unviewed_ids`].
    ///
    /// Members that are not valid ids are skipped.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "profstore::store::get_unviewed_ids"))]
    pub async fn try_get_unviewed_ids(&self, user: &str) -> Result<Vec<ProfileId>> {
        self.instrument(Op::GetUnviewed, async {
            let key = self.inner.namespace.unviewed_key(user);
            let members = self.inner.backend.smembers(&key).await?;
            let ids = members
                .into_iter()
                .filter_map(|member| match ProfileId::parse_str(&member) {
                    Ok(id) => Some(id),
                    Err(e) => {
                        tracing::warn!("[profile store]: skip invalid id {member} in {key}, error: {e}");
                        None
                    }
                })
                .collect_vec();
            Ok(ids)
        })
        .await
    }

    /// Mark `id` as not viewed by `user`.
    ///
    /// The unviewed set of a user expires `cache_duration` after its first id was added. Adding more ids does not
    /// extend it.
    pub async fn set_unviewed(&self, user: &str, id: ProfileId) {
        let res = self.try_set_unviewed(user, id).await;
        self.degrade(Op::SetUnviewed, res)
    }

    /// Fallible [`ProfileStore::set_unviewed`].
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "profstore::store::set_unviewed"))]
    pub async fn try_set_unviewed(&self, user: &str, id: ProfileId) -> Result<()> {
        self.instrument(Op::SetUnviewed, async {
            let key = self.inner.namespace.unviewed_key(user);
            self.inner.backend.sadd(&key, &id.to_string()).await?;
            // Not atomic. Concurrent first adds all set about the same TTL.
            if self.inner.backend.ttl(&key).await?.is_none() {
                self.inner.backend.expire(&key, self.cache_duration()).await?;
            }
            Ok(())
        })
        .await
    }

    /// Mark `id` as viewed by `user`.
    pub async fn set_viewed(&self, user: &str, id: ProfileId) {
        let res = self.try_set_viewed(user, id).await;
        self.degrade(Op::SetViewed, res)
    }

    /// Fallible [`ProfileStore::set_viewed`].
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "profstore::store::set_viewed"))]
    pub async fn try_set_viewed(&self, user: &str, id: ProfileId) -> Result<()> {
        self.try_set_viewed_many(user, [id]).await
    }

    /// Mark all of `ids` as viewed by `user`.
    pub async fn set_viewed_many(&self, user: &str, ids: impl IntoIterator<Item = ProfileId>) {
        let res = self.try_set_viewed_many(user, ids).await;
        self.degrade(Op::SetViewed, res)
    }

    /// Fallible [`ProfileStore::set_viewed_many`].
    ///
    /// Stops at the first failure, ids before it are already marked.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "profstore::store::set_viewed_many"))]
    pub async fn try_set_viewed_many(&self, user: &str, ids: impl IntoIterator<Item = ProfileId>) -> Result<()> {
        let ids = ids.into_iter().map(|id| id.to_string()).collect_vec();
        self.instrument(Op::SetViewed, async {
            let key = self.inner.namespace.unviewed_key(user);
            for id in &ids {
                self.inner.backend.srem(&key, id).await?;
            }
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;
    use profstore_backend::MemoryBackend;

    use super::*;
    use crate::builder::ProfileStoreBuilder;

    fn is_send_sync_static<T: Send + Sync + 'static>() {}

    #[test]
    fn test_send_sync_static() {
        is_send_sync_static::<ProfileStore<MemoryBackend>>();
    }

    #[test]
    fn test_list_query_bounds() {
        let base = Utc::now();
        let query = ListQuery::new(10)
            .with_since(base)
            .with_until(base + TimeDelta::seconds(10));

        assert!(!query.contains(base));
        assert!(query.contains(base + TimeDelta::seconds(1)));
        assert!(!query.contains(base + TimeDelta::seconds(10)));

        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        let query = ListQuery::new(10).with_since(base.with_timezone(&offset));
        assert_eq!(query.since, Some(base));
    }

    #[test]
    fn test_cache_duration() {
        let store: ProfileStore<_> = ProfileStoreBuilder::new()
            .with_cache_duration(Duration::from_secs(60))
            .build(MemoryBackend::new())
            .unwrap();
        assert_eq!(store.cache_duration(), Duration::from_secs(60));

        store.set_cache_duration(Duration::from_millis(1500));
        assert_eq!(store.clone().cache_duration(), Duration::from_millis(1500));

        store.set_cache_duration(Duration::ZERO);
        assert_eq!(store.cache_duration(), Duration::from_millis(1500));

        let horizon = store.horizon();
        let now = Utc::now();
        assert!(horizon < now - TimeDelta::milliseconds(1400));
    }

    #[test]
    fn test_cache_duration_clamp() {
        let store: ProfileStore<_> = ProfileStoreBuilder::new()
            .with_cache_duration(Duration::MAX)
            .build(MemoryBackend::new())
            .unwrap();
        assert_eq!(store.cache_duration(), MAX_CACHE_DURATION);

        store.set_cache_duration(Duration::from_secs(60));
        assert_eq!(store.cache_duration(), Duration::from_secs(60));

        store.set_cache_duration(MAX_CACHE_DURATION + Duration::from_secs(1));
        assert_eq!(store.cache_duration(), MAX_CACHE_DURATION);

        let horizon = store.horizon();
        assert!(horizon > DateTime::<Utc>::MIN_UTC);
        assert!(horizon < Utc::now() - TimeDelta::days(99 * 365));
    }
}
