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

//! Fuzzy test for profstore against an in-process model.

use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};

use chrono::{DateTime, TimeDelta, Utc};
use profstore::{ListOrder, ListQuery, MemoryBackend, Namespace, Profile, ProfileId, ProfileStore, ProfileStoreBuilder};
use rand::{rng, seq::IndexedRandom, Rng};

const OPS: usize = 2000;
const USERS: &[&str] = &["alice", "bob", "carol"];

const CACHE_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Default)]
struct Model {
    records: HashMap<ProfileId, Profile>,
    unviewed: HashMap<&'static str, HashSet<ProfileId>>,
}

impl Model {
    fn live(&self, horizon: DateTime<Utc>) -> impl Iterator<Item = &Profile> {
        self.records.values().filter(move |p| p.started_at >= horizon)
    }

    fn list(&self, horizon: DateTime<Utc>, max: usize, order: ListOrder) -> Vec<ProfileId> {
        let mut live = self.live(horizon).collect::<Vec<_>>();
        live.sort_by_key(|p| p.started_at);
        if order == ListOrder::Descending {
            live.reverse();
        }
        live.into_iter().take(max).map(|p| p.id).collect()
    }
}

/// Start times are unique, so the order of listed ids is exact.
fn started_at(base: DateTime<Utc>, seq: usize, expired: bool) -> DateTime<Utc> {
    let age_secs = if expired {
        rng().random_range(25 * 3600..48 * 3600)
    } else {
        rng().random_range(0..12 * 3600)
    };
    base - TimeDelta::seconds(age_secs) - TimeDelta::microseconds(seq as i64)
}

#[test_log::test(tokio::test)]
async fn test_store_against_model() {
    let store: ProfileStore<_> = ProfileStoreBuilder::new()
        .with_namespace(Namespace::new("fuzzy"))
        .with_cache_duration(CACHE_DURATION)
        .build(MemoryBackend::new())
        .unwrap();
    let mut model = Model::default();
    let mut ids = vec![];

    let base = Utc::now();
    // Far enough from the edges that the test duration does not matter.
    let horizon = base - TimeDelta::hours(24);

    for seq in 0..OPS {
        let op = rng().random_range(0..100);
        match op {
            0..40 => {
                let expired = rng().random_bool(0.3);
                let profile = Profile::new(format!("/{seq}")).with_started_at(started_at(base, seq, expired));
                store.save(&profile).await;
                ids.push(profile.id);
                model.records.insert(profile.id, profile);
            }
            40..55 => {
                let Some(id) = ids.choose(&mut rng()).copied() else {
                    continue;
                };
                let expected = model.records.get(&id).filter(|p| p.started_at >= horizon).cloned();
                assert_eq!(store.load(id).await, expected);
            }
            55..70 => {
                let max = rng().random_range(0..50);
                let order = if rng().random_bool(0.5) {
                    ListOrder::Ascending
                } else {
                    ListOrder::Descending
                };
                let listed = store.list(&ListQuery::new(max).with_order(order)).await;
                assert_eq!(listed, model.list(horizon, max, order));
            }
            70..85 => {
                let Some(id) = ids.choose(&mut rng()).copied() else {
                    continue;
                };
                let user = *USERS.choose(&mut rng()).unwrap();
                store.set_unviewed(user, id).await;
                model.unviewed.entry(user).or_default().insert(id);
            }
            85..95 => {
                let Some(id) = ids.choose(&mut rng()).copied() else {
                    continue;
                };
                let user = *USERS.choose(&mut rng()).unwrap();
                store.set_viewed(user, id).await;
                if let Some(set) = model.unviewed.get_mut(user) {
                    set.remove(&id);
                }
            }
            _ => {
                let user = *USERS.choose(&mut rng()).unwrap();
                let unviewed = store.get_unviewed_ids(user).await.into_iter().collect::<HashSet<_>>();
                assert_eq!(unviewed, model.unviewed.get(user).cloned().unwrap_or_default());
            }
        }

        if seq % 500 == 0 {
            tracing::info!("Applied {seq} ops");
        }
    }

    let live = model.live(horizon).count();
    assert_eq!(store.list(&ListQuery::new(usize::MAX)).await.len(), live);
    assert_eq!(store.try_sweep().await.unwrap(), 0);
}
