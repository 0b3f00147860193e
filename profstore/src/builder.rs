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

use std::{marker::PhantomData, sync::Arc, time::Duration};

use profstore_backend::KvBackend;
use profstore_common::{
    error::{Error, Result},
    metrics::{model::Metrics, registry::noop::NoopMetricsRegistry, BoxedRegistry},
};

use crate::{
    namespace::Namespace,
    record::{Profile, ProfileRecord},
    store::{ProfileStore, ProfileStoreConfig},
};

/// Profile store builder.
///
/// [`ProfileStoreBuilder::new`] builds a store of [`Profile`] records. Use [`ProfileStoreBuilder::default`]
/// with a type annotation for other record types.
pub struct ProfileStoreBuilder<R = Profile> {
    name: String,
    cache_duration: Duration,
    namespace: Namespace,
    sweep_interval: Option<Duration>,
    registry: BoxedRegistry,
    _marker: PhantomData<fn() -> R>,
}

impl<R> Default for ProfileStoreBuilder<R> {
    fn default() -> Self {
        Self {
            name: "profstore".to_string(),
            cache_duration: Duration::from_secs(24 * 60 * 60),
            namespace: Namespace::default(),
            sweep_interval: None,
            registry: Box::new(NoopMetricsRegistry),
            _marker: PhantomData,
        }
    }
}

impl ProfileStoreBuilder {
    /// Create a new profile store builder.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R> ProfileStoreBuilder<R> {
    /// Set the name of the profile store instance.
    ///
    /// The name is used as the `name` label of the metrics.
    ///
    /// Default: `profstore`.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Set how long records and unviewed sets live.
    ///
    /// Default: 1 day.
    pub fn with_cache_duration(mut self, cache_duration: Duration) -> Self {
        self.cache_duration = cache_duration;
        self
    }

    /// Set the keys of the store in the backend.
    ///
    /// Default: `profstore:results` and `profstore:unviewed:`.
    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = namespace;
        self
    }

    /// Set the minimal interval between two sweeps triggered by reads.
    ///
    /// Reads between sweeps still never return expired records.
    ///
    /// Default: sweep on every `load` and `list`.
    pub fn with_sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = Some(sweep_interval);
        self
    }

    /// Set metrics registry.
    ///
    /// Default: [`NoopMetricsRegistry`].
    pub fn with_metrics_registry(mut self, registry: BoxedRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Build the profile store over `backend`.
    pub fn build<B>(self, backend: B) -> Result<ProfileStore<B, R>>
    where
        B: KvBackend,
        R: ProfileRecord,
    {
        if self.cache_duration.is_zero() {
            return Err(Error::config("cache duration must be positive").with_context("name", &self.name));
        }

        let metrics = Arc::new(Metrics::new(self.name.clone(), self.registry.as_ref()));

        tracing::info!(
            "[profile store]: build {name} over {backend:?}, namespace: {results}, cache duration: {cache_duration:?}, sweep interval: {sweep_interval:?}",
            name = self.name,
            results = self.namespace.results_key(),
            cache_duration = self.cache_duration,
            sweep_interval = self.sweep_interval,
        );

        Ok(ProfileStore::new(ProfileStoreConfig {
            name: self.name,
            backend,
            namespace: self.namespace,
            cache_duration: self.cache_duration,
            sweep_interval: self.sweep_interval,
            metrics,
        }))
    }
}

#[cfg(test)]
mod tests {
    use profstore_backend::NoopBackend;
    use profstore_common::error::ErrorKind;

    use super::*;

    #[test]
    fn test_build_defaults() {
        let store = ProfileStoreBuilder::new().build(NoopBackend).unwrap();
        assert_eq!(store.name(), "profstore");
        assert_eq!(store.cache_duration(), Duration::from_secs(86400));
        assert_eq!(store.namespace().results_key(), "profstore:results");
    }

    #[test]
    fn test_build_zero_cache_duration() {
        let err = ProfileStoreBuilder::new()
            .with_cache_duration(Duration::ZERO)
            .build(NoopBackend)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
