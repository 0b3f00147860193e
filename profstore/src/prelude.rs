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

pub use profstore_backend::{KvBackend, MemoryBackend, NoopBackend};
#[cfg(feature = "redis")]
pub use profstore_backend::RedisBackend;
#[cfg(feature = "prometheus")]
pub use profstore_common::metrics::registry::prometheus::PrometheusMetricsRegistry;
pub use profstore_common::{
    code::Code,
    error::{Error, ErrorKind, Result},
    metrics::{registry::noop::NoopMetricsRegistry, BoxedRegistry, RegistryOps},
};

pub use crate::{
    builder::ProfileStoreBuilder,
    namespace::Namespace,
    record::{Profile, ProfileId, ProfileRecord},
    store::{ListOrder, ListQuery, ProfileStore, MAX_CACHE_DURATION},
};
