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

use std::{borrow::Cow, collections::HashMap, sync::Arc};

use itertools::Itertools;
use parking_lot::Mutex;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

use crate::metrics::{
    registry::noop::NoopMetricsRegistry, BoxedCounter, BoxedCounterVec, BoxedHistogram, BoxedHistogramVec, Boxer,
    CounterOps, CounterVecOps, HistogramOps, HistogramVecOps, RegistryOps,
};

#[derive(Debug, Clone)]
enum MetricVec {
    Counter(IntCounterVec),
    Histogram(HistogramVec),
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct Metadata {
    name: Cow<'static, str>,
    label_names: &'static [&'static str],
}

impl CounterOps for IntCounter {
    fn increase(&self, val: u64) {
        self.inc_by(val);
    }
}

impl CounterVecOps for IntCounterVec {
    fn counter(&self, labels: &[Cow<'static, str>]) -> BoxedCounter {
        let labels = labels.iter().map(Cow::as_ref).collect_vec();
        self.with_label_values(&labels).boxed()
    }
}

impl HistogramOps for Histogram {
    fn record(&self, val: f64) {
        self.observe(val);
    }
}

impl HistogramVecOps for HistogramVec {
    fn histogram(&self, labels: &[Cow<'static, str>]) -> BoxedHistogram {
        let labels = labels.iter().map(Cow::as_ref).collect_vec();
        self.with_label_values(&labels).boxed()
    }
}

/// Prometheus metric registry with lib `prometheus`.
///
/// The [`PrometheusMetricsRegistry`] can be cloned and shared by multiple profile stores: metric vectors with the
/// same name are registered only once and reused afterwards.
///
/// Wrapping the same [`Registry`] twice with [`PrometheusMetricsRegistry::new`] is not supported, the second
/// registration of each metric vector is rejected by `prometheus` and the metrics of that instance are dropped.
#[derive(Debug, Clone)]
pub struct PrometheusMetricsRegistry {
    registry: Registry,
    vecs: Arc<Mutex<HashMap<Metadata, MetricVec>>>,
}

impl PrometheusMetricsRegistry {
    /// Create an Prometheus metrics registry.
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            vecs: Arc::default(),
        }
    }

    /// Get the wrapped registry, e.g. for exporting.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl RegistryOps for PrometheusMetricsRegistry {
    fn register_counter_vec(
        &self,
        name: Cow<'static, str>,
        desc: Cow<'static, str>,
        label_names: &'static [&'static str],
    ) -> BoxedCounterVec {
        let metadata = Metadata {
            name: name.clone(),
            label_names,
        };
        let mut vecs = self.vecs.lock();
        if let Some(MetricVec::Counter(vec)) = vecs.get(&metadata) {
            return vec.clone().boxed();
        }

        let res = IntCounterVec::new(Opts::new(name.clone(), desc), label_names).and_then(|vec| {
            self.registry.register(Box::new(vec.clone()))?;
            Ok(vec)
        });
        match res {
            Ok(vec) => {
                vecs.insert(metadata, MetricVec::Counter(vec.clone()));
                vec.boxed()
            }
            Err(e) => {
                tracing::warn!("[prometheus registry]: fail to register counter vec {name}, drop its records, error: {e}");
                NoopMetricsRegistry.boxed()
            }
        }
    }

    fn register_histogram_vec(
        &self,
        name: Cow<'static, str>,
        desc: Cow<'static, str>,
        label_names: &'static [&'static str],
    ) -> BoxedHistogramVec {
        let metadata = Metadata {
            name: name.clone(),
            label_names,
        };
        let mut vecs = self.vecs.lock();
        if let Some(MetricVec::Histogram(vec)) = vecs.get(&metadata) {
            return vec.clone().boxed();
        }

        let res = HistogramVec::new(HistogramOpts::new(name.clone(), desc), label_names).and_then(|vec| {
            self.registry.register(Box::new(vec.clone()))?;
            Ok(vec)
        });
        match res {
            Ok(vec) => {
                vecs.insert(metadata, MetricVec::Histogram(vec.clone()));
                vec.boxed()
            }
            Err(e) => {
                tracing::warn!(
                    "[prometheus registry]: fail to register histogram vec {name}, drop its records, error: {e}"
                );
                NoopMetricsRegistry.boxed()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use prometheus::{Encoder, TextEncoder};

    use super::*;

    fn encode(registry: &Registry) -> String {
        let mut buf = vec![];
        TextEncoder::new().encode(&registry.gather(), &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn case(registry: &PrometheusMetricsRegistry) {
        let cv = registry.register_counter_vec("test_counter_1".into(), "test counter 1".into(), &["name", "op"]);
        let c = cv.counter(&["test".into(), "save".into()]);
        c.increase(42);

        let hv = registry.register_histogram_vec("test_histogram_1".into(), "test histogram 1".into(), &["name", "op"]);
        let h = hv.histogram(&["test".into(), "load".into()]);
        h.record(0.125);
    }

    #[test]
    fn test_prometheus_metrics_registry() {
        let registry = Registry::new();
        let p8s = PrometheusMetricsRegistry::new(registry.clone());
        case(&p8s);

        let text = encode(&registry);
        assert!(text.contains(r#"test_counter_1{name="test",op="save"} 42"#));
    }

    #[test]
    fn test_shared_prometheus_metrics_registry() {
        let registry = Registry::new();
        let p8s1 = PrometheusMetricsRegistry::new(registry.clone());
        let p8s2 = p8s1.clone();
        case(&p8s1);
        case(&p8s2);

        let text = encode(&registry);
        assert!(text.contains(r#"test_counter_1{name="test",op="save"} 84"#));
    }
}
