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

use std::borrow::Cow;

use super::{BoxedCounter, BoxedHistogram, RegistryOps};

/// Store operations that are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// `save`
    Save,
    /// `load`
    Load,
    /// `list`
    List,
    /// `sweep`
    Sweep,
    /// `get_unviewed_ids`
    GetUnviewed,
    /// `set_unviewed`
    SetUnviewed,
    /// `set_viewed`
    SetViewed,
}

impl Op {
    /// All measured operations.
    pub const ALL: [Op; 7] = [
        Op::Save,
        Op::Load,
        Op::List,
        Op::Sweep,
        Op::GetUnviewed,
        Op::SetUnviewed,
        Op::SetViewed,
    ];

    /// Label of the operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Save => "save",
            Op::Load => "load",
            Op::List => "list",
            Op::Sweep => "sweep",
            Op::GetUnviewed => "get_unviewed",
            Op::SetUnviewed => "set_unviewed",
            Op::SetViewed => "set_viewed",
        }
    }
}

/// Metrics of one store operation.
#[derive(Debug)]
pub struct OpMetrics {
    /// Calls.
    pub total: BoxedCounter,
    /// Calls that failed with an error.
    pub error: BoxedCounter,
    /// Call durations in seconds.
    pub duration: BoxedHistogram,
}

/// Metrics of a profile store instance.
#[derive(Debug)]
pub struct Metrics {
    ops: [OpMetrics; Op::ALL.len()],

    /// `load` calls that returned a record.
    pub load_hit: BoxedCounter,
    /// `load` calls that returned nothing.
    pub load_miss: BoxedCounter,
    /// Expired records removed by sweeps.
    pub swept: BoxedCounter,
}

impl Metrics {
    /// Create a new metric with the given name.
    pub fn new<R>(name: impl Into<Cow<'static, str>>, registry: &R) -> Self
    where
        R: RegistryOps + ?Sized,
    {
        let name: Cow<'static, str> = name.into();

        let op_total = registry.register_counter_vec(
            "profstore_op_total".into(),
            "profstore operations".into(),
            &["name", "op"],
        );
        let op_error = registry.register_counter_vec(
            "profstore_error_total".into(),
            "profstore operations failed with errors".into(),
            &["name", "op"],
        );
        let op_duration = registry.register_histogram_vec(
            "profstore_op_duration".into(),
            "profstore operation durations".into(),
            &["name", "op"],
        );
        let load_total = registry.register_counter_vec(
            "profstore_load_total".into(),
            "profstore loads by result".into(),
            &["name", "result"],
        );
        let swept_total =
            registry.register_counter_vec("profstore_swept_total".into(), "profstore swept records".into(), &["name"]);

        // Indexed by the discriminant of `Op`.
        let ops = Op::ALL.map(|op| {
            let labels = [name.clone(), op.as_str().into()];
            OpMetrics {
                total: op_total.counter(&labels),
                error: op_error.counter(&labels),
                duration: op_duration.histogram(&labels),
            }
        });

        let load_hit = load_total.counter(&[name.clone(), "hit".into()]);
        let load_miss = load_total.counter(&[name.clone(), "miss".into()]);
        let swept = swept_total.counter(&[name]);

        Self {
            ops,
            load_hit,
            load_miss,
            swept,
        }
    }

    /// Get the metrics of the given operation.
    pub fn op(&self, op: Op) -> &OpMetrics {
        &self.ops[op as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::registry::noop::NoopMetricsRegistry;

    fn case(registry: &impl RegistryOps) {
        let metrics = Metrics::new("test", registry);
        for op in Op::ALL {
            metrics.op(op).total.increase(1);
            metrics.op(op).duration.record(0.001);
        }
        metrics.swept.increase(3);
    }

    #[test]
    fn test_metrics_noop() {
        case(&NoopMetricsRegistry);
    }

    #[cfg(feature = "prometheus")]
    #[test]
    fn test_metrics_prometheus() {
        use prometheus::{Encoder, TextEncoder};

        use crate::metrics::registry::prometheus::PrometheusMetricsRegistry;

        let registry = prometheus::Registry::new();
        case(&PrometheusMetricsRegistry::new(registry.clone()));

        let mut buf = vec![];
        TextEncoder::new().encode(&registry.gather(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains(r#"profstore_op_total{name="test",op="sweep"} 1"#));
        assert!(text.contains(r#"profstore_swept_total{name="test"} 3"#));
    }
}
