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

use parking_lot::Mutex;
use tokio::time::Instant;

/// Decides whether a read should sweep expired records first.
#[derive(Debug)]
pub struct SweepGate {
    interval: Option<Duration>,
    last: Mutex<Option<Instant>>,
}

impl SweepGate {
    pub fn new(interval: Option<Duration>) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Returns `true` and marks the sweep as done if a sweep is due.
    ///
    /// Without an interval every call is due.
    pub fn try_enter(&self) -> bool {
        let Some(interval) = self.interval else {
            return true;
        };
        let now = Instant::now();
        let mut last = self.last.lock();
        match *last {
            Some(at) if now.duration_since(at) < interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    /// Mark a sweep done now, regardless of the interval.
    pub fn mark(&self) {
        if self.interval.is_some() {
            *self.last.lock() = Some(Instant::now());
        }
    }

    /// Forget the last sweep, the next call to [`SweepGate::try_enter`] is due.
    pub fn reset(&self) {
        *self.last.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_gate_always() {
        let gate = SweepGate::new(None);
        assert!(gate.try_enter());
        assert!(gate.try_enter());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_gate_interval() {
        let gate = SweepGate::new(Some(Duration::from_secs(10)));
        assert!(gate.try_enter());
        assert!(!gate.try_enter());

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(!gate.try_enter());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(gate.try_enter());

        tokio::time::advance(Duration::from_secs(5)).await;
        gate.mark();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(!gate.try_enter());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_gate_reset() {
        let gate = SweepGate::new(Some(Duration::from_secs(10)));
        assert!(gate.try_enter());
        assert!(!gate.try_enter());

        gate.reset();
        assert!(gate.try_enter());
        assert!(!gate.try_enter());

        let gate = SweepGate::new(None);
        gate.reset();
        assert!(gate.try_enter());
    }
}
