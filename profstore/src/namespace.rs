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

/// Keys of the shared state in the backing store.
///
/// Stores that share a backend but not a [`Namespace`] do not see each other's records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    results_key: String,
    unviewed_prefix: String,
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new("profstore")
    }
}

impl Namespace {
    /// Derive the keys from a prefix: `{prefix}:results` and `{prefix}:unviewed:`.
    pub fn new(prefix: impl AsRef<str>) -> Self {
        let prefix = prefix.as_ref();
        Self {
            results_key: format!("{prefix}:results"),
            unviewed_prefix: format!("{prefix}:unviewed:"),
        }
    }

    /// Use the given keys as they are.
    pub fn with_keys(results_key: impl Into<String>, unviewed_prefix: impl Into<String>) -> Self {
        Self {
            results_key: results_key.into(),
            unviewed_prefix: unviewed_prefix.into(),
        }
    }

    /// Key of the hash that holds all records.
    pub fn results_key(&self) -> &str {
        &self.results_key
    }

    /// Prefix of the per-user unviewed sets.
    pub fn unviewed_prefix(&self) -> &str {
        &self.unviewed_prefix
    }

    /// Key of the unviewed set of `user`.
    pub fn unviewed_key(&self, user: &str) -> String {
        format!("{}{user}", self.unviewed_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_keys() {
        let ns = Namespace::default();
        assert_eq!(ns.results_key(), "profstore:results");
        assert_eq!(ns.unviewed_key("alice"), "profstore:unviewed:alice");

        let ns = Namespace::new("test-42");
        assert_eq!(ns.results_key(), "test-42:results");
        assert_eq!(ns.unviewed_prefix(), "test-42:unviewed:");

        let ns = Namespace::with_keys("MiniProfilerResults", "MiniProfilerUnviewed-");
        assert_eq!(ns.unviewed_key("::1"), "MiniProfilerUnviewed-::1");
    }
}
