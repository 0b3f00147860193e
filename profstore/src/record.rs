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

use chrono::{DateTime, Utc};
use profstore_common::code::Code;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Identifier of a profiling record.
pub type ProfileId = Uuid;

/// A snapshot of one profiling session that can be kept in a [`crate::ProfileStore`].
///
/// The store only looks at [`ProfileRecord::id`] and [`ProfileRecord::started_at`], the rest of the record is
/// an opaque blob encoded with [`Code`].
pub trait ProfileRecord: Code + Send + Sync + 'static {
    /// Unique id of the record, stable for its lifetime.
    fn id(&self) -> ProfileId;

    /// When profiling began, used for expiry and for time-range listing.
    fn started_at(&self) -> DateTime<Utc>;
}

/// A general profiling record.
///
/// Fields other than the known ones are kept in [`Profile::payload`], so records written by other profilers
/// round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Record id.
    pub id: ProfileId,
    /// Name of the profiled request, usually its path.
    pub name: String,
    /// When profiling began.
    pub started_at: DateTime<Utc>,
    /// Elapsed time of the profiled request in milliseconds.
    #[serde(default)]
    pub duration_ms: f64,
    /// The user the request was made for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Everything else.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Profile {
    /// Create a record with a random id that starts now.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            started_at: Utc::now(),
            duration_ms: 0.0,
            user: None,
            payload: Map::new(),
        }
    }

    /// Set the start time.
    pub fn with_started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self
    }

    /// Set the elapsed time in milliseconds.
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Set the user.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Add an opaque field.
    pub fn with_payload(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }
}

impl ProfileRecord for Profile {
    fn id(&self) -> ProfileId {
        self.id
    }

    fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_profile_keeps_unknown_fields() {
        let raw = json!({
            "id": "8d7a3c8e-46b4-4a53-9a4f-4f0e5c0e7d21",
            "name": "/home/index",
            "started_at": "2026-10-16T08:00:00Z",
            "duration_ms": 12.5,
            "root": { "name": "GET /home/index", "children": [] },
            "client_timings": null,
        });
        let buf = serde_json::to_vec(&raw).unwrap();

        let profile = Profile::decode_from_slice(&buf).unwrap();
        assert_eq!(profile.name, "/home/index");
        assert_eq!(profile.user, None);
        assert_eq!(profile.payload.len(), 2);
        assert_eq!(profile.payload["root"]["name"], "GET /home/index");

        let back: Value = serde_json::from_slice(&profile.encode_to_vec().unwrap()).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn test_profile_missing_start_time() {
        let buf = br#"{"id":"8d7a3c8e-46b4-4a53-9a4f-4f0e5c0e7d21","name":"/"}"#;
        assert!(Profile::decode_from_slice(buf).is_err());
    }
}
