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

use profstore::ProfileId;

/// Cli error type.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Record cannot be printed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// Store error.
    #[error(transparent)]
    Store(#[from] profstore::Error),
    /// No live record with the id.
    #[error("record {0} not found")]
    NotFound(ProfileId),
    /// Neither a RFC 3339 timestamp nor a duration.
    #[error("invalid time: {0}, expect a RFC 3339 timestamp or a duration ago like `2h`")]
    InvalidTime(String),
}

/// Cli result type.
pub type Result<T> = core::result::Result<T, Error>;
