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

//! profstore - shared profiling storage for Rust.
//!
//! A [`ProfileStore`] keeps profiling records in a shared key-value store, so that several servers behind a
//! load balancer see the same profiling history. Records live in one hash keyed by record id, and every user
//! has a set of record ids they have not viewed yet. Both expire on their own.
//!
//! Every operation comes in two forms. The `try_*` form returns the backend error. The plain form logs the
//! error and degrades to a no-op or an empty result, so profiling never breaks the host.

mod builder;
mod namespace;
mod record;
mod store;
mod sweep;

mod prelude;
pub use prelude::*;
