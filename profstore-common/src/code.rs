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

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

/// Encode/decode trait for values kept in the backing store.
///
/// Every `serde` type is [`Code`] and is stored as JSON, so records written by other profilers that speak JSON
/// can be read back.
pub trait Code {
    /// Encode the object into a writer.
    fn encode(&self, writer: &mut impl std::io::Write) -> Result<()>;

    /// Decode the object from a reader.
    fn decode(reader: &mut impl std::io::Read) -> Result<Self>
    where
        Self: Sized;

    /// Encode the object into a fresh buffer.
    fn encode_to_vec(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        Ok(buf)
    }

    /// Decode the object from a byte slice.
    fn decode_from_slice(mut slice: &[u8]) -> Result<Self>
    where
        Self: Sized,
    {
        Self::decode(&mut slice)
    }
}

impl<T> Code for T
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, writer: &mut impl std::io::Write) -> Result<()> {
        serde_json::to_writer(writer, self).map_err(Into::into)
    }

    fn decode(reader: &mut impl std::io::Read) -> Result<Self> {
        serde_json::from_reader(reader).map_err(Into::into)
    }
}
