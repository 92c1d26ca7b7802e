// Copyright 2025 eraflo
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

//! Deterministic 32-bit name hashing.
//!
//! Every named resource in a scene (geometries, materials, entities) is looked
//! up by the FNV-1a hash of its name rather than by string comparison. The hash
//! depends only on the UTF-8 bytes of the name, so it is stable across runs,
//! processes and platforms.

use std::fmt;

/// FNV-1a 32-bit offset basis.
pub const FNV1A_OFFSET_BASIS: u32 = 0x811c_9dc5;
/// FNV-1a 32-bit prime.
pub const FNV1A_PRIME: u32 = 0x0100_0193;

/// Computes the FNV-1a 32-bit hash of `bytes`.
pub const fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hash = FNV1A_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(FNV1A_PRIME);
        i += 1;
    }
    hash
}

/// A stable 32-bit lookup key derived from a human-readable resource name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct HashedName(pub u32);

impl HashedName {
    /// Hashes `name` into its lookup key.
    pub const fn of(name: &str) -> Self {
        Self(fnv1a(name.as_bytes()))
    }

    /// Returns the raw 32-bit value.
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for HashedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl From<&str> for HashedName {
    fn from(name: &str) -> Self {
        Self::of(name)
    }
}
