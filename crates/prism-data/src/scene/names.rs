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

//! Hashed-name lookup tables.

use prism_core::{EntryKind, HashedName, SceneError};
use std::collections::HashMap;

/// Maps the hashed names of one entry kind to their position in input order.
///
/// Building the index rejects repeated names and distinct names whose hashes
/// collide, so a lookup by hash can never alias two entries.
#[derive(Debug, Clone)]
pub struct NameIndex {
    kind: EntryKind,
    by_hash: HashMap<HashedName, (usize, String)>,
}

impl NameIndex {
    /// Indexes `names` in iteration order.
    ///
    /// # Errors
    /// [`SceneError::DuplicateName`] or [`SceneError::HashCollision`].
    pub fn build<'a>(
        kind: EntryKind,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, SceneError> {
        let mut by_hash: HashMap<HashedName, (usize, String)> = HashMap::new();
        for (position, name) in names.into_iter().enumerate() {
            let key = HashedName::of(name);
            if let Some((_, existing)) = by_hash.get(&key) {
                return Err(if existing == name {
                    SceneError::DuplicateName {
                        kind,
                        name: name.to_string(),
                    }
                } else {
                    SceneError::HashCollision {
                        kind,
                        first: existing.clone(),
                        second: name.to_string(),
                        hash: key.value(),
                    }
                });
            }
            by_hash.insert(key, (position, name.to_string()));
        }
        Ok(Self { kind, by_hash })
    }

    /// The kind of entry indexed.
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Number of indexed names.
    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    /// Returns `true` if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    /// Resolves `name` to its input position.
    pub fn resolve(&self, name: &str) -> Option<usize> {
        self.by_hash
            .get(&HashedName::of(name))
            .filter(|(_, stored)| stored == name)
            .map(|(position, _)| *position)
    }
}
