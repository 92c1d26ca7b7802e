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

//! Geometry offset layout.
//!
//! All geometries of one kind share a vertex buffer and an index buffer. Each
//! entry's offsets are assigned in input order by a running accumulator, so an
//! entry never moves an earlier one and the layout is fully determined by the
//! counts alone. This is what lets the assembler lay out procedural geometry
//! synchronously, before any vertex has been generated.

use super::definition::GeometryEntry;
use prism_core::{HashedName, SceneError};

/// Largest vertex count a shared buffer may hold. Draw records carry the
/// vertex offset as a signed 32-bit base vertex.
pub const MAX_VERTICES: u32 = i32::MAX as u32;

/// Vertex and index counts of one geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GeometryCounts {
    /// Number of vertex records.
    pub vertices: u32,
    /// Number of indices.
    pub indices: u32,
}

/// Running (vertex, index) element offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OffsetAccumulator {
    /// Vertices placed so far.
    pub vertices: u32,
    /// Indices placed so far.
    pub indices: u32,
}

impl OffsetAccumulator {
    /// Places a geometry at the current offsets and advances past it.
    pub fn place(&mut self, name: &str, counts: GeometryCounts) -> Result<GeometryEntry, SceneError> {
        let overflow = || {
            SceneError::InvariantViolation(format!(
                "geometry '{name}' overflows the 32-bit geometry buffer offsets"
            ))
        };
        let vertices = self
            .vertices
            .checked_add(counts.vertices)
            .filter(|end| *end <= MAX_VERTICES)
            .ok_or_else(overflow)?;
        let indices = self.indices.checked_add(counts.indices).ok_or_else(overflow)?;

        let entry = GeometryEntry {
            name: name.to_string(),
            hashed_name: HashedName::of(name),
            vertex_count: counts.vertices,
            index_count: counts.indices,
            vertex_offset: self.vertices,
            index_offset: self.indices,
        };
        self.vertices = vertices;
        self.indices = indices;
        Ok(entry)
    }
}

/// Entries laid out back to back, plus the totals.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GeometryLayout {
    /// One entry per input, in input order.
    pub entries: Vec<GeometryEntry>,
    /// The accumulator after the last entry.
    pub total: OffsetAccumulator,
}

impl GeometryLayout {
    /// Lays out `geometries` in iteration order.
    pub fn compute<'a>(
        geometries: impl IntoIterator<Item = (&'a str, GeometryCounts)>,
    ) -> Result<Self, SceneError> {
        let mut total = OffsetAccumulator::default();
        let entries = geometries
            .into_iter()
            .map(|(name, counts)| total.place(name, counts))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries, total })
    }

    /// Bytes needed for every vertex, given the record size.
    pub fn vertex_bytes(&self, record_size: u64) -> u64 {
        u64::from(self.total.vertices) * record_size
    }

    /// Bytes needed for every 32-bit index.
    pub fn index_bytes(&self) -> u64 {
        u64::from(self.total.indices) * std::mem::size_of::<u32>() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(vertices: u32, indices: u32) -> GeometryCounts {
        GeometryCounts { vertices, indices }
    }

    #[test]
    fn offsets_are_additive_in_input_order() {
        let layout =
            GeometryLayout::compute([("A", counts(10, 30)), ("B", counts(5, 12))]).unwrap();

        let a = &layout.entries[0];
        let b = &layout.entries[1];
        assert_eq!((a.vertex_offset, a.index_offset), (0, 0));
        assert_eq!((b.vertex_offset, b.index_offset), (10, 30));
        assert_eq!(
            layout.total,
            OffsetAccumulator {
                vertices: 15,
                indices: 42
            }
        );
        assert_eq!(layout.vertex_bytes(32), 15 * 32);
        assert_eq!(layout.index_bytes(), 42 * 4);
    }

    #[test]
    fn appending_never_moves_earlier_entries() {
        let short = GeometryLayout::compute([("A", counts(3, 3))]).unwrap();
        let long =
            GeometryLayout::compute([("A", counts(3, 3)), ("B", counts(4, 6)), ("C", counts(0, 0))])
                .unwrap();
        assert_eq!(short.entries[0], long.entries[0]);
        let offsets: Vec<_> = long.entries.iter().map(|e| e.vertex_offset).collect();
        assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(long.entries[2].vertex_offset, 7);
    }

    #[test]
    fn entries_carry_hashed_names() {
        let layout = GeometryLayout::compute([("floor", counts(1, 1))]).unwrap();
        assert_eq!(layout.entries[0].hashed_name, HashedName::of("floor"));
    }

    #[test]
    fn vertex_offsets_stay_within_signed_base_vertex() {
        let layout =
            GeometryLayout::compute([("A", counts(MAX_VERTICES - 1, 0)), ("B", counts(1, 3))])
                .unwrap();
        assert_eq!(layout.entries[1].vertex_offset, MAX_VERTICES - 1);
        assert_eq!(layout.total.vertices, MAX_VERTICES);

        let mut accumulator = layout.total;
        let err = accumulator.place("C", counts(1, 3)).unwrap_err();
        assert!(matches!(err, SceneError::InvariantViolation(_)));
        assert_eq!(accumulator, layout.total);
    }

    #[test]
    fn overflow_is_an_invariant_violation() {
        let err = GeometryLayout::compute([("A", counts(u32::MAX, 0)), ("B", counts(1, 0))])
            .unwrap_err();
        assert!(matches!(err, SceneError::InvariantViolation(_)));
    }
}
