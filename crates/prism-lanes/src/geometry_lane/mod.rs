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

//! Geometry sources: shapes generated on the CPU and meshes imported from disk.

pub mod importer;
pub mod procedural;

/// Vertex records and local (zero-based) indices of one geometry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeometryData<V> {
    /// Vertex records.
    pub vertices: Vec<V>,
    /// Triangle list indices into `vertices`.
    pub indices: Vec<u32>,
}

impl<V: bytemuck::Pod> GeometryData<V> {
    /// The vertices as raw bytes.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// The indices as raw bytes.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
