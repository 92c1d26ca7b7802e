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

//! Imported (file-based) geometry.

mod gltf_importer;

pub use self::gltf_importer::GltfImporter;

use super::GeometryData;
use crate::material_lane::DecodedImage;
use prism_core::ImportError;
use prism_data::gpu::{GpuPbrMaterial, VertexPbr, NO_TEXTURE};
use std::path::Path;

/// Everything one imported asset contributes to the scene.
///
/// Indices, material ids and texture references are local to the asset
/// until [`rebase`](Self::rebase) places it among the others.
#[derive(Debug, Clone, Default)]
pub struct ImportedGeometryData {
    /// Vertices (with `material_id` into `materials`) and indices.
    pub geometry: GeometryData<VertexPbr>,
    /// Materials; texture fields index `images` or are [`NO_TEXTURE`].
    pub materials: Vec<GpuPbrMaterial>,
    /// Decoded images.
    pub images: Vec<DecodedImage>,
}

impl ImportedGeometryData {
    /// Shifts material ids by `material_base` and texture references by
    /// `image_base`, so they address the shared material buffer and the
    /// bindless image table.
    pub fn rebase(&mut self, material_base: u32, image_base: u32) {
        for vertex in &mut self.geometry.vertices {
            vertex.material_id += material_base;
        }
        let shift = |slot: &mut u32| {
            if *slot != NO_TEXTURE {
                *slot += image_base;
            }
        };
        for material in &mut self.materials {
            shift(&mut material.base_color);
            shift(&mut material.metallic_roughness);
            shift(&mut material.normal);
        }
    }
}

/// The geometry import collaborator. Implementations are called from pool
/// threads and must not touch the GPU.
pub trait GeometryImporter: Send + Sync {
    /// Loads and decodes the asset at `path`.
    fn import(&self, path: &Path) -> Result<ImportedGeometryData, ImportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebase_leaves_missing_textures_alone() {
        let mut data = ImportedGeometryData {
            geometry: GeometryData {
                vertices: vec![VertexPbr {
                    material_id: 1,
                    ..Default::default()
                }],
                indices: vec![0],
            },
            materials: vec![GpuPbrMaterial {
                base_color: 0,
                ..Default::default()
            }],
            images: Vec::new(),
        };
        data.rebase(4, 20);
        assert_eq!(data.geometry.vertices[0].material_id, 5);
        assert_eq!(data.materials[0].base_color, 20);
        assert_eq!(data.materials[0].normal, NO_TEXTURE);
        assert_eq!(data.geometry.indices, vec![0]);
    }
}
