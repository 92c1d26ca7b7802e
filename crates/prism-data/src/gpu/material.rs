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

//! Material records stored in bindless storage buffers.

use bytemuck::{Pod, Zeroable};

/// Marks a texture slot that is not used.
pub const NO_TEXTURE: u32 = u32::MAX;

/// A colored material: three texel indices into the colour atlas.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct GpuColoredMaterial {
    /// Texel holding the ambient colour.
    pub ambient: u32,
    /// Texel holding the diffuse colour.
    pub diffuse: u32,
    /// Texel holding the specular colour.
    pub specular: u32,
    /// Bindless image slot of the atlas.
    pub atlas: u32,
}

/// A textured material: three bindless image slots.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct GpuTexturedMaterial {
    /// Slot of the ambient map.
    pub ambient: u32,
    /// Slot of the diffuse map.
    pub diffuse: u32,
    /// Slot of the specular map.
    pub specular: u32,
    /// Padding to 16 bytes.
    pub _pad: u32,
}

/// A metallic-roughness material imported from glTF.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuPbrMaterial {
    /// Linear base colour factor.
    pub base_color_factor: [f32; 4],
    /// Slot of the base colour texture, or [`NO_TEXTURE`].
    pub base_color: u32,
    /// Slot of the metallic-roughness texture, or [`NO_TEXTURE`].
    pub metallic_roughness: u32,
    /// Slot of the normal map, or [`NO_TEXTURE`].
    pub normal: u32,
    /// Metallic factor.
    pub metallic_factor: f32,
    /// Roughness factor.
    pub roughness_factor: f32,
    /// Padding to 48 bytes.
    pub _pad: [u32; 3],
}

impl Default for GpuPbrMaterial {
    fn default() -> Self {
        Self {
            base_color_factor: [1.0; 4],
            base_color: NO_TEXTURE,
            metallic_roughness: NO_TEXTURE,
            normal: NO_TEXTURE,
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            _pad: [0; 3],
        }
    }
}
