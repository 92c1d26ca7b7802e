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

//! The immutable scene definition handed to the render loop.
//!
//! A [`SceneDefinition`] is built exactly once, after every build task has
//! succeeded, and owns every GPU buffer and image it references.

use super::description::Orientation;
use super::light::{DirectionalLight, PointLight, SpotLight};
use bytemuck::{Pod, Zeroable};
use prism_core::renderer::{OwnedBuffer, OwnedTexture};
use prism_core::HashedName;

/// One geometry inside a shared vertex/index buffer pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryEntry {
    /// Name from the description.
    pub name: String,
    /// Lookup key derived from `name`.
    pub hashed_name: HashedName,
    /// Number of vertex records.
    pub vertex_count: u32,
    /// Number of indices.
    pub index_count: u32,
    /// First vertex record in the shared vertex buffer.
    pub vertex_offset: u32,
    /// First index in the shared index buffer.
    pub index_offset: u32,
}

/// A pre-filled indexed indirect-draw record.
///
/// Only obtainable from a [`GeometryEntry`], so its fields can never drift from
/// the entry's offsets.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawIndirectTemplate {
    index_count: u32,
    instance_count: u32,
    first_index: u32,
    base_vertex: i32,
    first_instance: u32,
}

impl DrawIndirectTemplate {
    /// Indices drawn.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Instances drawn; the render loop patches this per frame.
    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }

    /// First index read from the index buffer.
    pub fn first_index(&self) -> u32 {
        self.first_index
    }

    /// Value added to every index before fetching a vertex.
    pub fn vertex_offset(&self) -> i32 {
        self.base_vertex
    }

    /// First instance id.
    pub fn first_instance(&self) -> u32 {
        self.first_instance
    }
}

impl From<&GeometryEntry> for DrawIndirectTemplate {
    fn from(entry: &GeometryEntry) -> Self {
        Self {
            index_count: entry.index_count,
            instance_count: 1,
            first_index: entry.index_offset,
            base_vertex: i32::try_from(entry.vertex_offset).unwrap_or(i32::MAX),
            first_instance: 0,
        }
    }
}

/// An imported geometry and the range of the material buffer it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedGeometryEntry {
    /// Placement in the imported vertex/index buffers.
    pub geometry: GeometryEntry,
    /// First material of this geometry in the imported material buffer.
    pub material_offset: u32,
    /// Number of materials this geometry owns.
    pub material_count: u32,
}

/// A material with three colour-atlas texels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColoredMaterial {
    /// Name from the description.
    pub name: String,
    /// Lookup key derived from `name`.
    pub hashed_name: HashedName,
    /// Texel index of the ambient colour.
    pub ambient: u32,
    /// Texel index of the diffuse colour.
    pub diffuse: u32,
    /// Texel index of the specular colour.
    pub specular: u32,
}

/// A material with three bindless image slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TexturedMaterial {
    /// Name from the description.
    pub name: String,
    /// Lookup key derived from `name`.
    pub hashed_name: HashedName,
    /// Slot of the ambient map.
    pub ambient: u32,
    /// Slot of the diffuse map.
    pub diffuse: u32,
    /// Slot of the specular map.
    pub specular: u32,
}

/// A built material, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterialEntry {
    /// Colour-atlas material.
    Colored(ColoredMaterial),
    /// Image-map material.
    Textured(TexturedMaterial),
}

impl MaterialEntry {
    /// The material's name.
    pub fn name(&self) -> &str {
        match self {
            MaterialEntry::Colored(m) => &m.name,
            MaterialEntry::Textured(m) => &m.name,
        }
    }

    /// The material's lookup key.
    pub fn hashed_name(&self) -> HashedName {
        match self {
            MaterialEntry::Colored(m) => m.hashed_name,
            MaterialEntry::Textured(m) => m.hashed_name,
        }
    }
}

/// Which geometry table an entity draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryRef {
    /// Index into [`ProceduralGeometry::entries`].
    Procedural(usize),
    /// Index into [`ImportedGeometry::entries`].
    Imported(usize),
}

/// Which storage buffer, and which record in it, an entity shades with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialRef {
    /// Record in the colored material buffer.
    Colored(u32),
    /// Record in the textured material buffer.
    Textured(u32),
}

/// A drawable entity with every reference resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDrawable {
    /// Name from the description.
    pub name: String,
    /// Lookup key derived from `name`.
    pub hashed_name: HashedName,
    /// The geometry drawn.
    pub geometry: GeometryRef,
    /// The material used; `None` for imported geometry, which brings its own.
    pub material: Option<MaterialRef>,
    /// Placement in the world.
    pub orientation: Orientation,
}

/// Procedurally generated geometry sharing one vertex and one index buffer.
#[derive(Debug, Default)]
pub struct ProceduralGeometry {
    entries: Vec<GeometryEntry>,
    draw_templates: Vec<DrawIndirectTemplate>,
    /// `VertexPnt` records; absent when there is no geometry.
    pub vertex_buffer: Option<OwnedBuffer>,
    /// `u32` indices; absent when there is no geometry.
    pub index_buffer: Option<OwnedBuffer>,
}

impl ProceduralGeometry {
    /// Assembles the table, deriving one draw template per entry.
    pub fn new(
        entries: Vec<GeometryEntry>,
        vertex_buffer: Option<OwnedBuffer>,
        index_buffer: Option<OwnedBuffer>,
    ) -> Self {
        let draw_templates = entries.iter().map(DrawIndirectTemplate::from).collect();
        Self {
            entries,
            draw_templates,
            vertex_buffer,
            index_buffer,
        }
    }

    /// Entries in input order.
    pub fn entries(&self) -> &[GeometryEntry] {
        &self.entries
    }

    /// One template per entry, same order.
    pub fn draw_templates(&self) -> &[DrawIndirectTemplate] {
        &self.draw_templates
    }
}

/// Imported geometry with its materials and images.
#[derive(Debug, Default)]
pub struct ImportedGeometry {
    entries: Vec<ImportedGeometryEntry>,
    draw_templates: Vec<DrawIndirectTemplate>,
    /// `VertexPbr` records.
    pub vertex_buffer: Option<OwnedBuffer>,
    /// `u32` indices.
    pub index_buffer: Option<OwnedBuffer>,
    /// `GpuPbrMaterial` records.
    pub material_buffer: Option<OwnedBuffer>,
    /// Bindless buffer slot of `material_buffer`.
    pub material_buffer_slot: Option<u32>,
    /// Decoded images, in bindless slot order.
    pub images: Vec<OwnedTexture>,
    /// Bindless image slot of `images[0]`.
    pub image_slot_start: u32,
}

impl ImportedGeometry {
    /// Starts a table over `entries`, deriving one draw template per entry.
    ///
    /// Buffers and images are attached by the caller once they exist.
    pub fn new(entries: Vec<ImportedGeometryEntry>) -> Self {
        let draw_templates = entries
            .iter()
            .map(|entry| DrawIndirectTemplate::from(&entry.geometry))
            .collect();
        Self {
            entries,
            draw_templates,
            ..Self::default()
        }
    }

    /// Entries in input order.
    pub fn entries(&self) -> &[ImportedGeometryEntry] {
        &self.entries
    }

    /// One template per entry, same order.
    pub fn draw_templates(&self) -> &[DrawIndirectTemplate] {
        &self.draw_templates
    }
}

/// All non-imported materials and the GPU objects backing them.
#[derive(Debug, Default)]
pub struct MaterialTables {
    /// Materials in input order.
    pub entries: Vec<MaterialEntry>,
    /// RGBA8 colour atlas, three texels per colored material.
    pub color_atlas: Option<OwnedTexture>,
    /// Unique textured-material maps, in bindless slot order after the atlas.
    pub textures: Vec<OwnedTexture>,
    /// `GpuColoredMaterial` records.
    pub colored_buffer: Option<OwnedBuffer>,
    /// `GpuTexturedMaterial` records.
    pub textured_buffer: Option<OwnedBuffer>,
    /// Bindless image slot of the atlas; textures follow it.
    pub image_slot_start: u32,
    /// Bindless buffer slot of the colored buffer; the textured buffer follows it.
    pub buffer_slot_start: u32,
}

impl MaterialTables {
    /// Resolves a material by name to the record an entity should use.
    pub fn resolve(&self, name: &str) -> Option<MaterialRef> {
        let key = HashedName::of(name);
        let mut colored = 0u32;
        let mut textured = 0u32;
        for entry in &self.entries {
            match entry {
                MaterialEntry::Colored(m) => {
                    if m.hashed_name == key && m.name == name {
                        return Some(MaterialRef::Colored(colored));
                    }
                    colored += 1;
                }
                MaterialEntry::Textured(m) => {
                    if m.hashed_name == key && m.name == name {
                        return Some(MaterialRef::Textured(textured));
                    }
                    textured += 1;
                }
            }
        }
        None
    }
}

/// The scene's light sources.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneLights {
    /// Directional lights.
    pub directional: Vec<DirectionalLight>,
    /// Point lights.
    pub point: Vec<PointLight>,
    /// Spot lights.
    pub spot: Vec<SpotLight>,
}

/// The aggregate root produced by scene assembly.
#[derive(Debug, Default)]
pub struct SceneDefinition {
    /// Procedural geometry.
    pub procedural: ProceduralGeometry,
    /// Imported geometry.
    pub imported: ImportedGeometry,
    /// Materials.
    pub materials: MaterialTables,
    /// Drawable entities, procedural ones first, each group in input order.
    pub entities: Vec<EntityDrawable>,
    /// Lights.
    pub lights: SceneLights,
}

impl SceneDefinition {
    /// Number of geometry entries across both tables.
    pub fn geometry_count(&self) -> usize {
        self.procedural.entries.len() + self.imported.entries.len()
    }

    /// Finds an entity by name.
    pub fn entity(&self, name: &str) -> Option<&EntityDrawable> {
        let key = HashedName::of(name);
        self.entities
            .iter()
            .find(|e| e.hashed_name == key && e.name == name)
    }
}
