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

use ahash::AHashMap;
use glam::Vec4;
use prism_core::HashedName;
use prism_data::gpu::{GpuColoredMaterial, GpuTexturedMaterial};
use prism_data::scene::{ColoredMaterial, MaterialDescription, MaterialEntry, TexturedMaterial};
use std::path::{Path, PathBuf};

/// Atlas texels per colored material: ambient, diffuse, specular.
pub const TEXELS_PER_MATERIAL: u32 = 3;

/// Widest colour atlas produced; larger atlases wrap onto more rows.
pub const ATLAS_MAX_WIDTH: u32 = 1024;

/// A material whose slots have not been assigned yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedMaterial {
    /// Three consecutive atlas texels starting at `first_texel`.
    Colored {
        /// Material name.
        name: String,
        /// Texel of the ambient colour; diffuse and specular follow.
        first_texel: u32,
    },
    /// Three indices into [`MaterialPlan::texture_paths`].
    Textured {
        /// Material name.
        name: String,
        /// Unique texture of the ambient map.
        ambient: u32,
        /// Unique texture of the diffuse map.
        diffuse: u32,
        /// Unique texture of the specular map.
        specular: u32,
    },
}

/// The CPU-side split of the material descriptions.
#[derive(Debug, Clone, Default)]
pub struct MaterialPlan {
    materials: Vec<PlannedMaterial>,
    texels: Vec<[u8; 4]>,
    textures: Vec<PathBuf>,
}

fn to_rgba8(color: Vec4) -> [u8; 4] {
    let c = color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0;
    [
        c.x.round() as u8,
        c.y.round() as u8,
        c.z.round() as u8,
        c.w.round() as u8,
    ]
}

impl MaterialPlan {
    /// Splits `descriptions` into atlas texels and unique texture files.
    ///
    /// Texture paths are resolved against `asset_root`; a file referenced by
    /// several maps or materials is listed, and later loaded, once.
    pub fn split(descriptions: &[MaterialDescription], asset_root: &Path) -> Self {
        let mut plan = Self::default();
        let mut seen: AHashMap<PathBuf, u32> = AHashMap::new();

        let mut intern = |textures: &mut Vec<PathBuf>, relative: &str| -> u32 {
            let path = asset_root.join(relative);
            *seen.entry(path.clone()).or_insert_with(|| {
                textures.push(path);
                (textures.len() - 1) as u32
            })
        };

        for description in descriptions {
            match description {
                MaterialDescription::Colored {
                    name,
                    ambient,
                    diffuse,
                    specular,
                } => {
                    let first_texel = plan.texels.len() as u32;
                    plan.texels
                        .extend([*ambient, *diffuse, *specular].map(to_rgba8));
                    plan.materials.push(PlannedMaterial::Colored {
                        name: name.clone(),
                        first_texel,
                    });
                }
                MaterialDescription::Textured {
                    name,
                    ambient,
                    diffuse,
                    specular,
                } => {
                    let ambient = intern(&mut plan.textures, ambient);
                    let diffuse = intern(&mut plan.textures, diffuse);
                    let specular = intern(&mut plan.textures, specular);
                    plan.materials.push(PlannedMaterial::Textured {
                        name: name.clone(),
                        ambient,
                        diffuse,
                        specular,
                    });
                }
            }
        }

        log::debug!(
            "MaterialPlan: {} materials, {} atlas texels, {} unique textures",
            plan.materials.len(),
            plan.texels.len(),
            plan.textures.len()
        );
        plan
    }

    /// The planned materials, in description order.
    pub fn materials(&self) -> &[PlannedMaterial] {
        &self.materials
    }

    /// Unique texture files, in first-use order.
    pub fn texture_paths(&self) -> &[PathBuf] {
        &self.textures
    }

    /// Whether any colored material needs the atlas.
    pub fn has_atlas(&self) -> bool {
        !self.texels.is_empty()
    }

    /// Number of bindless image slots the plan occupies: the atlas slot
    /// followed by one per unique texture.
    pub fn image_slots_needed(&self) -> u32 {
        if self.materials.is_empty() {
            0
        } else {
            1 + self.textures.len() as u32
        }
    }

    /// Atlas dimensions in texels; `(0, 0)` without colored materials.
    pub fn atlas_extent(&self) -> (u32, u32) {
        let count = self.texels.len() as u32;
        if count == 0 {
            return (0, 0);
        }
        let width = count.min(ATLAS_MAX_WIDTH);
        (width, count.div_ceil(width))
    }

    /// Atlas pixels, row-major RGBA8, zero-filled past the last texel.
    pub fn atlas_pixels(&self) -> Vec<u8> {
        let (width, height) = self.atlas_extent();
        let mut pixels = vec![0u8; (width * height * 4) as usize];
        for (texel, rgba) in pixels.chunks_exact_mut(4).zip(&self.texels) {
            texel.copy_from_slice(rgba);
        }
        pixels
    }

    fn texture_slot(image_slot_start: u32, unique: u32) -> u32 {
        image_slot_start + 1 + unique
    }

    /// Material entries with textures rebased onto bindless slots.
    pub fn entries(&self, image_slot_start: u32) -> Vec<MaterialEntry> {
        self.materials
            .iter()
            .map(|planned| match planned {
                PlannedMaterial::Colored { name, first_texel } => {
                    MaterialEntry::Colored(ColoredMaterial {
                        name: name.clone(),
                        hashed_name: HashedName::of(name),
                        ambient: *first_texel,
                        diffuse: first_texel + 1,
                        specular: first_texel + 2,
                    })
                }
                PlannedMaterial::Textured {
                    name,
                    ambient,
                    diffuse,
                    specular,
                } => MaterialEntry::Textured(TexturedMaterial {
                    name: name.clone(),
                    hashed_name: HashedName::of(name),
                    ambient: Self::texture_slot(image_slot_start, *ambient),
                    diffuse: Self::texture_slot(image_slot_start, *diffuse),
                    specular: Self::texture_slot(image_slot_start, *specular),
                }),
            })
            .collect()
    }

    /// Records for the colored material storage buffer.
    pub fn colored_records(&self, image_slot_start: u32) -> Vec<GpuColoredMaterial> {
        self.materials
            .iter()
            .filter_map(|planned| match planned {
                PlannedMaterial::Colored { first_texel, .. } => Some(GpuColoredMaterial {
                    ambient: *first_texel,
                    diffuse: first_texel + 1,
                    specular: first_texel + 2,
                    atlas: image_slot_start,
                }),
                PlannedMaterial::Textured { .. } => None,
            })
            .collect()
    }

    /// Records for the textured material storage buffer.
    pub fn textured_records(&self, image_slot_start: u32) -> Vec<GpuTexturedMaterial> {
        self.materials
            .iter()
            .filter_map(|planned| match planned {
                PlannedMaterial::Textured {
                    ambient,
                    diffuse,
                    specular,
                    ..
                } => Some(GpuTexturedMaterial {
                    ambient: Self::texture_slot(image_slot_start, *ambient),
                    diffuse: Self::texture_slot(image_slot_start, *diffuse),
                    specular: Self::texture_slot(image_slot_start, *specular),
                    _pad: 0,
                }),
                PlannedMaterial::Colored { .. } => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colored(name: &str, ambient: Vec4) -> MaterialDescription {
        MaterialDescription::Colored {
            name: name.to_string(),
            ambient,
            diffuse: Vec4::ONE,
            specular: Vec4::ZERO,
        }
    }

    fn textured(name: &str, a: &str, d: &str, s: &str) -> MaterialDescription {
        MaterialDescription::Textured {
            name: name.to_string(),
            ambient: a.to_string(),
            diffuse: d.to_string(),
            specular: s.to_string(),
        }
    }

    #[test]
    fn repeated_texture_paths_are_loaded_once() {
        let plan = MaterialPlan::split(
            &[
                textured("bricks", "brick.png", "brick.png", "spec.png"),
                textured("wall", "spec.png", "wall.png", "brick.png"),
            ],
            Path::new("assets"),
        );
        assert_eq!(
            plan.texture_paths(),
            &[
                PathBuf::from("assets/brick.png"),
                PathBuf::from("assets/spec.png"),
                PathBuf::from("assets/wall.png"),
            ]
        );
        assert_eq!(
            plan.materials()[1],
            PlannedMaterial::Textured {
                name: "wall".to_string(),
                ambient: 1,
                diffuse: 2,
                specular: 0,
            }
        );
        assert_eq!(plan.image_slots_needed(), 4);
    }

    #[test]
    fn colored_materials_take_three_texels_each() {
        let plan = MaterialPlan::split(
            &[
                colored("red", Vec4::new(1.0, 0.0, 0.0, 1.0)),
                colored("grey", Vec4::splat(0.5)),
            ],
            Path::new("."),
        );
        assert_eq!(plan.atlas_extent(), (6, 1));
        let pixels = plan.atlas_pixels();
        assert_eq!(&pixels[0..4], &[255, 0, 0, 255]);
        assert_eq!(&pixels[12..16], &[128, 128, 128, 128]);
        assert_eq!(&pixels[16..20], &[255, 255, 255, 255]);
        assert_eq!(&pixels[20..24], &[0, 0, 0, 0]);

        let records = plan.colored_records(7);
        assert_eq!(records[1].ambient, 3);
        assert_eq!(records[1].specular, 5);
        assert_eq!(records[1].atlas, 7);
    }

    #[test]
    fn large_atlases_wrap_onto_rows() {
        let many: Vec<_> = (0..500)
            .map(|i| colored(&format!("m{i}"), Vec4::ONE))
            .collect();
        let plan = MaterialPlan::split(&many, Path::new("."));
        assert_eq!(plan.atlas_extent(), (ATLAS_MAX_WIDTH, 2));
        assert_eq!(plan.atlas_pixels().len(), (ATLAS_MAX_WIDTH * 2 * 4) as usize);
    }

    #[test]
    fn textures_are_rebased_after_the_atlas_slot() {
        let plan = MaterialPlan::split(
            &[
                colored("red", Vec4::X),
                textured("bricks", "a.png", "b.png", "a.png"),
            ],
            Path::new("."),
        );
        let entries = plan.entries(10);
        match &entries[1] {
            MaterialEntry::Textured(m) => {
                assert_eq!((m.ambient, m.diffuse, m.specular), (11, 12, 11));
                assert_eq!(m.hashed_name, HashedName::of("bricks"));
            }
            other => panic!("unexpected entry: {other:?}"),
        }
        assert_eq!(plan.textured_records(10)[0].diffuse, 12);
        assert!(plan.colored_records(10).len() == 1);
    }

    #[test]
    fn empty_plan_needs_no_slots() {
        let plan = MaterialPlan::split(&[], Path::new("."));
        assert_eq!(plan.image_slots_needed(), 0);
        assert!(!plan.has_atlas());
        assert!(plan.atlas_pixels().is_empty());
    }
}
