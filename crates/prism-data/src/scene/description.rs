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

//! The declarative scene description read from disk.
//!
//! Descriptions are RON documents mapped onto these types with serde. Every
//! list is optional; omitted lists are empty.

use super::light::{DirectionalLight, PointLight, SpotLight};
use glam::{Quat, Vec3, Vec4};
use prism_core::SceneError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The root of a scene description.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneDescription {
    /// Colored and textured materials.
    #[serde(default)]
    pub materials: Vec<MaterialDescription>,
    /// glTF files to import.
    #[serde(default)]
    pub gltf_geometries: Vec<GltfGeometryDescription>,
    /// Shapes generated on the CPU.
    #[serde(default)]
    pub procedural_geometries: Vec<ProceduralGeometryDescription>,
    /// Directional lights.
    #[serde(default)]
    pub directional_lights: Vec<DirectionalLight>,
    /// Point lights.
    #[serde(default)]
    pub point_lights: Vec<PointLight>,
    /// Spot lights.
    #[serde(default)]
    pub spot_lights: Vec<SpotLight>,
    /// Entities drawing a procedural geometry with a material.
    #[serde(default)]
    pub procedural_entities: Vec<ProceduralEntityDescription>,
    /// Entities drawing an imported geometry with its own materials.
    #[serde(default)]
    pub gltf_entities: Vec<GltfEntityDescription>,
}

/// A material, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialDescription {
    /// Flat colours, packed into the colour atlas.
    Colored {
        /// Unique material name.
        name: String,
        /// Ambient RGBA.
        ambient: Vec4,
        /// Diffuse RGBA.
        diffuse: Vec4,
        /// Specular RGBA.
        specular: Vec4,
    },
    /// Image maps, paths relative to the asset root.
    Textured {
        /// Unique material name.
        name: String,
        /// Ambient map path.
        ambient: String,
        /// Diffuse map path.
        diffuse: String,
        /// Specular map path.
        specular: String,
    },
}

impl MaterialDescription {
    /// The material's name.
    pub fn name(&self) -> &str {
        match self {
            MaterialDescription::Colored { name, .. } | MaterialDescription::Textured { name, .. } => {
                name
            }
        }
    }
}

/// A glTF file to import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GltfGeometryDescription {
    /// Unique geometry name.
    pub name: String,
    /// Path of the `.gltf`/`.glb`, relative to the asset root.
    pub path: String,
}

/// A procedurally generated shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProceduralGeometryDescription {
    /// Unique geometry name.
    pub name: String,
    /// Shape and its generation parameters.
    pub params: GeometryParams,
}

/// Generation parameters, tagged by shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryParams {
    /// A grid in the XZ plane, centred on the origin.
    Grid {
        /// Cells along X.
        cells_x: u32,
        /// Cells along Z.
        cells_z: u32,
        /// Extent along X.
        width: f32,
        /// Extent along Z.
        depth: f32,
    },
    /// A conical section (cylinder when both radii match), capped at both ends.
    Cone {
        /// Radius at the top.
        upper_radius: f32,
        /// Radius at the bottom.
        lower_radius: f32,
        /// Height along Y.
        height: f32,
        /// Vertical subdivisions.
        tess_vert: u32,
        /// Radial subdivisions.
        tess_horz: u32,
    },
    /// A torus around the Y axis.
    Torus {
        /// Distance from the centre to the middle of the tube.
        outer_radius: f32,
        /// Radius of the tube.
        inner_radius: f32,
        /// Subdivisions around the main ring.
        rings: u32,
        /// Subdivisions around the tube.
        sides: u32,
    },
    /// A UV sphere.
    Sphere {
        /// Radius.
        radius: f32,
        /// Subdivisions around Y.
        slices: u32,
        /// Subdivisions from pole to pole.
        stacks: u32,
    },
    /// A flat annulus in the XZ plane.
    Ring {
        /// Inner radius.
        inner_radius: f32,
        /// Outer radius.
        outer_radius: f32,
        /// Radial subdivisions.
        segments: u32,
    },
    /// A (p, q) torus knot.
    TorusKnot {
        /// Windings around the axis of rotational symmetry.
        p: u32,
        /// Windings around the interior circle.
        q: u32,
        /// Radius of the knot curve.
        radius: f32,
        /// Radius of the tube swept along it.
        tube_radius: f32,
        /// Subdivisions along the curve.
        segments: u32,
        /// Subdivisions around the tube.
        sides: u32,
    },
}

/// Placement of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Orientation {
    /// World-space origin.
    pub origin: Vec3,
    /// Rotation quaternion.
    pub rotation: Quat,
    /// Uniform scale.
    pub scale: f32,
}

impl Default for Orientation {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: 1.0,
        }
    }
}

/// An entity drawing a procedural geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProceduralEntityDescription {
    /// Unique entity name.
    pub name: String,
    /// Name of a material.
    pub material: String,
    /// Name of a procedural geometry.
    pub geometry: String,
    /// Placement; identity when omitted.
    #[serde(default)]
    pub orientation: Option<Orientation>,
}

/// An entity drawing an imported geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GltfEntityDescription {
    /// Unique entity name.
    pub name: String,
    /// Name of a glTF geometry.
    pub gltf: String,
    /// Placement; identity when omitted.
    #[serde(default)]
    pub orientation: Option<Orientation>,
}

impl SceneDescription {
    /// Parses a RON document.
    ///
    /// # Errors
    /// [`SceneError::Parse`] carrying the parser's message.
    pub fn from_ron_str(text: &str) -> Result<Self, SceneError> {
        ron::from_str(text).map_err(|e| SceneError::Parse {
            message: e.to_string(),
        })
    }

    /// Reads and parses a description file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let description = Self::from_ron_str(&text)?;
        log::info!(
            "SceneDescription: loaded '{}' ({} materials, {} procedural, {} glTF geometries)",
            path.display(),
            description.materials.len(),
            description.procedural_geometries.len(),
            description.gltf_geometries.len()
        );
        Ok(description)
    }

    /// Serializes the description as pretty-printed RON.
    pub fn to_ron_string(&self) -> Result<String, SceneError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()).map_err(|e| {
            SceneError::Parse {
                message: e.to_string(),
            }
        })
    }

    /// A small demo scene exercising every procedural shape and light kind.
    pub fn sample() -> Self {
        let colored = |name: &str, diffuse: Vec4| MaterialDescription::Colored {
            name: name.to_string(),
            ambient: diffuse * 0.1,
            diffuse,
            specular: Vec4::ONE,
        };
        let shape = |name: &str, params: GeometryParams| ProceduralGeometryDescription {
            name: name.to_string(),
            params,
        };
        let entity = |name: &str, material: &str, geometry: &str, x: f32| {
            ProceduralEntityDescription {
                name: name.to_string(),
                material: material.to_string(),
                geometry: geometry.to_string(),
                orientation: Some(Orientation {
                    origin: Vec3::new(x, 0.0, 0.0),
                    ..Orientation::default()
                }),
            }
        };

        Self {
            materials: vec![
                colored("red", Vec4::new(0.8, 0.1, 0.1, 1.0)),
                colored("white", Vec4::new(0.9, 0.9, 0.9, 1.0)),
                colored("teal", Vec4::new(0.1, 0.6, 0.6, 1.0)),
            ],
            gltf_geometries: Vec::new(),
            procedural_geometries: vec![
                shape(
                    "floor",
                    GeometryParams::Grid {
                        cells_x: 32,
                        cells_z: 32,
                        width: 64.0,
                        depth: 64.0,
                    },
                ),
                shape(
                    "torus",
                    GeometryParams::Torus {
                        outer_radius: 2.0,
                        inner_radius: 0.5,
                        rings: 32,
                        sides: 16,
                    },
                ),
                shape(
                    "sphere",
                    GeometryParams::Sphere {
                        radius: 1.0,
                        slices: 32,
                        stacks: 16,
                    },
                ),
                shape(
                    "cone",
                    GeometryParams::Cone {
                        upper_radius: 0.0,
                        lower_radius: 1.0,
                        height: 2.0,
                        tess_vert: 4,
                        tess_horz: 24,
                    },
                ),
                shape(
                    "ring",
                    GeometryParams::Ring {
                        inner_radius: 1.0,
                        outer_radius: 1.5,
                        segments: 48,
                    },
                ),
                shape(
                    "knot",
                    GeometryParams::TorusKnot {
                        p: 2,
                        q: 3,
                        radius: 2.0,
                        tube_radius: 0.3,
                        segments: 128,
                        sides: 12,
                    },
                ),
            ],
            directional_lights: vec![DirectionalLight {
                direction: Vec3::new(-0.3, -1.0, -0.2).normalize(),
                ambient: Vec4::splat(0.05),
                diffuse: Vec4::splat(0.8),
                specular: Vec4::ONE,
            }],
            point_lights: vec![PointLight {
                position: Vec3::new(0.0, 5.0, 0.0),
                range: 20.0,
                attenuation: Vec3::new(1.0, 0.09, 0.032),
                ambient: Vec4::ZERO,
                diffuse: Vec4::new(1.0, 0.9, 0.7, 1.0),
                specular: Vec4::ONE,
            }],
            spot_lights: vec![SpotLight {
                position: Vec3::new(0.0, 8.0, 8.0),
                direction: Vec3::new(0.0, -1.0, -1.0).normalize(),
                range: 30.0,
                attenuation: Vec3::new(1.0, 0.045, 0.0075),
                inner_cutoff: 12.5,
                outer_cutoff: 17.5,
                ambient: Vec4::ZERO,
                diffuse: Vec4::ONE,
                specular: Vec4::ONE,
            }],
            procedural_entities: vec![
                entity("floor", "white", "floor", 0.0),
                entity("torus0", "red", "torus", -6.0),
                entity("sphere0", "teal", "sphere", -3.0),
                entity("cone0", "red", "cone", 0.0),
                entity("ring0", "white", "ring", 3.0),
                entity("knot0", "teal", "knot", 6.0),
            ],
            gltf_entities: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
(
    materials: [
        colored(
            name: "red",
            ambient: (0.1, 0.0, 0.0, 1.0),
            diffuse: (0.8, 0.0, 0.0, 1.0),
            specular: (1.0, 1.0, 1.0, 1.0),
        ),
        textured(
            name: "bricks",
            ambient: "textures/bricks.png",
            diffuse: "textures/bricks.png",
            specular: "textures/bricks_spec.png",
        ),
    ],
    procedural_geometries: [
        (name: "floor", params: grid(cells_x: 2, cells_z: 2, width: 1.0, depth: 1.0)),
    ],
    procedural_entities: [
        (name: "floor0", material: "red", geometry: "floor"),
    ],
    gltf_entities: [
        (name: "helmet0", gltf: "helmet", orientation: Some((scale: 2.0))),
    ],
)
"#;

    #[test]
    fn parses_tagged_materials_and_shapes() {
        let scene = SceneDescription::from_ron_str(MINIMAL).unwrap();
        assert_eq!(scene.materials.len(), 2);
        assert_eq!(scene.materials[0].name(), "red");
        assert!(matches!(
            &scene.materials[1],
            MaterialDescription::Textured { diffuse, .. } if diffuse == "textures/bricks.png"
        ));
        assert_eq!(
            scene.procedural_geometries[0].params,
            GeometryParams::Grid {
                cells_x: 2,
                cells_z: 2,
                width: 1.0,
                depth: 1.0
            }
        );
        assert!(scene.gltf_geometries.is_empty());
        assert!(scene.point_lights.is_empty());
        assert_eq!(scene.procedural_entities[0].orientation, None);
    }

    #[test]
    fn omitted_orientation_fields_default_to_identity() {
        let scene = SceneDescription::from_ron_str(MINIMAL).unwrap();
        let orientation = scene.gltf_entities[0].orientation.unwrap();
        assert_eq!(orientation.scale, 2.0);
        assert_eq!(orientation.origin, Vec3::ZERO);
        assert_eq!(orientation.rotation, Quat::IDENTITY);
    }

    #[test]
    fn parse_failure_carries_parser_message() {
        let err = SceneDescription::from_ron_str("(materials: [colored(name: 1)])").unwrap_err();
        match err {
            SceneError::Parse { message } => assert!(!message.is_empty()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn sample_survives_a_ron_round_trip() {
        let sample = SceneDescription::sample();
        let text = sample.to_ron_string().unwrap();
        assert_eq!(SceneDescription::from_ron_str(&text).unwrap(), sample);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = SceneDescription::load("does/not/exist.ron").unwrap_err();
        assert!(matches!(err, SceneError::Io { .. }));
    }
}
