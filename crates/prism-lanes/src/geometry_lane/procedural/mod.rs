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

//! Procedural shape synthesis.
//!
//! Every shape has closed-form vertex and index counts. [`counts`] validates
//! the parameters and returns those counts without generating anything, which
//! is what the synchronous layout pass needs; [`generate`] produces the data
//! and checks it against the same counts.

mod cone;
mod grid;
mod ring;
mod sphere;
mod torus;
mod torus_knot;

use super::GeometryData;
use prism_data::gpu::VertexPnt;
use prism_data::scene::{GeometryCounts, GeometryParams};
use prism_core::SceneError;

fn invalid(name: &str, reason: impl Into<String>) -> SceneError {
    SceneError::InvalidGeometry {
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn require(name: &str, ok: bool, reason: &str) -> Result<(), SceneError> {
    if ok {
        Ok(())
    } else {
        Err(invalid(name, reason))
    }
}

fn validate(name: &str, params: &GeometryParams) -> Result<(), SceneError> {
    match *params {
        GeometryParams::Grid {
            cells_x,
            cells_z,
            width,
            depth,
        } => {
            require(name, cells_x > 0 && cells_z > 0, "grid needs at least one cell per axis")?;
            require(name, width > 0.0 && depth > 0.0, "grid size must be positive")
        }
        GeometryParams::Cone {
            upper_radius,
            lower_radius,
            height,
            tess_vert,
            tess_horz,
        } => {
            require(name, height > 0.0, "cone height must be positive")?;
            require(
                name,
                upper_radius >= 0.0 && lower_radius >= 0.0 && upper_radius + lower_radius > 0.0,
                "cone radii must be non-negative and not both zero",
            )?;
            require(name, tess_vert >= 1, "cone needs at least one vertical division")?;
            require(name, tess_horz >= 3, "cone needs at least three radial divisions")
        }
        GeometryParams::Torus {
            outer_radius,
            inner_radius,
            rings,
            sides,
        } => {
            require(
                name,
                inner_radius > 0.0 && outer_radius > inner_radius,
                "torus needs 0 < inner_radius < outer_radius",
            )?;
            require(name, rings >= 3 && sides >= 3, "torus needs at least three rings and sides")
        }
        GeometryParams::Sphere {
            radius,
            slices,
            stacks,
        } => {
            require(name, radius > 0.0, "sphere radius must be positive")?;
            require(name, slices >= 3 && stacks >= 2, "sphere needs slices >= 3 and stacks >= 2")
        }
        GeometryParams::Ring {
            inner_radius,
            outer_radius,
            segments,
        } => {
            require(
                name,
                inner_radius >= 0.0 && outer_radius > inner_radius,
                "ring needs 0 <= inner_radius < outer_radius",
            )?;
            require(name, segments >= 3, "ring needs at least three segments")
        }
        GeometryParams::TorusKnot {
            p,
            q,
            radius,
            tube_radius,
            segments,
            sides,
        } => {
            require(name, p >= 1 && q >= 1, "torus knot windings must be at least 1")?;
            require(
                name,
                radius > 0.0 && tube_radius > 0.0,
                "torus knot radii must be positive",
            )?;
            require(
                name,
                segments >= 3 && sides >= 3,
                "torus knot needs at least three segments and sides",
            )
        }
    }
}

/// Validates `params` and returns the vertex/index counts the shape will have.
///
/// # Errors
/// [`SceneError::InvalidGeometry`] naming the geometry.
pub fn counts(name: &str, params: &GeometryParams) -> Result<GeometryCounts, SceneError> {
    validate(name, params)?;
    let (vertices, indices) = match *params {
        GeometryParams::Grid {
            cells_x, cells_z, ..
        } => grid::counts(cells_x, cells_z),
        GeometryParams::Cone {
            upper_radius,
            lower_radius,
            tess_vert,
            tess_horz,
            ..
        } => cone::counts(upper_radius, lower_radius, tess_vert, tess_horz),
        GeometryParams::Torus { rings, sides, .. } => torus::counts(rings, sides),
        GeometryParams::Sphere { slices, stacks, .. } => sphere::counts(slices, stacks),
        GeometryParams::Ring { segments, .. } => ring::counts(segments),
        GeometryParams::TorusKnot {
            segments, sides, ..
        } => torus_knot::counts(segments, sides),
    };
    match (u32::try_from(vertices), u32::try_from(indices)) {
        (Ok(vertices), Ok(indices)) => Ok(GeometryCounts { vertices, indices }),
        _ => Err(invalid(name, "too many vertices for 32-bit indices")),
    }
}

/// Synthesizes the shape described by `params`.
///
/// # Errors
/// [`SceneError::InvalidGeometry`] for bad parameters, and
/// [`SceneError::InvariantViolation`] if the output disagrees with [`counts`].
pub fn generate(name: &str, params: &GeometryParams) -> Result<GeometryData<VertexPnt>, SceneError> {
    let expected = counts(name, params)?;
    let data = match *params {
        GeometryParams::Grid {
            cells_x,
            cells_z,
            width,
            depth,
        } => grid::generate(cells_x, cells_z, width, depth),
        GeometryParams::Cone {
            upper_radius,
            lower_radius,
            height,
            tess_vert,
            tess_horz,
        } => cone::generate(upper_radius, lower_radius, height, tess_vert, tess_horz),
        GeometryParams::Torus {
            outer_radius,
            inner_radius,
            rings,
            sides,
        } => torus::generate(outer_radius, inner_radius, rings, sides),
        GeometryParams::Sphere {
            radius,
            slices,
            stacks,
        } => sphere::generate(radius, slices, stacks),
        GeometryParams::Ring {
            inner_radius,
            outer_radius,
            segments,
        } => ring::generate(inner_radius, outer_radius, segments),
        GeometryParams::TorusKnot {
            p,
            q,
            radius,
            tube_radius,
            segments,
            sides,
        } => torus_knot::generate(p, q, radius, tube_radius, segments, sides),
    };

    let produced = GeometryCounts {
        vertices: data.vertices.len() as u32,
        indices: data.indices.len() as u32,
    };
    if produced != expected {
        return Err(SceneError::InvariantViolation(format!(
            "geometry '{name}' produced {produced:?}, layout reserved {expected:?}"
        )));
    }
    Ok(data)
}

/// Appends the two triangles of the quad `(a, a + 1, b, b + 1)`, where `b` is
/// the vertex below `a` in the next row.
fn push_quad(indices: &mut Vec<u32>, a: u32, b: u32) {
    indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
}

/// Builds a [`VertexPnt`] from glam values.
fn vertex(position: glam::Vec3, normal: glam::Vec3, uv: glam::Vec2) -> VertexPnt {
    VertexPnt {
        position: position.to_array(),
        normal: normal.to_array(),
        uv: uv.to_array(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn all_shapes() -> Vec<(&'static str, GeometryParams)> {
        vec![
            (
                "grid",
                GeometryParams::Grid {
                    cells_x: 3,
                    cells_z: 2,
                    width: 4.0,
                    depth: 2.0,
                },
            ),
            (
                "cone",
                GeometryParams::Cone {
                    upper_radius: 0.5,
                    lower_radius: 1.0,
                    height: 2.0,
                    tess_vert: 3,
                    tess_horz: 8,
                },
            ),
            (
                "pointy",
                GeometryParams::Cone {
                    upper_radius: 0.0,
                    lower_radius: 1.0,
                    height: 1.0,
                    tess_vert: 1,
                    tess_horz: 6,
                },
            ),
            (
                "torus",
                GeometryParams::Torus {
                    outer_radius: 2.0,
                    inner_radius: 0.5,
                    rings: 12,
                    sides: 8,
                },
            ),
            (
                "sphere",
                GeometryParams::Sphere {
                    radius: 1.5,
                    slices: 10,
                    stacks: 6,
                },
            ),
            (
                "ring",
                GeometryParams::Ring {
                    inner_radius: 1.0,
                    outer_radius: 2.0,
                    segments: 16,
                },
            ),
            (
                "knot",
                GeometryParams::TorusKnot {
                    p: 2,
                    q: 3,
                    radius: 2.0,
                    tube_radius: 0.25,
                    segments: 64,
                    sides: 8,
                },
            ),
        ]
    }

    #[test]
    fn every_shape_matches_its_closed_form_counts() {
        for (name, params) in all_shapes() {
            let expected = counts(name, &params).unwrap();
            let data = generate(name, &params).unwrap();
            assert_eq!(data.vertices.len() as u32, expected.vertices, "{name}");
            assert_eq!(data.indices.len() as u32, expected.indices, "{name}");
            assert_eq!(data.indices.len() % 3, 0, "{name}");
        }
    }

    #[test]
    fn indices_stay_in_range_and_normals_are_unit() {
        for (name, params) in all_shapes() {
            let data = generate(name, &params).unwrap();
            let count = data.vertices.len() as u32;
            assert!(data.indices.iter().all(|&i| i < count), "{name}");
            for v in &data.vertices {
                let n = glam::Vec3::from_array(v.normal);
                assert_relative_eq!(n.length(), 1.0, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn grid_counts_match_cell_formula() {
        let params = GeometryParams::Grid {
            cells_x: 2,
            cells_z: 2,
            width: 1.0,
            depth: 1.0,
        };
        assert_eq!(
            counts("floor", &params).unwrap(),
            GeometryCounts {
                vertices: 9,
                indices: 24
            }
        );
        let rect = GeometryParams::Grid {
            cells_x: 4,
            cells_z: 1,
            width: 1.0,
            depth: 1.0,
        };
        assert_eq!(
            counts("strip", &rect).unwrap(),
            GeometryCounts {
                vertices: 10,
                indices: 24
            }
        );
    }

    #[test]
    fn invalid_parameters_name_the_geometry() {
        let err = counts(
            "bad",
            &GeometryParams::Sphere {
                radius: 1.0,
                slices: 2,
                stacks: 4,
            },
        )
        .unwrap_err();
        match err {
            SceneError::InvalidGeometry { name, .. } => assert_eq!(name, "bad"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(counts(
            "flat",
            &GeometryParams::Grid {
                cells_x: 0,
                cells_z: 1,
                width: 1.0,
                depth: 1.0
            }
        )
        .is_err());
    }

    #[test]
    fn oversized_shapes_are_rejected_before_generation() {
        let err = counts(
            "huge",
            &GeometryParams::Grid {
                cells_x: u32::MAX,
                cells_z: u32::MAX,
                width: 1.0,
                depth: 1.0,
            },
        )
        .unwrap_err();
        assert!(matches!(err, SceneError::InvalidGeometry { .. }));
    }
}
