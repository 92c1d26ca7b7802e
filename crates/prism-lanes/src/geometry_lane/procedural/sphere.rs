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

use super::vertex;
use crate::geometry_lane::GeometryData;
use glam::{Vec2, Vec3};
use prism_data::gpu::VertexPnt;
use std::f32::consts::PI;

pub(super) fn counts(slices: u32, stacks: u32) -> (u64, u64) {
    let (sl, st) = (u64::from(slices), u64::from(stacks));
    (
        (sl + 1).saturating_mul(st + 1),
        sl.saturating_mul(st - 1).saturating_mul(6),
    )
}

/// A UV sphere. The first and last stacks are fans, so the poles carry one
/// triangle per slice instead of a degenerate quad.
pub(super) fn generate(radius: f32, slices: u32, stacks: u32) -> GeometryData<VertexPnt> {
    let row = slices + 1;
    let mut data = GeometryData::default();

    for j in 0..=stacks {
        let v = j as f32 / stacks as f32;
        let (sin_phi, cos_phi) = (v * PI).sin_cos();
        for i in 0..=slices {
            let u = i as f32 / slices as f32;
            let (sin_theta, cos_theta) = (u * 2.0 * PI).sin_cos();
            let normal = Vec3::new(sin_phi * cos_theta, cos_phi, sin_phi * sin_theta);
            data.vertices
                .push(vertex(normal * radius, normal.normalize(), Vec2::new(u, v)));
        }
    }

    for j in 0..stacks {
        for i in 0..slices {
            let a = j * row + i;
            let b = a + row;
            if j != 0 {
                data.indices.extend_from_slice(&[a, b, a + 1]);
            }
            if j != stacks - 1 {
                data.indices.extend_from_slice(&[a + 1, b, b + 1]);
            }
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn every_vertex_lies_on_the_surface() {
        let data = generate(2.5, 8, 5);
        for v in &data.vertices {
            assert_relative_eq!(Vec3::from_array(v.position).length(), 2.5, epsilon = 1e-4);
        }
    }

    #[test]
    fn two_stacks_still_close_the_sphere() {
        let data = generate(1.0, 4, 2);
        assert_eq!(data.indices.len(), 6 * 4);
    }

    #[test]
    fn poles_point_straight_up_and_down() {
        let data = generate(1.0, 6, 4);
        assert_relative_eq!(data.vertices[0].normal[1], 1.0, epsilon = 1e-6);
        let last = data.vertices.len() - 1;
        assert_relative_eq!(data.vertices[last].normal[1], -1.0, epsilon = 1e-6);
    }
}
