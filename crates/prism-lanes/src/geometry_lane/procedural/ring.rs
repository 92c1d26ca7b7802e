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

pub(super) fn counts(segments: u32) -> (u64, u64) {
    let s = u64::from(segments);
    (2 * (s + 1), 6 * s)
}

/// A flat annulus in the XZ plane facing +Y. Vertices alternate inner/outer.
pub(super) fn generate(inner_radius: f32, outer_radius: f32, segments: u32) -> GeometryData<VertexPnt> {
    let mut data = GeometryData::default();

    for i in 0..=segments {
        let t = i as f32 / segments as f32;
        let (sin, cos) = (t * 2.0 * PI).sin_cos();
        let dir = Vec3::new(cos, 0.0, sin);
        data.vertices.push(vertex(dir * inner_radius, Vec3::Y, Vec2::new(t, 0.0)));
        data.vertices.push(vertex(dir * outer_radius, Vec3::Y, Vec2::new(t, 1.0)));
    }

    for i in 0..segments {
        let a = 2 * i;
        data.indices
            .extend_from_slice(&[a, a + 2, a + 1, a + 1, a + 2, a + 3]);
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn inner_and_outer_vertices_sit_on_their_radii() {
        let data = generate(1.0, 3.0, 12);
        for pair in data.vertices.chunks(2) {
            assert_relative_eq!(Vec3::from_array(pair[0].position).length(), 1.0, epsilon = 1e-5);
            assert_relative_eq!(Vec3::from_array(pair[1].position).length(), 3.0, epsilon = 1e-5);
        }
    }
}
