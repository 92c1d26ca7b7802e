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

use super::{push_quad, vertex};
use crate::geometry_lane::GeometryData;
use glam::{Vec2, Vec3};
use prism_data::gpu::VertexPnt;
use std::f32::consts::PI;

pub(super) fn counts(rings: u32, sides: u32) -> (u64, u64) {
    let (r, s) = (u64::from(rings), u64::from(sides));
    ((r + 1).saturating_mul(s + 1), r.saturating_mul(s).saturating_mul(6))
}

/// A torus around the Y axis. `outer_radius` is the distance from the centre
/// to the middle of the tube, `inner_radius` the tube radius.
pub(super) fn generate(outer_radius: f32, inner_radius: f32, rings: u32, sides: u32) -> GeometryData<VertexPnt> {
    let row = sides + 1;
    let mut data = GeometryData::default();

    for i in 0..=rings {
        let u = i as f32 / rings as f32;
        let (sin_u, cos_u) = (u * 2.0 * PI).sin_cos();
        let centre = Vec3::new(cos_u, 0.0, sin_u) * outer_radius;
        for j in 0..=sides {
            let v = j as f32 / sides as f32;
            let (sin_v, cos_v) = (v * 2.0 * PI).sin_cos();
            let normal = Vec3::new(cos_v * cos_u, sin_v, cos_v * sin_u);
            data.vertices.push(vertex(
                centre + normal * inner_radius,
                normal.normalize(),
                Vec2::new(u, v),
            ));
        }
    }

    for i in 0..rings {
        for j in 0..sides {
            let a = i * row + j;
            push_quad(&mut data.indices, a, a + row);
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn vertices_stay_within_the_tube() {
        let data = generate(3.0, 1.0, 16, 8);
        for v in &data.vertices {
            let p = Vec3::from_array(v.position);
            let centre = Vec3::new(p.x, 0.0, p.z).normalize() * 3.0;
            assert_relative_eq!((p - centre).length(), 1.0, epsilon = 1e-4);
        }
    }
}
