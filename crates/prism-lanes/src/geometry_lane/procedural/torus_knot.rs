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

pub(super) fn counts(segments: u32, sides: u32) -> (u64, u64) {
    let (sg, sd) = (u64::from(segments), u64::from(sides));
    ((sg + 1).saturating_mul(sd + 1), sg.saturating_mul(sd).saturating_mul(6))
}

/// A point on the (p, q) knot curve at parameter `u`.
fn curve_point(u: f32, p: u32, q: u32, radius: f32) -> Vec3 {
    let (su, cu) = u.sin_cos();
    let (sq, cq) = (q as f32 / p as f32 * u).sin_cos();
    Vec3::new(
        radius * (2.0 + cq) * 0.5 * cu,
        radius * (2.0 + cq) * 0.5 * su,
        radius * sq * 0.5,
    )
}

/// A tube swept along a (p, q) torus knot.
pub(super) fn generate(
    p: u32,
    q: u32,
    radius: f32,
    tube_radius: f32,
    segments: u32,
    sides: u32,
) -> GeometryData<VertexPnt> {
    let row = sides + 1;
    let mut data = GeometryData::default();

    for i in 0..=segments {
        let t = i as f32 / segments as f32;
        let u = t * p as f32 * 2.0 * PI;
        let p1 = curve_point(u, p, q, radius);
        let p2 = curve_point(u + 0.01, p, q, radius);

        // Frame from the tangent and the sum of neighbouring points.
        let tangent = p2 - p1;
        let binormal = tangent.cross(p2 + p1).normalize();
        let normal = binormal.cross(tangent).normalize();

        for j in 0..=sides {
            let v = j as f32 / sides as f32;
            let (sin, cos) = (v * 2.0 * PI).sin_cos();
            let offset = normal * (-cos * tube_radius) + binormal * (sin * tube_radius);
            data.vertices
                .push(vertex(p1 + offset, offset.normalize(), Vec2::new(t, v)));
        }
    }

    for i in 0..segments {
        for j in 0..sides {
            let a = i * row + j;
            let b = a + row;
            data.indices
                .extend_from_slice(&[a, b, a + 1, b, b + 1, a + 1]);
        }
    }
    data
}
