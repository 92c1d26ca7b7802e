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

fn cap_counts(radius: f32, tess_horz: u64) -> (u64, u64) {
    if radius > 0.0 {
        (tess_horz + 2, 3 * tess_horz)
    } else {
        (0, 0)
    }
}

pub(super) fn counts(upper_radius: f32, lower_radius: f32, tess_vert: u32, tess_horz: u32) -> (u64, u64) {
    let (tv, th) = (u64::from(tess_vert), u64::from(tess_horz));
    let (top_v, top_i) = cap_counts(upper_radius, th);
    let (bottom_v, bottom_i) = cap_counts(lower_radius, th);
    (
        (tv + 1).saturating_mul(th + 1).saturating_add(top_v + bottom_v),
        tv.saturating_mul(th).saturating_mul(6).saturating_add(top_i + bottom_i),
    )
}

/// A conical section along Y, centred on the origin. Either radius may be
/// zero, in which case that end is a point and gets no cap.
pub(super) fn generate(
    upper_radius: f32,
    lower_radius: f32,
    height: f32,
    tess_vert: u32,
    tess_horz: u32,
) -> GeometryData<VertexPnt> {
    let row = tess_horz + 1;
    let slope = (lower_radius - upper_radius) / height;
    let mut data = GeometryData::default();

    for j in 0..=tess_vert {
        let t = j as f32 / tess_vert as f32;
        let y = (t - 0.5) * height;
        let radius = lower_radius + (upper_radius - lower_radius) * t;
        for i in 0..=tess_horz {
            let u = i as f32 / tess_horz as f32;
            let (sin, cos) = (u * 2.0 * PI).sin_cos();
            data.vertices.push(vertex(
                Vec3::new(cos * radius, y, sin * radius),
                Vec3::new(cos, slope, sin).normalize(),
                Vec2::new(u, t),
            ));
        }
    }
    for j in 0..tess_vert {
        for i in 0..tess_horz {
            let a = j * row + i;
            push_quad(&mut data.indices, a, a + row);
        }
    }

    if lower_radius > 0.0 {
        push_cap(&mut data, lower_radius, -0.5 * height, -Vec3::Y, tess_horz);
    }
    if upper_radius > 0.0 {
        push_cap(&mut data, upper_radius, 0.5 * height, Vec3::Y, tess_horz);
    }
    data
}

fn push_cap(data: &mut GeometryData<VertexPnt>, radius: f32, y: f32, normal: Vec3, tess_horz: u32) {
    let centre = data.vertices.len() as u32;
    data.vertices
        .push(vertex(Vec3::new(0.0, y, 0.0), normal, Vec2::splat(0.5)));
    for i in 0..=tess_horz {
        let u = i as f32 / tess_horz as f32;
        let (sin, cos) = (u * 2.0 * PI).sin_cos();
        data.vertices.push(vertex(
            Vec3::new(cos * radius, y, sin * radius),
            normal,
            Vec2::new(0.5 + 0.5 * cos, 0.5 + 0.5 * sin),
        ));
    }
    for i in 0..tess_horz {
        let rim = centre + 1 + i;
        if normal.y > 0.0 {
            data.indices.extend_from_slice(&[centre, rim + 1, rim]);
        } else {
            data.indices.extend_from_slice(&[centre, rim, rim + 1]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caps_are_only_added_for_open_ends() {
        let (cylinder_v, cylinder_i) = counts(1.0, 1.0, 1, 8);
        let (cone_v, cone_i) = counts(0.0, 1.0, 1, 8);
        assert_eq!(cylinder_v - cone_v, 10);
        assert_eq!(cylinder_i - cone_i, 24);
    }

    #[test]
    fn side_spans_the_full_height() {
        let data = generate(0.5, 1.0, 4.0, 2, 6);
        let ys: Vec<f32> = data.vertices.iter().map(|v| v.position[1]).collect();
        assert!(ys.iter().any(|&y| y == -2.0));
        assert!(ys.iter().any(|&y| y == 2.0));
    }
}
