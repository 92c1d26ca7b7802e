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

pub(super) fn counts(cells_x: u32, cells_z: u32) -> (u64, u64) {
    let (cx, cz) = (u64::from(cells_x), u64::from(cells_z));
    ((cx + 1).saturating_mul(cz + 1), cx.saturating_mul(cz).saturating_mul(6))
}

/// A flat grid in the XZ plane, centred on the origin and facing +Y.
pub(super) fn generate(cells_x: u32, cells_z: u32, width: f32, depth: f32) -> GeometryData<VertexPnt> {
    let row = cells_x + 1;
    let mut data = GeometryData::default();

    for j in 0..=cells_z {
        let tz = j as f32 / cells_z as f32;
        for i in 0..=cells_x {
            let tx = i as f32 / cells_x as f32;
            data.vertices.push(vertex(
                Vec3::new((tx - 0.5) * width, 0.0, (tz - 0.5) * depth),
                Vec3::Y,
                Vec2::new(tx, tz),
            ));
        }
    }

    for j in 0..cells_z {
        for i in 0..cells_x {
            let a = j * row + i;
            push_quad(&mut data.indices, a, a + row);
        }
    }
    data
}
