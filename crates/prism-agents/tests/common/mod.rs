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

//! Shared fixtures for the scene assembly tests.

#![allow(dead_code)]

use prism_agents::scene_agent::{AssemblerConfig, SceneAssembler};
use prism_core::renderer::GraphicsDevice;
use prism_core::task::{renderer_promise, SharedRendererHandle};
use prism_data::scene::SceneDescription;
use prism_infra::{DeviceSettings, HeadlessDevice};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A host-memory device, plus the same device behind the trait object.
pub fn devices() -> (Arc<HeadlessDevice>, Arc<dyn GraphicsDevice>) {
    let settings = DeviceSettings {
        staging_capacity: 8 << 20,
        ..DeviceSettings::default()
    };
    let headless = Arc::new(HeadlessDevice::new(&settings));
    let device: Arc<dyn GraphicsDevice> = headless.clone();
    (headless, device)
}

/// A renderer handle that is already resolved.
pub fn resolved(device: Arc<dyn GraphicsDevice>) -> SharedRendererHandle<dyn GraphicsDevice> {
    let (promise, handle) = renderer_promise::<dyn GraphicsDevice>();
    promise.resolve(device);
    handle
}

/// An assembler spawning on the test runtime.
pub fn assembler(
    renderer: SharedRendererHandle<dyn GraphicsDevice>,
    config: AssemblerConfig,
) -> SceneAssembler {
    SceneAssembler::new(tokio::runtime::Handle::current(), renderer, config)
}

/// One 2x2 grid drawn by one entity using `material`.
pub fn grid_scene(material: &str) -> SceneDescription {
    SceneDescription::from_ron_str(&format!(
        r#"(
    materials: [
        colored(
            name: "red",
            ambient: (0.1, 0.0, 0.0, 1.0),
            diffuse: (0.8, 0.0, 0.0, 1.0),
            specular: (1.0, 1.0, 1.0, 1.0),
        ),
    ],
    procedural_geometries: [
        (name: "floor", params: grid(cells_x: 2, cells_z: 2, width: 1.0, depth: 1.0)),
    ],
    procedural_entities: [
        (name: "floor0", material: "{material}", geometry: "floor"),
    ],
)"#
    ))
    .expect("fixture scene parses")
}

/// Writes a `width`x`height` PNG filled with `rgba` and returns its path.
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32, rgba: [u8; 4]) -> PathBuf {
    let path = dir.join(name);
    image::RgbaImage::from_pixel(width, height, image::Rgba(rgba))
        .save(&path)
        .expect("png written");
    path
}

/// Writes `<name>.gltf` with one triangle whose positions live in a
/// sibling `<name>.bin`.
pub fn write_triangle_gltf(dir: &Path, name: &str) -> PathBuf {
    let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    std::fs::write(
        dir.join(format!("{name}.bin")),
        bytemuck::cast_slice::<[f32; 3], u8>(&positions),
    )
    .expect("bin written");

    let document = format!(
        r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [ {{ "nodes": [0] }} ],
  "nodes": [ {{ "mesh": 0 }} ],
  "meshes": [ {{ "primitives": [ {{ "attributes": {{ "POSITION": 0 }} }} ] }} ],
  "buffers": [ {{ "byteLength": 36, "uri": "{name}.bin" }} ],
  "bufferViews": [ {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }} ],
  "accessors": [ {{
    "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
    "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
  }} ]
}}"#
    );
    let path = dir.join(format!("{name}.gltf"));
    std::fs::write(&path, document).expect("gltf written");
    path
}
