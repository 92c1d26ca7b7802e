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

//! End-to-end scene assembly against the host-memory device.

mod common;

use anyhow::Result;
use common::{assembler, devices, grid_scene, resolved, write_png, write_triangle_gltf};
use prism_agents::scene_agent::AssemblerConfig;
use prism_core::renderer::GraphicsDevice;
use prism_core::task::renderer_promise;
use prism_core::{ImportError, ProgramError, SceneError};
use prism_data::gpu::{VertexPbr, VertexPnt};
use prism_data::scene::{
    GeometryRef, GltfEntityDescription, GltfGeometryDescription, MaterialEntry, MaterialRef,
    SceneDescription,
};
use prism_lanes::geometry_lane::importer::{GeometryImporter, ImportedGeometryData};
use prism_lanes::geometry_lane::procedural;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread")]
async fn undefined_material_fails_naming_entity_and_reference() -> Result<()> {
    let (_headless, device) = devices();
    let assembler = assembler(resolved(device), AssemblerConfig::default());

    let err = assembler
        .assemble(grid_scene("missing"))
        .await
        .expect_err("an undefined material must not build");

    match err {
        ProgramError::Scene(SceneError::UnresolvedMaterial { entity, reference }) => {
            assert_eq!(entity, "floor0");
            assert_eq!(reference, "missing");
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn unresolved_reference_cancels_tasks_waiting_for_the_renderer() -> Result<()> {
    let (headless, device) = devices();
    let (promise, handle) = renderer_promise::<dyn GraphicsDevice>();
    let assembler = assembler(handle, AssemblerConfig::default());

    let err = assembler
        .assemble(grid_scene("missing"))
        .await
        .expect_err("an undefined material must not build");
    assert!(matches!(
        err,
        ProgramError::Scene(SceneError::UnresolvedMaterial { .. })
    ));

    // A renderer arriving after the failure must not wake any task into GPU work.
    promise.resolve(device);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(headless.submissions(), 0);
    assert_eq!(headless.live_buffers(), 0);
    assert_eq!(headless.jobs_in_flight(), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn grid_scene_builds_one_entry_and_one_entity() -> Result<()> {
    let (headless, device) = devices();
    let assembler = assembler(resolved(device.clone()), AssemblerConfig::default());

    let scene = assembler.assemble(grid_scene("red")).await?;

    assert_eq!(scene.geometry_count(), 1);
    assert_eq!(scene.entities.len(), 1);
    assert_eq!(scene.entities[0].geometry, GeometryRef::Procedural(0));
    assert_eq!(scene.entities[0].material, Some(MaterialRef::Colored(0)));

    let entry = &scene.procedural.entries()[0];
    assert_eq!((entry.vertex_count, entry.index_count), (9, 24));
    let template = &scene.procedural.draw_templates()[0];
    assert_eq!(template.index_count(), entry.index_count);
    assert_eq!(template.first_index(), entry.index_offset);

    let vertex_buffer = scene.procedural.vertex_buffer.as_ref().expect("vertex buffer");
    assert_eq!(vertex_buffer.size(), 9 * VertexPnt::SIZE);

    // The device copy matches a fresh synthesis byte for byte.
    let params = &grid_scene("red").procedural_geometries[0].params;
    let expected = procedural::generate("floor", params)?;
    assert_eq!(
        headless.buffer_contents(vertex_buffer.id()).expect("live buffer"),
        expected.vertex_bytes()
    );

    // Every token was waited on and the staging buffer is reusable.
    assert_eq!(headless.jobs_in_flight(), 0);
    assert_eq!(device.staging().used(), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn undefined_geometry_fails_naming_entity_and_reference() -> Result<()> {
    let (_headless, device) = devices();
    let assembler = assembler(resolved(device), AssemblerConfig::default());

    let mut description = grid_scene("red");
    description.procedural_entities[0].geometry = "ceiling".to_string();
    let err = assembler.assemble(description).await.expect_err("must fail");

    assert!(matches!(
        err,
        ProgramError::Scene(SceneError::UnresolvedGeometry { ref entity, ref reference })
            if entity == "floor0" && reference == "ceiling"
    ));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn unparsable_file_fails_before_any_gpu_work() -> Result<()> {
    let (headless, device) = devices();
    let assembler = assembler(resolved(device), AssemblerConfig::default());
    let live_before = headless.live_buffers();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("scene.ron");
    std::fs::write(&path, "(materials: [colored(name: 1)])")?;

    let err = assembler.assemble_file(&path).await.expect_err("must fail");
    assert!(matches!(err, ProgramError::Scene(SceneError::Parse { .. })));
    assert_eq!(headless.live_buffers(), live_before);
    assert_eq!(headless.submissions(), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn renderer_resolved_later_is_picked_up_by_waiting_tasks() -> Result<()> {
    let (_headless, device) = devices();
    let (promise, handle) = renderer_promise::<dyn GraphicsDevice>();
    let assembler = assembler(handle, AssemblerConfig::default());

    let producer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        promise.resolve(device);
    });
    let scene = assembler.assemble(grid_scene("red")).await?;
    producer.await?;

    assert_eq!(scene.entities.len(), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn renderer_that_never_arrives_hits_the_deadline() -> Result<()> {
    let (promise, handle) = renderer_promise::<dyn GraphicsDevice>();
    let config = AssemblerConfig {
        startup_deadline: Duration::from_millis(50),
        ..AssemblerConfig::default()
    };
    let assembler = assembler(handle, config);

    let err = assembler.assemble(grid_scene("red")).await.expect_err("must time out");
    assert!(matches!(
        err,
        ProgramError::Scene(SceneError::StartupDeadline { .. })
    ));
    drop(promise);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn dropped_promise_reports_the_renderer_unavailable() -> Result<()> {
    let (promise, handle) = renderer_promise::<dyn GraphicsDevice>();
    drop(promise);
    let assembler = assembler(handle, AssemblerConfig::default());

    let err = assembler.assemble(grid_scene("red")).await.expect_err("must fail");
    assert!(matches!(
        err,
        ProgramError::Scene(SceneError::RendererUnavailable)
    ));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn textured_materials_share_repeated_texture_files() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_png(dir.path(), "stone.png", 2, 2, [10, 20, 30, 255]);
    write_png(dir.path(), "stone_spec.png", 1, 1, [255, 255, 255, 255]);

    let description = SceneDescription::from_ron_str(
        r#"(
    materials: [
        textured(name: "stone", ambient: "stone.png", diffuse: "stone.png", specular: "stone_spec.png"),
        colored(
            name: "red",
            ambient: (0.1, 0.0, 0.0, 1.0),
            diffuse: (0.8, 0.0, 0.0, 1.0),
            specular: (1.0, 1.0, 1.0, 1.0),
        ),
        textured(name: "stone2", ambient: "stone_spec.png", diffuse: "stone.png", specular: "stone.png"),
    ],
    procedural_geometries: [
        (name: "floor", params: grid(cells_x: 1, cells_z: 1, width: 1.0, depth: 1.0)),
    ],
    procedural_entities: [
        (name: "floor0", material: "stone2", geometry: "floor"),
    ],
)"#,
    )?;

    let (headless, device) = devices();
    let assembler = assembler(
        resolved(device),
        AssemblerConfig::with_asset_root(dir.path()),
    );
    let scene = assembler.assemble(description).await?;
    let materials = &scene.materials;

    assert_eq!(materials.textures.len(), 2);
    assert_eq!(scene.entities[0].material, Some(MaterialRef::Textured(1)));

    let start = materials.image_slot_start;
    match &materials.entries[0] {
        MaterialEntry::Textured(stone) => {
            assert_eq!(stone.ambient, start + 1);
            assert_eq!(stone.diffuse, start + 1);
            assert_eq!(stone.specular, start + 2);
        }
        other => panic!("unexpected entry: {other:?}"),
    }

    let stone = headless
        .texture_contents(materials.textures[0].id())
        .expect("live texture");
    assert_eq!(stone, [10u8, 20, 30, 255].repeat(4));

    let atlas = materials.color_atlas.as_ref().expect("atlas for the colored material");
    assert_eq!(atlas.dimensions(), (3, 1));
    let texels = headless.texture_contents(atlas.id()).expect("live atlas");
    assert_eq!(texels[4..8], [204u8, 0, 0, 255]);

    assert!(materials.colored_buffer.is_some());
    assert!(materials.textured_buffer.is_some());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn gltf_geometry_is_imported_and_drawn_by_its_entity() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_triangle_gltf(dir.path(), "triangle");

    let mut description = grid_scene("red");
    description.gltf_geometries.push(GltfGeometryDescription {
        name: "triangle".to_string(),
        path: "triangle.gltf".to_string(),
    });
    description.gltf_entities.push(GltfEntityDescription {
        name: "triangle0".to_string(),
        gltf: "triangle".to_string(),
        orientation: None,
    });

    let (_headless, device) = devices();
    let assembler = assembler(
        resolved(device),
        AssemblerConfig::with_asset_root(dir.path()),
    );
    let scene = assembler.assemble(description).await?;

    assert_eq!(scene.geometry_count(), 2);
    let imported = &scene.imported;
    assert_eq!(imported.entries().len(), 1);
    assert_eq!(imported.entries()[0].geometry.vertex_count, 3);
    assert_eq!(imported.entries()[0].material_count, 1);
    assert_eq!(
        imported.vertex_buffer.as_ref().map(|b| b.size()),
        Some(3 * VertexPbr::SIZE)
    );
    assert!(imported.material_buffer.is_some());
    assert!(imported.material_buffer_slot.is_some());

    let entity = scene.entity("triangle0").expect("gltf entity");
    assert_eq!(entity.geometry, GeometryRef::Imported(0));
    assert_eq!(entity.material, None);
    Ok(())
}

struct BrokenImporter;

impl GeometryImporter for BrokenImporter {
    fn import(&self, path: &Path) -> Result<ImportedGeometryData, ImportError> {
        Err(ImportError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        })
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_import_surfaces_as_an_import_error() -> Result<()> {
    let mut description = grid_scene("red");
    description.gltf_geometries.push(GltfGeometryDescription {
        name: "ghost".to_string(),
        path: "ghost.gltf".to_string(),
    });

    let (_headless, device) = devices();
    let config = AssemblerConfig {
        importer: Arc::new(BrokenImporter),
        ..AssemblerConfig::default()
    };
    let err = assembler(resolved(device), config)
        .assemble(description)
        .await
        .expect_err("import must fail");

    assert!(matches!(err, ProgramError::Import(ImportError::Io { .. })));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn sample_scene_assembles() -> Result<()> {
    let (_headless, device) = devices();
    let assembler = assembler(resolved(device), AssemblerConfig::default());

    let scene = assembler.assemble(SceneDescription::sample()).await?;

    assert_eq!(scene.procedural.entries().len(), 6);
    assert_eq!(scene.entities.len(), 6);
    assert_eq!(scene.materials.entries.len(), 3);
    assert_eq!(scene.lights.directional.len(), 1);
    assert_eq!(scene.lights.point.len(), 1);
    assert_eq!(scene.lights.spot.len(), 1);

    // Offsets are assigned in input order, back to back.
    for pair in scene.procedural.entries().windows(2) {
        assert_eq!(
            pair[1].vertex_offset,
            pair[0].vertex_offset + pair[0].vertex_count
        );
        assert_eq!(pair[1].index_offset, pair[0].index_offset + pair[0].index_count);
    }
    Ok(())
}
