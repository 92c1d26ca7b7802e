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

//! Imported geometry: every glTF asset is decoded on the pool, placed after
//! the previous ones and uploaded into shared vertex, index and material
//! buffers plus one bindless image per decoded image.

use super::stage::{optional_buffer, task_failed, BuildStage, BuiltResource, TaskContext};
use prism_core::renderer::{BufferUsage, OwnedTexture, QueueKind, TextureDescriptor, TextureFormat};
use prism_core::{ImportError, ProgramError, SceneError};
use prism_data::gpu::{GpuPbrMaterial, VertexPbr};
use prism_data::scene::{
    GeometryCounts, GltfGeometryDescription, ImportedGeometry, ImportedGeometryEntry,
    OffsetAccumulator,
};
use prism_lanes::geometry_lane::importer::{GeometryImporter, ImportedGeometryData};
use prism_lanes::transfer_lane::{
    staged_buffer_size, staged_texture_size, TransferSubmitter, UploadBatch,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;

const INDEX_SIZE: u64 = std::mem::size_of::<u32>() as u64;
const MATERIAL_SIZE: u64 = std::mem::size_of::<GpuPbrMaterial>() as u64;

fn to_u32(name: &str, what: &str, len: usize) -> Result<u32, SceneError> {
    u32::try_from(len).map_err(|_| {
        SceneError::InvariantViolation(format!("imported geometry '{name}' has {len} {what}"))
    })
}

/// Builds the imported geometry of the scene.
pub async fn build_imported(
    context: TaskContext,
    descriptions: Vec<GltfGeometryDescription>,
    asset_root: PathBuf,
    importer: Arc<dyn GeometryImporter>,
) -> Result<BuiltResource<ImportedGeometry>, ProgramError> {
    let result = run(&context, &descriptions, &asset_root, importer).await;
    context.finish(result)
}

async fn run(
    context: &TaskContext,
    descriptions: &[GltfGeometryDescription],
    asset_root: &Path,
    importer: Arc<dyn GeometryImporter>,
) -> Result<BuiltResource<ImportedGeometry>, ProgramError> {
    context.enter(BuildStage::Synthesizing);
    let imports: Vec<JoinHandle<Result<ImportedGeometryData, ImportError>>> = descriptions
        .iter()
        .map(|description| {
            let importer = Arc::clone(&importer);
            let path = asset_root.join(&description.path);
            tokio::task::spawn_blocking(move || importer.import(&path))
        })
        .collect();

    let mut assets = Vec::with_capacity(imports.len());
    for import in imports {
        let asset = import.await.map_err(task_failed)??;
        context.checkpoint()?;
        assets.push(asset);
    }

    // Local indices become scene-wide ones; images are rebased again once
    // their bindless slots are known.
    let mut offsets = OffsetAccumulator::default();
    let mut material_base = 0u32;
    let mut image_count = 0u32;
    let mut entries = Vec::with_capacity(assets.len());
    for (description, asset) in descriptions.iter().zip(&mut assets) {
        let name = description.name.as_str();
        asset.rebase(material_base, image_count);
        let counts = GeometryCounts {
            vertices: to_u32(name, "vertices", asset.geometry.vertices.len())?,
            indices: to_u32(name, "indices", asset.geometry.indices.len())?,
        };
        let material_count = to_u32(name, "materials", asset.materials.len())?;
        entries.push(ImportedGeometryEntry {
            geometry: offsets.place(name, counts)?,
            material_offset: material_base,
            material_count,
        });
        material_base += material_count;
        image_count += to_u32(name, "images", asset.images.len())?;
    }

    let device = context.await_renderer().await?;
    context.enter(BuildStage::Uploading);

    if entries.is_empty() {
        return Ok(BuiltResource::ready(ImportedGeometry::default()));
    }

    let image_slot_start = if image_count > 0 {
        let start = device.bindless().reserve_images(image_count)?;
        for asset in &mut assets {
            asset.rebase(0, start);
        }
        start
    } else {
        0
    };
    let material_buffer_slot = if material_base > 0 {
        Some(device.bindless().reserve_buffers(1)?)
    } else {
        None
    };

    let vertex_buffer = optional_buffer(
        &device,
        "imported vertices",
        u64::from(offsets.vertices) * VertexPbr::SIZE,
        BufferUsage::VERTEX | BufferUsage::STORAGE | BufferUsage::COPY_DST,
    )?;
    let index_buffer = optional_buffer(
        &device,
        "imported indices",
        u64::from(offsets.indices) * INDEX_SIZE,
        BufferUsage::INDEX | BufferUsage::COPY_DST,
    )?;
    let material_buffer = optional_buffer(
        &device,
        "imported materials",
        u64::from(material_base) * MATERIAL_SIZE,
        BufferUsage::STORAGE | BufferUsage::COPY_DST,
    )?;

    let mut images = Vec::with_capacity(image_count as usize);
    for (description, asset) in descriptions.iter().zip(&assets) {
        for (i, image) in asset.images.iter().enumerate() {
            images.push(OwnedTexture::create(
                &device,
                &TextureDescriptor::sampled_2d(
                    format!("{} image {i}", description.name),
                    image.width,
                    image.height,
                    TextureFormat::Rgba8Unorm,
                ),
            )?);
        }
    }

    let staged: u64 = assets
        .iter()
        .map(|asset| {
            staged_buffer_size(asset.geometry.vertex_bytes().len() as u64)
                + staged_buffer_size(asset.geometry.index_bytes().len() as u64)
                + staged_buffer_size(asset.materials.len() as u64 * MATERIAL_SIZE)
                + asset
                    .images
                    .iter()
                    .map(|image| staged_texture_size(image.width, image.height))
                    .sum::<u64>()
        })
        .sum();

    let submitter = TransferSubmitter::new(Arc::clone(&device), QueueKind::Transfer);
    let mut batch = UploadBatch::new(&submitter, staged)?;
    if let Some(buffer) = &vertex_buffer {
        for (entry, asset) in entries.iter().zip(&assets) {
            batch.stage_buffer(
                asset.geometry.vertex_bytes(),
                buffer.id(),
                u64::from(entry.geometry.vertex_offset) * VertexPbr::SIZE,
            )?;
        }
    }
    if let Some(buffer) = &index_buffer {
        for (entry, asset) in entries.iter().zip(&assets) {
            batch.stage_buffer(
                asset.geometry.index_bytes(),
                buffer.id(),
                u64::from(entry.geometry.index_offset) * INDEX_SIZE,
            )?;
        }
    }
    if let Some(buffer) = &material_buffer {
        for (entry, asset) in entries.iter().zip(&assets) {
            batch.stage_buffer(
                bytemuck::cast_slice(&asset.materials),
                buffer.id(),
                u64::from(entry.material_offset) * MATERIAL_SIZE,
            )?;
        }
    }
    let decoded = assets.iter().flat_map(|asset| &asset.images);
    for (texture, image) in images.iter().zip(decoded) {
        batch.stage_texture(&image.pixels, image.width, image.height, texture.id(), 0)?;
    }
    let upload = batch.submit()?;

    log::info!(
        "SceneAssembler: uploaded {} imported geometries ({} vertices, {} materials, {} images)",
        entries.len(),
        offsets.vertices,
        material_base,
        images.len()
    );
    let mut geometry = ImportedGeometry::new(entries);
    geometry.vertex_buffer = vertex_buffer;
    geometry.index_buffer = index_buffer;
    geometry.material_buffer = material_buffer;
    geometry.material_buffer_slot = material_buffer_slot;
    geometry.images = images;
    geometry.image_slot_start = image_slot_start;
    Ok(BuiltResource::pending(geometry, upload))
}
