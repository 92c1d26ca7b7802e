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

//! Scene materials: colored materials are packed into the colour atlas,
//! textured ones load each distinct texture file once.

use super::stage::{optional_buffer, task_failed, BuildStage, BuiltResource, TaskContext};
use prism_core::renderer::{BufferUsage, OwnedTexture, QueueKind, TextureDescriptor, TextureFormat};
use prism_core::ProgramError;
use prism_data::scene::{MaterialDescription, MaterialTables};
use prism_lanes::material_lane::{load_texture, DecodedImage, MaterialPlan};
use prism_lanes::transfer_lane::{
    staged_buffer_size, staged_texture_size, TransferSubmitter, UploadBatch,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Bindless buffer slots taken by the material tables: colored, then textured.
const MATERIAL_BUFFER_SLOTS: u32 = 2;

/// Builds the material tables of the scene.
pub async fn build_materials(
    context: TaskContext,
    descriptions: Vec<MaterialDescription>,
    asset_root: PathBuf,
) -> Result<BuiltResource<MaterialTables>, ProgramError> {
    let result = run(&context, &descriptions, asset_root).await;
    context.finish(result)
}

async fn decode_textures(
    context: &TaskContext,
    paths: &[PathBuf],
) -> Result<Vec<DecodedImage>, ProgramError> {
    let decodes: Vec<_> = paths
        .iter()
        .cloned()
        .map(|path| tokio::task::spawn_blocking(move || load_texture(&path)))
        .collect();

    let mut images = Vec::with_capacity(decodes.len());
    for decode in decodes {
        let image = decode.await.map_err(task_failed)??;
        context.checkpoint()?;
        images.push(image);
    }
    Ok(images)
}

async fn run(
    context: &TaskContext,
    descriptions: &[MaterialDescription],
    asset_root: PathBuf,
) -> Result<BuiltResource<MaterialTables>, ProgramError> {
    context.enter(BuildStage::Synthesizing);
    let plan = MaterialPlan::split(descriptions, &asset_root);
    let decoded = decode_textures(context, plan.texture_paths()).await?;

    let device = context.await_renderer().await?;
    context.enter(BuildStage::Uploading);

    if plan.materials().is_empty() {
        return Ok(BuiltResource::ready(MaterialTables::default()));
    }

    let image_slot_start = device
        .bindless()
        .reserve_images(plan.image_slots_needed())?;
    let buffer_slot_start = device.bindless().reserve_buffers(MATERIAL_BUFFER_SLOTS)?;

    let (atlas_width, atlas_height) = plan.atlas_extent();
    let color_atlas = if plan.has_atlas() {
        Some(OwnedTexture::create(
            &device,
            &TextureDescriptor::sampled_2d(
                "material colour atlas",
                atlas_width,
                atlas_height,
                TextureFormat::Rgba8Unorm,
            ),
        )?)
    } else {
        None
    };

    let textures = plan
        .texture_paths()
        .iter()
        .zip(&decoded)
        .map(|(path, image)| {
            OwnedTexture::create(
                &device,
                &TextureDescriptor::sampled_2d(
                    path.display().to_string(),
                    image.width,
                    image.height,
                    TextureFormat::Rgba8UnormSrgb,
                ),
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    let colored = plan.colored_records(image_slot_start);
    let textured = plan.textured_records(image_slot_start);
    let colored_bytes: &[u8] = bytemuck::cast_slice(&colored);
    let textured_bytes: &[u8] = bytemuck::cast_slice(&textured);
    let colored_buffer = optional_buffer(
        &device,
        "colored materials",
        colored_bytes.len() as u64,
        BufferUsage::STORAGE | BufferUsage::COPY_DST,
    )?;
    let textured_buffer = optional_buffer(
        &device,
        "textured materials",
        textured_bytes.len() as u64,
        BufferUsage::STORAGE | BufferUsage::COPY_DST,
    )?;

    let mut staged = staged_buffer_size(colored_bytes.len() as u64)
        + staged_buffer_size(textured_bytes.len() as u64)
        + decoded
            .iter()
            .map(|image| staged_texture_size(image.width, image.height))
            .sum::<u64>();
    if color_atlas.is_some() {
        staged += staged_texture_size(atlas_width, atlas_height);
    }

    let submitter = TransferSubmitter::new(Arc::clone(&device), QueueKind::Transfer);
    let mut batch = UploadBatch::new(&submitter, staged)?;
    if let Some(atlas) = &color_atlas {
        batch.stage_texture(&plan.atlas_pixels(), atlas_width, atlas_height, atlas.id(), 0)?;
    }
    for (texture, image) in textures.iter().zip(&decoded) {
        batch.stage_texture(&image.pixels, image.width, image.height, texture.id(), 0)?;
    }
    if let Some(buffer) = &colored_buffer {
        batch.stage_buffer(colored_bytes, buffer.id(), 0)?;
    }
    if let Some(buffer) = &textured_buffer {
        batch.stage_buffer(textured_bytes, buffer.id(), 0)?;
    }
    let upload = batch.submit()?;

    log::info!(
        "SceneAssembler: uploaded {} materials ({} unique textures, atlas {}x{})",
        plan.materials().len(),
        textures.len(),
        atlas_width,
        atlas_height
    );
    Ok(BuiltResource::pending(
        MaterialTables {
            entries: plan.entries(image_slot_start),
            color_atlas,
            textures,
            colored_buffer,
            textured_buffer,
            image_slot_start,
            buffer_slot_start,
        },
        upload,
    ))
}
