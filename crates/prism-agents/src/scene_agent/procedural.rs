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

//! Procedural geometry: synthesized on the pool, uploaded into one vertex and
//! one index buffer at offsets fixed by the layout.

use super::stage::{BuildStage, BuiltResource, TaskContext};
use prism_core::renderer::{BufferDescriptor, BufferUsage, OwnedBuffer, QueueKind};
use prism_core::{ProgramError, SceneError};
use prism_data::gpu::VertexPnt;
use prism_data::scene::{GeometryLayout, ProceduralGeometry, ProceduralGeometryDescription};
use prism_lanes::geometry_lane::procedural;
use prism_lanes::geometry_lane::GeometryData;
use prism_lanes::transfer_lane::{staged_buffer_size, TransferSubmitter, UploadBatch};

const INDEX_SIZE: u64 = std::mem::size_of::<u32>() as u64;

/// Computes the layout of `descriptions` from their closed-form counts.
///
/// Pure CPU work; the assembler runs it before spawning the upload task so
/// invalid parameters fail without touching the pool.
pub(crate) fn layout(
    descriptions: &[ProceduralGeometryDescription],
) -> Result<GeometryLayout, SceneError> {
    let counts = descriptions
        .iter()
        .map(|d| procedural::counts(&d.name, &d.params).map(|c| (d.name.as_str(), c)))
        .collect::<Result<Vec<_>, _>>()?;
    GeometryLayout::compute(counts)
}

/// Builds the procedural geometry of the scene.
///
/// `layout` must have been computed from `descriptions`, entry for entry.
pub async fn build_procedural(
    context: TaskContext,
    descriptions: Vec<ProceduralGeometryDescription>,
    layout: GeometryLayout,
) -> Result<BuiltResource<ProceduralGeometry>, ProgramError> {
    let result = run(&context, &descriptions, layout).await;
    context.finish(result)
}

async fn run(
    context: &TaskContext,
    descriptions: &[ProceduralGeometryDescription],
    layout: GeometryLayout,
) -> Result<BuiltResource<ProceduralGeometry>, ProgramError> {
    if descriptions.len() != layout.entries.len() {
        return Err(SceneError::InvariantViolation(format!(
            "{} procedural descriptions laid out as {} entries",
            descriptions.len(),
            layout.entries.len()
        ))
        .into());
    }

    context.enter(BuildStage::Synthesizing);
    let mut synthesized: Vec<GeometryData<VertexPnt>> = Vec::with_capacity(descriptions.len());
    for description in descriptions {
        context.checkpoint()?;
        synthesized.push(procedural::generate(&description.name, &description.params)?);
    }

    let device = context.await_renderer().await?;
    context.enter(BuildStage::Uploading);

    if layout.total.vertices == 0 {
        return Ok(BuiltResource::ready(ProceduralGeometry::new(
            layout.entries,
            None,
            None,
        )));
    }

    let vertex_buffer = OwnedBuffer::create(
        &device,
        &BufferDescriptor::device_local(
            "procedural vertices",
            layout.vertex_bytes(VertexPnt::SIZE),
            BufferUsage::VERTEX | BufferUsage::STORAGE | BufferUsage::COPY_DST,
        ),
    )?;
    let index_buffer = OwnedBuffer::create(
        &device,
        &BufferDescriptor::device_local(
            "procedural indices",
            layout.index_bytes(),
            BufferUsage::INDEX | BufferUsage::COPY_DST,
        ),
    )?;

    let submitter = TransferSubmitter::new(device, QueueKind::Transfer);
    let staged: u64 = synthesized
        .iter()
        .map(|g| {
            staged_buffer_size(g.vertex_bytes().len() as u64)
                + staged_buffer_size(g.index_bytes().len() as u64)
        })
        .sum();
    let mut batch = UploadBatch::new(&submitter, staged)?;

    // Vertices first, then indices, so neighbouring copies merge.
    for (entry, geometry) in layout.entries.iter().zip(&synthesized) {
        batch.stage_buffer(
            geometry.vertex_bytes(),
            vertex_buffer.id(),
            u64::from(entry.vertex_offset) * VertexPnt::SIZE,
        )?;
    }
    for (entry, geometry) in layout.entries.iter().zip(&synthesized) {
        batch.stage_buffer(
            geometry.index_bytes(),
            index_buffer.id(),
            u64::from(entry.index_offset) * INDEX_SIZE,
        )?;
    }
    let upload = batch.submit()?;

    log::info!(
        "SceneAssembler: uploaded {} procedural geometries ({} vertices, {} indices)",
        layout.entries.len(),
        layout.total.vertices,
        layout.total.indices
    );
    Ok(BuiltResource::pending(
        ProceduralGeometry::new(layout.entries, Some(vertex_buffer), Some(index_buffer)),
        upload,
    ))
}
