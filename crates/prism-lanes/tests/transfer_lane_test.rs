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

//! Upload batches against the host-memory device.

use prism_core::renderer::{
    BufferDescriptor, BufferUsage, GraphicsDevice, OwnedBuffer, OwnedTexture, QueueKind,
    ResourceError, TextureDescriptor, TextureFormat,
};
use prism_infra::{DeviceSettings, HeadlessDevice};
use prism_lanes::transfer_lane::{staged_buffer_size, staged_texture_size, TransferSubmitter, UploadBatch};
use std::sync::Arc;

fn devices(settings: DeviceSettings) -> (Arc<HeadlessDevice>, Arc<dyn GraphicsDevice>) {
    let headless = Arc::new(HeadlessDevice::new(&settings));
    let device: Arc<dyn GraphicsDevice> = headless.clone();
    (headless, device)
}

#[test]
fn batch_uploads_buffers_and_textures_in_one_job() {
    let (headless, device) = devices(DeviceSettings::default());
    let submitter = TransferSubmitter::new(Arc::clone(&device), QueueKind::Transfer);

    let vertices: Vec<u8> = (0..24).collect();
    let pixels: Vec<u8> = (0..2 * 2 * 4).map(|i| i as u8 + 100).collect();

    let buffer = OwnedBuffer::create(
        &device,
        &BufferDescriptor::device_local("v", 24, BufferUsage::VERTEX | BufferUsage::COPY_DST),
    )
    .unwrap();
    let texture = OwnedTexture::create(
        &device,
        &TextureDescriptor::sampled_2d("t", 2, 2, TextureFormat::Rgba8Unorm),
    )
    .unwrap();

    let total = staged_buffer_size(24) + staged_texture_size(2, 2);
    let mut batch = UploadBatch::new(&submitter, total).unwrap();
    batch.stage_buffer(&vertices, buffer.id(), 0).unwrap();
    batch.stage_texture(&pixels, 2, 2, texture.id(), 0).unwrap();
    assert_eq!(batch.remaining(), 0);
    let token = batch.submit().unwrap();
    token.wait().unwrap();

    assert_eq!(headless.buffer_contents(buffer.id()).unwrap(), vertices);
    assert_eq!(headless.texture_contents(texture.id()).unwrap(), pixels);
    assert_eq!(headless.submissions(), 1);
}

#[test]
fn contiguous_buffer_stages_merge_into_one_copy() {
    let (_headless, device) = devices(DeviceSettings::default());
    let submitter = TransferSubmitter::new(Arc::clone(&device), QueueKind::Transfer);
    let buffer = OwnedBuffer::create(
        &device,
        &BufferDescriptor::device_local("idx", 16, BufferUsage::INDEX | BufferUsage::COPY_DST),
    )
    .unwrap();

    let mut job = submitter.create_job().unwrap();
    let reservation = device.reserve_staging_buffer_memory(16).unwrap();
    for i in 0..4u64 {
        job.copy_buffer(prism_core::renderer::BufferCopy {
            staging_offset: reservation.offset + i * 4,
            destination: buffer.id(),
            destination_offset: i * 4,
            size: 4,
        });
    }
    assert_eq!(job.commands().len(), 1);
    submitter.submit_job(job).unwrap().wait().unwrap();
}

#[test]
fn overfilling_a_batch_is_rejected() {
    let (_headless, device) = devices(DeviceSettings::default());
    let submitter = TransferSubmitter::new(Arc::clone(&device), QueueKind::Transfer);
    let buffer = OwnedBuffer::create(
        &device,
        &BufferDescriptor::device_local("v", 64, BufferUsage::COPY_DST),
    )
    .unwrap();

    let mut batch = UploadBatch::new(&submitter, 8).unwrap();
    batch.stage_buffer(&[1; 8], buffer.id(), 0).unwrap();
    assert!(matches!(
        batch.stage_buffer(&[2; 4], buffer.id(), 8),
        Err(ResourceError::OutOfBounds)
    ));
}

#[test]
fn staging_exhaustion_surfaces_as_a_resource_error() {
    let (_headless, device) = devices(DeviceSettings {
        staging_capacity: 1024,
        ..Default::default()
    });
    let submitter = TransferSubmitter::new(Arc::clone(&device), QueueKind::Transfer);
    let err = UploadBatch::new(&submitter, 4096).unwrap_err();
    assert!(matches!(err, ResourceError::Staging(_)));
    // A refused batch never takes a command buffer.
    assert!(UploadBatch::new(&submitter, 512).is_ok());
}

#[test]
fn exhausted_pool_fails_job_creation() {
    let (_headless, device) = devices(DeviceSettings {
        command_pool_capacity: 1,
        ..Default::default()
    });
    let submitter = TransferSubmitter::new(Arc::clone(&device), QueueKind::Transfer);
    let token = submitter.submit(&[]).unwrap();
    assert!(matches!(
        submitter.create_job(),
        Err(ResourceError::CommandPoolExhausted { capacity: 1 })
    ));
    drop(token);
    assert!(submitter.create_job().is_ok());
}
