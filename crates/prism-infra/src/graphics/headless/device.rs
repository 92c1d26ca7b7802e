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

use crate::settings::DeviceSettings;
use prism_core::memory::StagingAllocator;
use prism_core::renderer::{
    BindlessSlots, BufferCopy, BufferDescriptor, BufferId, BufferTextureCopy, CommandPool,
    GraphicsDevice, QueueKind, ResourceError, SubmissionFence, TextureDescriptor, TextureId,
    TransferCommand, TransferJob, WaitToken,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug)]
struct SignaledFence;

impl SubmissionFence for SignaledFence {
    fn wait(&self) -> Result<(), ResourceError> {
        Ok(())
    }

    fn is_signaled(&self) -> bool {
        true
    }
}

struct HeadlessTexture {
    width: u32,
    height: u32,
    layers: u32,
    bytes_per_texel: u32,
    data: Vec<u8>,
}

impl HeadlessTexture {
    fn row_bytes(&self) -> usize {
        (self.width * self.bytes_per_texel) as usize
    }

    fn layer_bytes(&self) -> usize {
        self.row_bytes() * self.height as usize
    }
}

/// A [`GraphicsDevice`] backed by plain `Vec<u8>`s.
pub struct HeadlessDevice {
    buffers: Mutex<HashMap<BufferId, Vec<u8>>>,
    textures: Mutex<HashMap<TextureId, HeadlessTexture>>,
    next_buffer_id: AtomicUsize,
    next_texture_id: AtomicUsize,
    staging: StagingAllocator,
    staging_buffer: BufferId,
    bindless: BindlessSlots,
    pool: CommandPool,
    submissions: AtomicUsize,
}

impl std::fmt::Debug for HeadlessDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessDevice")
            .field("buffers", &self.live_buffers())
            .field("textures", &self.live_textures())
            .field("staging", &self.staging)
            .field("pool", &self.pool)
            .finish()
    }
}

impl HeadlessDevice {
    /// Creates a device with the capacities in `settings`.
    pub fn new(settings: &DeviceSettings) -> Self {
        let device = Self {
            buffers: Mutex::new(HashMap::new()),
            textures: Mutex::new(HashMap::new()),
            // Id 0 is the staging buffer.
            next_buffer_id: AtomicUsize::new(1),
            next_texture_id: AtomicUsize::new(0),
            staging: StagingAllocator::new(settings.staging_capacity, settings.staging_alignment),
            staging_buffer: BufferId(0),
            bindless: BindlessSlots::new(settings.bindless_images, settings.bindless_buffers),
            pool: CommandPool::new(settings.command_pool_capacity),
            submissions: AtomicUsize::new(0),
        };
        log::info!(
            "HeadlessDevice: created with {} bytes of staging memory",
            settings.staging_capacity
        );
        device
    }

    /// A copy of a buffer's contents, or `None` if it does not exist.
    pub fn buffer_contents(&self, id: BufferId) -> Option<Vec<u8>> {
        self.buffers.lock().unwrap().get(&id).cloned()
    }

    /// A copy of a texture's texels (all layers, tightly packed).
    pub fn texture_contents(&self, id: TextureId) -> Option<Vec<u8>> {
        self.textures
            .lock()
            .unwrap()
            .get(&id)
            .map(|t| t.data.clone())
    }

    /// Buffers currently alive, not counting the staging buffer.
    pub fn live_buffers(&self) -> usize {
        self.buffers.lock().unwrap().len()
    }

    /// Textures currently alive.
    pub fn live_textures(&self) -> usize {
        self.textures.lock().unwrap().len()
    }

    /// Jobs submitted so far.
    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::Relaxed)
    }

    /// Jobs and wait tokens currently holding a command buffer.
    pub fn jobs_in_flight(&self) -> usize {
        self.pool.in_flight()
    }

    fn copy_buffer(&self, copy: &BufferCopy) -> Result<(), ResourceError> {
        let mut buffers = self.buffers.lock().unwrap();
        let target = buffers
            .get_mut(&copy.destination)
            .ok_or(ResourceError::NotFound)?;
        let start = copy.destination_offset as usize;
        let end = start + copy.size as usize;
        if end > target.len() {
            return Err(ResourceError::OutOfBounds);
        }
        self.staging
            .with_range(copy.staging_offset..copy.staging_offset + copy.size, |src| {
                target[start..end].copy_from_slice(src)
            })
            .ok_or(ResourceError::OutOfBounds)
    }

    fn copy_texture(&self, copy: &BufferTextureCopy) -> Result<(), ResourceError> {
        let mut textures = self.textures.lock().unwrap();
        let target = textures
            .get_mut(&copy.destination)
            .ok_or(ResourceError::NotFound)?;
        if copy.extent.width > target.width
            || copy.extent.height > target.height
            || copy.array_layer >= target.layers
        {
            return Err(ResourceError::OutOfBounds);
        }
        let row = (copy.extent.width * target.bytes_per_texel) as usize;
        let dst_row = target.row_bytes();
        let layer_start = copy.array_layer as usize * target.layer_bytes();
        for y in 0..copy.extent.height as usize {
            let src = copy.staging_offset + (y as u64) * u64::from(copy.bytes_per_row);
            let dst = layer_start + y * dst_row;
            self.staging
                .with_range(src..src + row as u64, |bytes| {
                    target.data[dst..dst + row].copy_from_slice(bytes)
                })
                .ok_or(ResourceError::OutOfBounds)?;
        }
        Ok(())
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn adapter_name(&self) -> String {
        "headless (host memory)".to_string()
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let size = descriptor.total_size();
        let id = BufferId(self.next_buffer_id.fetch_add(1, Ordering::Relaxed));
        self.buffers
            .lock()
            .unwrap()
            .insert(id, vec![0; size as usize]);
        log::debug!(
            "HeadlessDevice: Created buffer '{}' with ID: {:?}, size: {} bytes",
            descriptor.label.as_deref().unwrap_or_default(),
            id,
            size
        );
        Ok(id)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        self.buffers
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| log::debug!("HeadlessDevice: Destroyed buffer with ID: {id:?}"))
            .ok_or(ResourceError::NotFound)
    }

    fn buffer_size(&self, id: BufferId) -> Result<u64, ResourceError> {
        if id == self.staging_buffer {
            return Ok(self.staging.capacity());
        }
        self.buffers
            .lock()
            .unwrap()
            .get(&id)
            .map(|b| b.len() as u64)
            .ok_or(ResourceError::NotFound)
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        let id = TextureId(self.next_texture_id.fetch_add(1, Ordering::Relaxed));
        let texture = HeadlessTexture {
            width: descriptor.size.width,
            height: descriptor.size.height,
            layers: descriptor.size.depth_or_array_layers.max(1),
            bytes_per_texel: descriptor.format.bytes_per_texel(),
            data: vec![0; descriptor.byte_size() as usize],
        };
        self.textures.lock().unwrap().insert(id, texture);
        log::debug!(
            "HeadlessDevice: Created texture '{}' with ID: {:?} ({}x{})",
            descriptor.label.as_deref().unwrap_or_default(),
            id,
            descriptor.size.width,
            descriptor.size.height
        );
        Ok(id)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        self.textures
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| log::debug!("HeadlessDevice: Destroyed texture with ID: {id:?}"))
            .ok_or(ResourceError::NotFound)
    }

    fn staging(&self) -> &StagingAllocator {
        &self.staging
    }

    fn staging_buffer(&self) -> BufferId {
        self.staging_buffer
    }

    fn bindless(&self) -> &BindlessSlots {
        &self.bindless
    }

    fn create_job(&self, queue: QueueKind) -> Result<TransferJob, ResourceError> {
        let (id, slot) = self.pool.acquire()?;
        Ok(TransferJob::new(id, queue, slot))
    }

    fn submit_job(&self, job: TransferJob, queue: QueueKind) -> Result<WaitToken, ResourceError> {
        if job.queue() != queue {
            return Err(ResourceError::QueueMismatch {
                recorded: job.queue(),
                submitted: queue,
            });
        }
        let (id, _, commands, slot) = job.into_parts();
        for command in &commands {
            match command {
                TransferCommand::CopyBuffer(copy) => self.copy_buffer(copy)?,
                TransferCommand::CopyBufferToTexture(copy) => self.copy_texture(copy)?,
            }
        }
        self.submissions.fetch_add(1, Ordering::Relaxed);
        Ok(WaitToken::new(id, Box::new(SignaledFence), slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::renderer::{BufferUsage, Extent3D, TextureFormat};

    fn small_device() -> HeadlessDevice {
        HeadlessDevice::new(&DeviceSettings {
            staging_capacity: 4096,
            staging_alignment: 4,
            command_pool_capacity: 2,
            bindless_images: 8,
            bindless_buffers: 4,
        })
    }

    #[test]
    fn buffer_copies_land_at_the_destination_offset() {
        let device = small_device();
        let dst = device
            .create_buffer(&BufferDescriptor::device_local(
                "dst",
                16,
                BufferUsage::COPY_DST | BufferUsage::VERTEX,
            ))
            .unwrap();
        let reservation = device.reserve_staging_buffer_memory(8).unwrap();
        device
            .staging()
            .write(&reservation, 0, &[1, 2, 3, 4, 5, 6, 7, 8])
            .unwrap();

        let mut job = device.create_job(QueueKind::Transfer).unwrap();
        job.copy_buffer(BufferCopy {
            staging_offset: reservation.offset,
            destination: dst,
            destination_offset: 4,
            size: 8,
        });
        let token = device.submit_job(job, QueueKind::Transfer).unwrap();
        token.wait().unwrap();
        assert!(token.is_complete());

        let contents = device.buffer_contents(dst).unwrap();
        assert_eq!(&contents[..], &[0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8, 0, 0, 0, 0]);
        assert_eq!(device.submissions(), 1);
    }

    #[test]
    fn texture_copies_strip_row_padding() {
        let device = small_device();
        let texture = device
            .create_texture(&TextureDescriptor::sampled_2d("t", 1, 2, TextureFormat::Rgba8Unorm))
            .unwrap();
        let reservation = device.reserve_staging_buffer_memory(512).unwrap();
        device.staging().write(&reservation, 0, &[1, 2, 3, 4]).unwrap();
        device.staging().write(&reservation, 256, &[5, 6, 7, 8]).unwrap();

        let mut job = device.create_job(QueueKind::Transfer).unwrap();
        job.copy_buffer_to_texture(BufferTextureCopy {
            staging_offset: reservation.offset,
            bytes_per_row: 256,
            destination: texture,
            extent: Extent3D::flat(1, 2),
            array_layer: 0,
        });
        device.submit_job(job, QueueKind::Transfer).unwrap();
        assert_eq!(
            device.texture_contents(texture).unwrap(),
            vec![1, 2, 3, 4, 5, 6, 7, 8]
        );
    }

    #[test]
    fn queue_mismatch_is_rejected() {
        let device = small_device();
        let job = device.create_job(QueueKind::Transfer).unwrap();
        let err = device.submit_job(job, QueueKind::Graphics).unwrap_err();
        assert!(matches!(err, ResourceError::QueueMismatch { .. }));
        assert_eq!(device.jobs_in_flight(), 0);
    }

    #[test]
    fn unknown_destinations_are_not_found() {
        let device = small_device();
        let mut job = device.create_job(QueueKind::Transfer).unwrap();
        job.copy_buffer(BufferCopy {
            staging_offset: 0,
            destination: BufferId(99),
            destination_offset: 0,
            size: 4,
        });
        assert!(matches!(
            device.submit_job(job, QueueKind::Transfer),
            Err(ResourceError::NotFound)
        ));
        assert!(matches!(device.destroy_texture(TextureId(3)), Err(ResourceError::NotFound)));
    }

    #[test]
    fn staging_buffer_reports_its_capacity() {
        let device = small_device();
        assert_eq!(device.buffer_size(device.staging_buffer()).unwrap(), 4096);
        assert_eq!(device.live_buffers(), 0);
    }
}
