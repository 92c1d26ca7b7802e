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

use std::collections::HashMap;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use prism_core::memory::{align_up, StagingAllocator};
use prism_core::renderer::{
    BindlessSlots, BufferDescriptor, BufferId, BufferUsage, CommandPool, GraphicsDevice,
    QueueKind, ResourceError, TextureDescriptor, TextureId, TransferCommand, TransferJob,
    WaitToken, COPY_BUFFER_ALIGNMENT,
};

use super::context::WgpuContext;
use super::conversions::IntoWgpu;
use super::fence::WgpuFence;
use crate::settings::DeviceSettings;

#[derive(Debug)]
pub(crate) struct WgpuBufferEntry {
    pub(crate) wgpu_buffer: Arc<wgpu::Buffer>,
    pub(crate) size: u64, // To track VRAM accurately on destruction
}

#[derive(Debug)]
pub(crate) struct WgpuTextureEntry {
    pub(crate) wgpu_texture: Arc<wgpu::Texture>,
    pub(crate) size: u64, // To track VRAM accurately on destruction
}

/// The internal, non-clonable state of the WgpuDevice.
#[derive(Debug)]
pub struct WgpuDeviceInternal {
    context: Arc<WgpuContext>,
    buffers: Mutex<HashMap<BufferId, WgpuBufferEntry>>,
    textures: Mutex<HashMap<TextureId, WgpuTextureEntry>>,

    next_buffer_id: AtomicUsize,
    next_texture_id: AtomicUsize,

    // VRAM Tracking
    vram_allocated_bytes: AtomicUsize,

    /// Host side of the staging buffer; the GPU side is `staging_buffer`.
    staging: StagingAllocator,
    staging_buffer: BufferId,
    bindless: BindlessSlots,
    pool: CommandPool,
}

/// A clonable, thread-safe handle to a `wgpu` device implementing the scene
/// pipeline's capability surface.
///
/// Staged bytes live in host memory until a job is submitted; submission
/// pushes the ranges the job reads into the GPU staging buffer with
/// `Queue::write_buffer`, then encodes the recorded copies out of it.
#[derive(Clone, Debug)]
pub struct WgpuDevice {
    internal: Arc<WgpuDeviceInternal>,
}

impl WgpuDevice {
    /// Creates the device and its GPU staging buffer on `context`.
    pub fn new(context: WgpuContext, settings: &DeviceSettings) -> Self {
        let staging_size = align_up(settings.staging_capacity, COPY_BUFFER_ALIGNMENT);
        let staging_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Prism Staging Buffer"),
            size: staging_size,
            usage: (BufferUsage::COPY_SRC | BufferUsage::COPY_DST).into_wgpu(),
            mapped_at_creation: false,
        });
        // Id 0 is the staging buffer.
        let staging_id = BufferId(0);
        let mut buffers = HashMap::new();
        buffers.insert(
            staging_id,
            WgpuBufferEntry {
                wgpu_buffer: Arc::new(staging_buffer),
                size: staging_size,
            },
        );
        log::info!(
            "WgpuDevice: Created staging buffer of {} bytes on \"{}\"",
            staging_size,
            context.adapter_name
        );

        Self {
            internal: Arc::new(WgpuDeviceInternal {
                context: Arc::new(context),
                buffers: Mutex::new(buffers),
                textures: Mutex::new(HashMap::new()),
                next_buffer_id: AtomicUsize::new(1),
                next_texture_id: AtomicUsize::new(0),
                vram_allocated_bytes: AtomicUsize::new(staging_size as usize),
                staging: StagingAllocator::new(
                    settings.staging_capacity,
                    settings.staging_alignment.max(COPY_BUFFER_ALIGNMENT),
                ),
                staging_buffer: staging_id,
                bindless: BindlessSlots::new(settings.bindless_images, settings.bindless_buffers),
                pool: CommandPool::new(settings.command_pool_capacity),
            }),
        }
    }

    // --- ID Generation Helpers ---

    fn generate_buffer_id(&self) -> BufferId {
        BufferId(self.internal.next_buffer_id.fetch_add(1, Ordering::Relaxed))
    }

    fn generate_texture_id(&self) -> TextureId {
        TextureId(
            self.internal
                .next_texture_id
                .fetch_add(1, Ordering::Relaxed),
        )
    }

    /// Bytes currently allocated in buffers and textures.
    pub fn allocated_bytes(&self) -> usize {
        self.internal.vram_allocated_bytes.load(Ordering::Relaxed)
    }

    fn get_buffer(&self, id: BufferId) -> Result<Arc<wgpu::Buffer>, ResourceError> {
        let buffers = self.internal.buffers.lock().unwrap();
        buffers
            .get(&id)
            .map(|entry| Arc::clone(&entry.wgpu_buffer))
            .ok_or(ResourceError::NotFound)
    }

    fn get_texture(&self, id: TextureId) -> Result<Arc<wgpu::Texture>, ResourceError> {
        let textures = self.internal.textures.lock().unwrap();
        textures
            .get(&id)
            .map(|entry| Arc::clone(&entry.wgpu_texture))
            .ok_or(ResourceError::NotFound)
    }

    /// The staging bytes a command reads.
    fn staged_range(command: &TransferCommand) -> Range<u64> {
        match command {
            TransferCommand::CopyBuffer(copy) => {
                copy.staging_offset..copy.staging_offset + copy.size
            }
            TransferCommand::CopyBufferToTexture(copy) => {
                let height = u64::from(copy.extent.height.max(1));
                let row = u64::from(copy.extent.width) * 4;
                copy.staging_offset
                    ..copy.staging_offset + u64::from(copy.bytes_per_row) * (height - 1) + row
            }
        }
    }

    /// Pushes the host staging bytes `range` to the GPU staging buffer.
    fn upload_staged(&self, staging: &wgpu::Buffer, range: Range<u64>) -> Result<(), ResourceError> {
        let internal = &self.internal;
        let end = align_up(range.end, COPY_BUFFER_ALIGNMENT).min(internal.staging.capacity());
        internal
            .staging
            .with_range(range.start..end, |bytes| {
                internal.context.queue.write_buffer(staging, range.start, bytes)
            })
            .ok_or(ResourceError::OutOfBounds)
    }
}

impl GraphicsDevice for WgpuDevice {
    fn adapter_name(&self) -> String {
        format!(
            "{} ({:?})",
            self.internal.context.adapter_name, self.internal.context.adapter_backend
        )
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let size = align_up(descriptor.total_size(), COPY_BUFFER_ALIGNMENT);
        let wgpu_buffer = self
            .internal
            .context
            .device
            .create_buffer(&wgpu::BufferDescriptor {
                label: descriptor.label.as_deref(),
                size,
                usage: descriptor.usage.into_wgpu(),
                mapped_at_creation: false,
            });
        let id = self.generate_buffer_id();

        self.internal
            .vram_allocated_bytes
            .fetch_add(size as usize, Ordering::Relaxed);

        self.internal.buffers.lock().unwrap().insert(
            id,
            WgpuBufferEntry {
                wgpu_buffer: Arc::new(wgpu_buffer),
                size,
            },
        );

        log::info!(
            "WgpuDevice: Created buffer '{:?}' with ID: {:?}, size: {} bytes",
            descriptor.label.as_deref().unwrap_or_default(),
            id,
            size
        );
        Ok(id)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        let mut buffers = self.internal.buffers.lock().unwrap();

        // Remove the buffer from the map and track VRAM usage
        if let Some(entry) = buffers.remove(&id) {
            self.internal
                .vram_allocated_bytes
                .fetch_sub(entry.size as usize, Ordering::Relaxed);
            log::debug!("WgpuDevice: Destroyed buffer with ID: {id:?}");
            Ok(())
        } else {
            Err(ResourceError::NotFound)
        }
    }

    fn buffer_size(&self, id: BufferId) -> Result<u64, ResourceError> {
        let buffers = self.internal.buffers.lock().unwrap();
        buffers
            .get(&id)
            .map(|entry| entry.size)
            .ok_or(ResourceError::NotFound)
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        let wgpu_texture = self
            .internal
            .context
            .device
            .create_texture(&wgpu::TextureDescriptor {
                label: descriptor.label.as_deref(),
                size: descriptor.size.into_wgpu(),
                mip_level_count: descriptor.mip_level_count,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: descriptor.format.into_wgpu(),
                usage: descriptor.usage.into_wgpu(),
                view_formats: &[],
            });
        let id = self.generate_texture_id();
        let size_in_bytes = descriptor.byte_size();

        self.internal
            .vram_allocated_bytes
            .fetch_add(size_in_bytes as usize, Ordering::Relaxed);

        self.internal.textures.lock().unwrap().insert(
            id,
            WgpuTextureEntry {
                wgpu_texture: Arc::new(wgpu_texture),
                size: size_in_bytes,
            },
        );

        log::info!(
            "WgpuDevice: Created texture '{:?}' with ID: {:?}, size: {} bytes (VRAM)",
            descriptor.label.as_deref().unwrap_or_default(),
            id,
            size_in_bytes
        );
        Ok(id)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        let mut textures = self.internal.textures.lock().unwrap();

        if let Some(entry) = textures.remove(&id) {
            self.internal
                .vram_allocated_bytes
                .fetch_sub(entry.size as usize, Ordering::Relaxed);
            log::debug!("WgpuDevice: Destroyed texture with ID: {id:?}");
            Ok(())
        } else {
            Err(ResourceError::NotFound)
        }
    }

    fn staging(&self) -> &StagingAllocator {
        &self.internal.staging
    }

    fn staging_buffer(&self) -> BufferId {
        self.internal.staging_buffer
    }

    fn bindless(&self) -> &BindlessSlots {
        &self.internal.bindless
    }

    fn create_job(&self, queue: QueueKind) -> Result<TransferJob, ResourceError> {
        let (id, slot) = self.internal.pool.acquire()?;
        log::trace!("WgpuDevice: Opened job {id:?} on the {queue} queue");
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
        let staging = self.get_buffer(self.internal.staging_buffer)?;

        let mut encoder =
            self.internal
                .context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Prism Transfer Job"),
                });

        for command in &commands {
            match command {
                TransferCommand::CopyBuffer(copy) => {
                    if copy.size % COPY_BUFFER_ALIGNMENT != 0
                        || copy.destination_offset % COPY_BUFFER_ALIGNMENT != 0
                    {
                        return Err(ResourceError::BackendError(format!(
                            "Buffer copy of {} bytes at {} is not {}-byte aligned",
                            copy.size, copy.destination_offset, COPY_BUFFER_ALIGNMENT
                        )));
                    }
                    let destination = self.get_buffer(copy.destination)?;
                    encoder.copy_buffer_to_buffer(
                        &staging,
                        copy.staging_offset,
                        &destination,
                        copy.destination_offset,
                        copy.size,
                    );
                }
                TransferCommand::CopyBufferToTexture(copy) => {
                    let destination = self.get_texture(copy.destination)?;
                    encoder.copy_buffer_to_texture(
                        wgpu::TexelCopyBufferInfo {
                            buffer: &staging,
                            layout: wgpu::TexelCopyBufferLayout {
                                offset: copy.staging_offset,
                                bytes_per_row: Some(copy.bytes_per_row),
                                rows_per_image: Some(copy.extent.height),
                            },
                        },
                        wgpu::TexelCopyTextureInfo {
                            texture: &destination,
                            mip_level: 0,
                            origin: wgpu::Origin3d {
                                x: 0,
                                y: 0,
                                z: copy.array_layer,
                            },
                            aspect: wgpu::TextureAspect::All,
                        },
                        wgpu::Extent3d {
                            width: copy.extent.width,
                            height: copy.extent.height,
                            depth_or_array_layers: 1,
                        },
                    );
                }
            }
        }

        // Staged bytes reach the GPU staging buffer ahead of the copies that
        // read them: queue writes are ordered before the next submission.
        for command in &commands {
            self.upload_staged(&staging, Self::staged_range(command))?;
        }

        self.internal.context.queue.submit(Some(encoder.finish()));
        let fence = WgpuFence::after_last_submit(Arc::clone(&self.internal.context));
        log::debug!(
            "WgpuDevice: Submitted job {id:?} ({} commands) on the {queue} queue",
            commands.len()
        );
        Ok(WaitToken::new(id, Box::new(fence), slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::renderer::{BufferCopy, OwnedBuffer};

    fn create_test_device() -> Option<WgpuDevice> {
        let context = WgpuContext::new_blocking().ok()?;
        Some(WgpuDevice::new(
            context,
            &DeviceSettings {
                staging_capacity: 1 << 16,
                ..Default::default()
            },
        ))
    }

    #[test]
    fn buffer_upload_completes_or_skips() {
        // This test requires a physical device, so it might be skipped on CI without one.
        let device = match create_test_device() {
            Some(d) => d,
            None => {
                println!("Skipping wgpu upload test: could not create test device.");
                return;
            }
        };
        let device: Arc<dyn GraphicsDevice> = Arc::new(device);

        let buffer = OwnedBuffer::create(
            &device,
            &BufferDescriptor::device_local(
                "test vertices",
                64,
                BufferUsage::VERTEX | BufferUsage::COPY_DST,
            ),
        )
        .unwrap();
        let reservation = device.reserve_staging_buffer_memory(64).unwrap();
        device.staging().write(&reservation, 0, &[7u8; 64]).unwrap();

        let mut job = device.create_job(QueueKind::Transfer).unwrap();
        job.copy_buffer(BufferCopy {
            staging_offset: reservation.offset,
            destination: buffer.id(),
            destination_offset: 0,
            size: 64,
        });
        let token = device.submit_job(job, QueueKind::Transfer).unwrap();
        token.wait().unwrap();
        assert!(token.is_complete());
    }

    #[test]
    fn unknown_buffers_are_not_found_or_skips() {
        let device = match create_test_device() {
            Some(d) => d,
            None => {
                println!("Skipping wgpu lookup test: could not create test device.");
                return;
            }
        };
        assert!(matches!(
            device.destroy_buffer(BufferId(12345)),
            Err(ResourceError::NotFound)
        ));
        assert!(device.buffer_size(device.staging_buffer()).unwrap() >= 1 << 16);
    }
}
