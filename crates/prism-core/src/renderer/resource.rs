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

//! Owned GPU handles.
//!
//! The scene definition owns every buffer and image it references through
//! these wrappers. Dropping one releases the underlying device object, which
//! is also how a build task that fails halfway cleans up after itself.

use crate::renderer::api::{BufferDescriptor, BufferId, TextureDescriptor, TextureId};
use crate::renderer::error::ResourceError;
use crate::renderer::traits::GraphicsDevice;
use std::fmt;
use std::sync::Arc;

/// A buffer that is destroyed when dropped.
pub struct OwnedBuffer {
    device: Arc<dyn GraphicsDevice>,
    id: BufferId,
    size: u64,
}

impl OwnedBuffer {
    /// Takes ownership of `id`, created on `device` with `size` bytes.
    pub fn new(device: Arc<dyn GraphicsDevice>, id: BufferId, size: u64) -> Self {
        Self { device, id, size }
    }

    /// Creates a buffer on `device` and takes ownership of it.
    pub fn create(
        device: &Arc<dyn GraphicsDevice>,
        descriptor: &BufferDescriptor,
    ) -> Result<Self, ResourceError> {
        let id = device.create_buffer(descriptor)?;
        Ok(Self::new(Arc::clone(device), id, descriptor.total_size()))
    }

    /// The device handle.
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Allocated size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }
}

impl fmt::Debug for OwnedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedBuffer")
            .field("id", &self.id)
            .field("size", &self.size)
            .finish()
    }
}

impl Drop for OwnedBuffer {
    fn drop(&mut self) {
        if let Err(e) = self.device.destroy_buffer(self.id) {
            log::warn!("OwnedBuffer: failed to destroy {:?}: {e}", self.id);
        }
    }
}

/// A texture that is destroyed when dropped.
pub struct OwnedTexture {
    device: Arc<dyn GraphicsDevice>,
    id: TextureId,
    width: u32,
    height: u32,
}

impl OwnedTexture {
    /// Takes ownership of `id`, created on `device`.
    pub fn new(device: Arc<dyn GraphicsDevice>, id: TextureId, width: u32, height: u32) -> Self {
        Self {
            device,
            id,
            width,
            height,
        }
    }

    /// Creates a texture on `device` and takes ownership of it.
    pub fn create(
        device: &Arc<dyn GraphicsDevice>,
        descriptor: &TextureDescriptor,
    ) -> Result<Self, ResourceError> {
        let id = device.create_texture(descriptor)?;
        Ok(Self::new(
            Arc::clone(device),
            id,
            descriptor.size.width,
            descriptor.size.height,
        ))
    }

    /// The device handle.
    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Width and height in texels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl fmt::Debug for OwnedTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedTexture")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl Drop for OwnedTexture {
    fn drop(&mut self) {
        if let Err(e) = self.device.destroy_texture(self.id) {
            log::warn!("OwnedTexture: failed to destroy {:?}: {e}", self.id);
        }
    }
}
