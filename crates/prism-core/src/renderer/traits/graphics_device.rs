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

use crate::memory::{StagingAllocator, StagingReservation};
use crate::renderer::api::*;
use crate::renderer::error::ResourceError;
use std::fmt::Debug;

/// A completion primitive signalled by the device when a submission finishes.
pub trait SubmissionFence: Send + Sync + Debug {
    /// Blocks the calling thread until the submission has finished.
    fn wait(&self) -> Result<(), ResourceError>;

    /// Returns `true` once the submission has finished.
    fn is_signaled(&self) -> bool;
}

/// The device-side services the scene pipeline needs from a renderer.
///
/// Implementations are shared across every build task through an `Arc`, so all
/// methods take `&self` and must be safe to call concurrently.
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    /// A short human-readable description of the adapter backing this device.
    fn adapter_name(&self) -> String;

    /// Creates a new GPU buffer.
    /// ## Arguments
    /// * `descriptor` - Usage, memory kind, per-frame size and frame count.
    /// ## Returns
    /// A `Result` containing the ID of the created buffer.
    /// ## Errors
    /// * `ResourceError::BackendError` - If the backend rejects the descriptor.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError>;

    /// Destroys a GPU buffer.
    /// ## Errors
    /// * `ResourceError::NotFound` - If no buffer exists with this ID.
    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError>;

    /// Returns the allocated size of a buffer in bytes.
    fn buffer_size(&self, id: BufferId) -> Result<u64, ResourceError>;

    /// Creates a new GPU texture.
    /// ## Arguments
    /// * `descriptor` - Extent, format and usage of the texture.
    /// ## Returns
    /// A `Result` containing the ID of the created texture.
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError>;

    /// Destroys a GPU texture.
    /// ## Errors
    /// * `ResourceError::NotFound` - If no texture exists with this ID.
    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError>;

    /// The allocator over the host-visible staging memory.
    fn staging(&self) -> &StagingAllocator;

    /// The device handle of the staging buffer every transfer copies from.
    fn staging_buffer(&self) -> BufferId;

    /// The bindless descriptor slot allocator.
    fn bindless(&self) -> &BindlessSlots;

    /// Takes a command buffer from the pool and opens a job on `queue`.
    /// ## Errors
    /// * `ResourceError::CommandPoolExhausted` - If every command buffer is in flight.
    fn create_job(&self, queue: QueueKind) -> Result<TransferJob, ResourceError>;

    /// Submits a recorded job and returns the token signalled on completion.
    ///
    /// Commands of one job execute in recorded order. No ordering is implied
    /// between separate jobs.
    /// ## Errors
    /// * `ResourceError::QueueMismatch` - If `queue` differs from the job's queue.
    /// * `ResourceError::NotFound` - If a copy references an unknown resource.
    fn submit_job(&self, job: TransferJob, queue: QueueKind) -> Result<WaitToken, ResourceError>;

    /// Reserves `bytes` bytes of staging memory.
    fn reserve_staging_buffer_memory(&self, bytes: u64) -> Result<StagingReservation, ResourceError> {
        self.staging().reserve(bytes).map_err(ResourceError::from)
    }
}
