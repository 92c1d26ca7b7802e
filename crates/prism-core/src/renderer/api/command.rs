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

//! Transfer jobs, the command pool they are drawn from, and wait tokens.
//!
//! A [`TransferJob`] is a backend-neutral recording of copy commands out of the
//! staging buffer. It is created by [`GraphicsDevice::create_job`], filled on
//! whichever thread owns it, and consumed by [`GraphicsDevice::submit_job`],
//! which hands back a [`WaitToken`].
//!
//! [`GraphicsDevice::create_job`]: crate::renderer::GraphicsDevice::create_job
//! [`GraphicsDevice::submit_job`]: crate::renderer::GraphicsDevice::submit_job

use super::buffer::BufferId;
use super::texture::{Extent3D, TextureId};
use crate::renderer::error::ResourceError;
use crate::renderer::traits::SubmissionFence;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Buffer copy offsets and sizes must be multiples of this.
pub const COPY_BUFFER_ALIGNMENT: u64 = 4;

/// Row pitch of buffer-to-texture copies must be a multiple of this.
pub const COPY_BYTES_PER_ROW_ALIGNMENT: u32 = 256;

/// Rounds a tightly packed row size up to the copy row pitch.
pub const fn padded_bytes_per_row(unpadded: u32) -> u32 {
    let align = COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// The queue family a job is recorded for and submitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueKind {
    /// The universal graphics queue.
    Graphics,
    /// A transfer-capable queue.
    Transfer,
    /// An async compute queue.
    Compute,
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueKind::Graphics => write!(f, "graphics"),
            QueueKind::Transfer => write!(f, "transfer"),
            QueueKind::Compute => write!(f, "compute"),
        }
    }
}

/// An opaque handle identifying one recorded job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandBufferId(pub usize);

/// A fixed-capacity pool of command buffers.
///
/// One slot is held from [`create_job`] until the [`WaitToken`] of the
/// submission is dropped, or until the job itself is dropped unsubmitted.
///
/// [`create_job`]: crate::renderer::GraphicsDevice::create_job
#[derive(Debug)]
pub struct CommandPool {
    capacity: usize,
    in_flight: Arc<AtomicUsize>,
    next_id: AtomicUsize,
}

impl CommandPool {
    /// Creates a pool that allows `capacity` outstanding jobs.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            in_flight: Arc::new(AtomicUsize::new(0)),
            next_id: AtomicUsize::new(0),
        }
    }

    /// Takes one slot from the pool.
    ///
    /// # Errors
    /// [`ResourceError::CommandPoolExhausted`] if every slot is in use.
    pub fn acquire(&self) -> Result<(CommandBufferId, JobSlot), ResourceError> {
        let capacity = self.capacity;
        self.in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                (used < capacity).then_some(used + 1)
            })
            .map_err(|_| ResourceError::CommandPoolExhausted { capacity })?;
        let id = CommandBufferId(self.next_id.fetch_add(1, Ordering::Relaxed));
        Ok((
            id,
            JobSlot {
                in_flight: Arc::clone(&self.in_flight),
            },
        ))
    }

    /// Number of slots currently held.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Maximum number of outstanding jobs.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// A held command-pool slot, released on drop.
#[derive(Debug)]
pub struct JobSlot {
    in_flight: Arc<AtomicUsize>,
}

impl Drop for JobSlot {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Copy a range of the staging buffer into a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferCopy {
    /// Source offset in the staging buffer.
    pub staging_offset: u64,
    /// Destination buffer.
    pub destination: BufferId,
    /// Destination offset.
    pub destination_offset: u64,
    /// Bytes to copy.
    pub size: u64,
}

/// Copy a padded image out of the staging buffer into a texture layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferTextureCopy {
    /// Source offset in the staging buffer.
    pub staging_offset: u64,
    /// Row pitch of the staged image, a multiple of [`COPY_BYTES_PER_ROW_ALIGNMENT`].
    pub bytes_per_row: u32,
    /// Destination texture.
    pub destination: TextureId,
    /// Region to fill, starting at the origin of `array_layer`.
    pub extent: Extent3D,
    /// Destination array layer.
    pub array_layer: u32,
}

/// One recorded transfer command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferCommand {
    /// Staging to buffer.
    CopyBuffer(BufferCopy),
    /// Staging to texture.
    CopyBufferToTexture(BufferTextureCopy),
}

/// A job recording copy commands, executed in recorded order once submitted.
#[derive(Debug)]
pub struct TransferJob {
    id: CommandBufferId,
    queue: QueueKind,
    commands: Vec<TransferCommand>,
    slot: JobSlot,
}

impl TransferJob {
    /// Wraps a freshly acquired pool slot.
    pub fn new(id: CommandBufferId, queue: QueueKind, slot: JobSlot) -> Self {
        Self {
            id,
            queue,
            commands: Vec::new(),
            slot,
        }
    }

    /// The identifier of this job.
    pub fn id(&self) -> CommandBufferId {
        self.id
    }

    /// The queue this job was created for.
    pub fn queue(&self) -> QueueKind {
        self.queue
    }

    /// The recorded commands, in execution order.
    pub fn commands(&self) -> &[TransferCommand] {
        &self.commands
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Records a staging-to-buffer copy.
    ///
    /// A copy that continues the previous one in both the staging buffer and
    /// the same destination is merged into it.
    pub fn copy_buffer(&mut self, copy: BufferCopy) {
        if copy.size == 0 {
            return;
        }
        if let Some(TransferCommand::CopyBuffer(previous)) = self.commands.last_mut() {
            if previous.destination == copy.destination
                && previous.staging_offset + previous.size == copy.staging_offset
                && previous.destination_offset + previous.size == copy.destination_offset
            {
                previous.size += copy.size;
                return;
            }
        }
        self.commands.push(TransferCommand::CopyBuffer(copy));
    }

    /// Records a staging-to-texture copy.
    pub fn copy_buffer_to_texture(&mut self, copy: BufferTextureCopy) {
        self.commands.push(TransferCommand::CopyBufferToTexture(copy));
    }

    /// Splits the job for submission. The slot must travel into the [`WaitToken`].
    pub fn into_parts(self) -> (CommandBufferId, QueueKind, Vec<TransferCommand>, JobSlot) {
        (self.id, self.queue, self.commands, self.slot)
    }
}

/// Completion handle of one submitted job.
///
/// Holds the job's command-pool slot until dropped.
#[derive(Debug)]
pub struct WaitToken {
    id: CommandBufferId,
    fence: Box<dyn SubmissionFence>,
    _slot: JobSlot,
}

impl WaitToken {
    /// Creates a token for the submission `id` signalled by `fence`.
    pub fn new(id: CommandBufferId, fence: Box<dyn SubmissionFence>, slot: JobSlot) -> Self {
        Self {
            id,
            fence,
            _slot: slot,
        }
    }

    /// The job this token tracks.
    pub fn id(&self) -> CommandBufferId {
        self.id
    }

    /// Blocks until the device has finished executing the job.
    pub fn wait(&self) -> Result<(), ResourceError> {
        self.fence.wait()
    }

    /// Returns `true` once the job has finished, without blocking.
    pub fn is_complete(&self) -> bool {
        self.fence.is_signaled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Done;

    impl SubmissionFence for Done {
        fn wait(&self) -> Result<(), ResourceError> {
            Ok(())
        }

        fn is_signaled(&self) -> bool {
            true
        }
    }

    fn copy(staging_offset: u64, destination_offset: u64, size: u64) -> BufferCopy {
        BufferCopy {
            staging_offset,
            destination: BufferId(1),
            destination_offset,
            size,
        }
    }

    #[test]
    fn padded_rows_are_multiples_of_256() {
        assert_eq!(padded_bytes_per_row(4), 256);
        assert_eq!(padded_bytes_per_row(256), 256);
        assert_eq!(padded_bytes_per_row(1028), 1280);
    }

    #[test]
    fn pool_slots_are_released_with_the_token() {
        let pool = CommandPool::new(2);
        let (id_a, slot_a) = pool.acquire().unwrap();
        let (_id_b, slot_b) = pool.acquire().unwrap();
        assert!(matches!(
            pool.acquire(),
            Err(ResourceError::CommandPoolExhausted { capacity: 2 })
        ));

        let job = TransferJob::new(id_a, QueueKind::Transfer, slot_a);
        let (id, _, _, slot) = job.into_parts();
        let token = WaitToken::new(id, Box::new(Done), slot);
        drop(slot_b);
        assert_eq!(pool.in_flight(), 1);
        assert!(token.is_complete());
        token.wait().unwrap();
        drop(token);
        assert_eq!(pool.in_flight(), 0);
    }

    #[test]
    fn contiguous_copies_are_merged() {
        let pool = CommandPool::new(1);
        let (id, slot) = pool.acquire().unwrap();
        let mut job = TransferJob::new(id, QueueKind::Transfer, slot);
        job.copy_buffer(copy(0, 0, 64));
        job.copy_buffer(copy(64, 64, 32));
        job.copy_buffer(copy(0, 0, 0));
        job.copy_buffer(copy(128, 96, 16));
        assert_eq!(
            job.commands(),
            &[
                TransferCommand::CopyBuffer(copy(0, 0, 96)),
                TransferCommand::CopyBuffer(copy(128, 96, 16)),
            ]
        );
    }
}
