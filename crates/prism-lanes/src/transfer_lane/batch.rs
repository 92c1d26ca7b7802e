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

use super::TransferSubmitter;
use prism_core::memory::{align_up, StagingReservation};
use prism_core::renderer::{
    padded_bytes_per_row, BufferCopy, BufferId, BufferTextureCopy, Extent3D, ResourceError,
    TextureId, TransferJob, WaitToken, COPY_BUFFER_ALIGNMENT,
};

/// Staging bytes a buffer payload of `len` bytes occupies inside a batch.
pub fn staged_buffer_size(len: u64) -> u64 {
    align_up(len, COPY_BUFFER_ALIGNMENT)
}

/// Staging bytes an RGBA8 image occupies inside a batch, rows padded.
pub fn staged_texture_size(width: u32, height: u32) -> u64 {
    u64::from(padded_bytes_per_row(width * 4)) * u64::from(height)
}

/// One staging reservation and one transfer job, filled together.
///
/// Payloads are packed back to back at copy-aligned offsets. Nothing reaches
/// the device until [`submit`](Self::submit).
#[derive(Debug)]
pub struct UploadBatch<'a> {
    submitter: &'a TransferSubmitter,
    reservation: StagingReservation,
    cursor: u64,
    job: TransferJob,
}

impl<'a> UploadBatch<'a> {
    /// Reserves `total_bytes` of staging memory and opens a job.
    ///
    /// `total_bytes` should be the sum of [`staged_buffer_size`] and
    /// [`staged_texture_size`] over everything that will be staged.
    ///
    /// # Errors
    /// [`ResourceError::Staging`] if the staging buffer is full, or
    /// [`ResourceError::CommandPoolExhausted`].
    pub fn new(submitter: &'a TransferSubmitter, total_bytes: u64) -> Result<Self, ResourceError> {
        let reservation = submitter
            .device()
            .reserve_staging_buffer_memory(total_bytes)?;
        let job = submitter.create_job()?;
        Ok(Self {
            submitter,
            reservation,
            cursor: 0,
            job,
        })
    }

    /// The staging range backing this batch.
    pub fn reservation(&self) -> StagingReservation {
        self.reservation
    }

    /// Bytes still free in the reservation.
    pub fn remaining(&self) -> u64 {
        self.reservation.size.saturating_sub(self.cursor)
    }

    fn take(&mut self, staged: u64) -> Result<u64, ResourceError> {
        if staged > self.remaining() {
            return Err(ResourceError::OutOfBounds);
        }
        let local = self.cursor;
        self.cursor += staged;
        Ok(local)
    }

    /// Stages `bytes` and records a copy into `destination` at
    /// `destination_offset`.
    pub fn stage_buffer(
        &mut self,
        bytes: &[u8],
        destination: BufferId,
        destination_offset: u64,
    ) -> Result<(), ResourceError> {
        if bytes.is_empty() {
            return Ok(());
        }
        let local = self.take(staged_buffer_size(bytes.len() as u64))?;
        let staging = self.submitter.device().staging();
        staging.write(&self.reservation, local, bytes)?;
        self.job.copy_buffer(BufferCopy {
            staging_offset: self.reservation.offset + local,
            destination,
            destination_offset,
            size: bytes.len() as u64,
        });
        Ok(())
    }

    /// Stages a tightly packed RGBA8 image with rows padded for the copy and
    /// records a copy into `layer` of `destination`.
    pub fn stage_texture(
        &mut self,
        rgba: &[u8],
        width: u32,
        height: u32,
        destination: TextureId,
        layer: u32,
    ) -> Result<(), ResourceError> {
        let row = (width * 4) as usize;
        if rgba.len() != row * height as usize {
            return Err(ResourceError::BackendError(format!(
                "{} bytes staged for a {width}x{height} RGBA8 image",
                rgba.len()
            )));
        }
        let padded = padded_bytes_per_row(width * 4);
        let local = self.take(staged_texture_size(width, height))?;

        self.submitter
            .device()
            .staging()
            .with_mapped(&self.reservation, |memory| {
                let start = local as usize;
                for (y, src) in rgba.chunks_exact(row).enumerate() {
                    let dst = start + y * padded as usize;
                    memory[dst..dst + row].copy_from_slice(src);
                }
            });

        self.job.copy_buffer_to_texture(BufferTextureCopy {
            staging_offset: self.reservation.offset + local,
            bytes_per_row: padded,
            destination,
            extent: Extent3D::flat(width, height),
            array_layer: layer,
        });
        Ok(())
    }

    /// Submits every recorded copy as one job.
    pub fn submit(self) -> Result<WaitToken, ResourceError> {
        log::trace!(
            "UploadBatch: {} of {} staged bytes used at offset {}",
            self.cursor,
            self.reservation.size,
            self.reservation.offset
        );
        self.submitter.submit_job(self.job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_sizes_follow_copy_alignment() {
        assert_eq!(staged_buffer_size(0), 0);
        assert_eq!(staged_buffer_size(6), 8);
        assert_eq!(staged_buffer_size(288), 288);
        assert_eq!(staged_texture_size(1, 1), 256);
        assert_eq!(staged_texture_size(65, 2), 512 * 2);
    }
}
