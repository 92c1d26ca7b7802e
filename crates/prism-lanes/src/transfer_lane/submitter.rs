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

use prism_core::renderer::{BufferCopy, GraphicsDevice, QueueKind, ResourceError, TransferJob, WaitToken};
use std::sync::Arc;

/// Records and submits copy jobs on one queue kind.
#[derive(Debug, Clone)]
pub struct TransferSubmitter {
    device: Arc<dyn GraphicsDevice>,
    queue: QueueKind,
}

impl TransferSubmitter {
    /// A submitter for `queue` on `device`.
    pub fn new(device: Arc<dyn GraphicsDevice>, queue: QueueKind) -> Self {
        Self { device, queue }
    }

    /// The device jobs are submitted to.
    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }

    /// The queue kind jobs are recorded for.
    pub fn queue(&self) -> QueueKind {
        self.queue
    }

    /// Opens a job.
    ///
    /// # Errors
    /// [`ResourceError::CommandPoolExhausted`] when every command buffer is in
    /// flight. Nothing is retried.
    pub fn create_job(&self) -> Result<TransferJob, ResourceError> {
        self.device.create_job(self.queue)
    }

    /// Submits a recorded job.
    pub fn submit_job(&self, job: TransferJob) -> Result<WaitToken, ResourceError> {
        let id = job.id();
        let commands = job.commands().len();
        let token = self.device.submit_job(job, self.queue)?;
        log::debug!(
            "TransferSubmitter: submitted job {:?} ({} commands) on the {} queue",
            id,
            commands,
            self.queue
        );
        Ok(token)
    }

    /// Records `copies` into one job, in order, and submits it.
    pub fn submit(&self, copies: &[BufferCopy]) -> Result<WaitToken, ResourceError> {
        let mut job = self.create_job()?;
        for copy in copies {
            job.copy_buffer(*copy);
        }
        self.submit_job(job)
    }
}
