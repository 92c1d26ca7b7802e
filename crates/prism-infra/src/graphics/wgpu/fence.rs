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

use super::context::WgpuContext;
use prism_core::renderer::{ResourceError, SubmissionFence};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Signalled from `Queue::on_submitted_work_done` for one submission.
#[derive(Debug)]
pub(crate) struct WgpuFence {
    context: Arc<WgpuContext>,
    signaled: Arc<AtomicBool>,
}

impl WgpuFence {
    /// Arms a fence on the most recent submission of `context.queue`.
    pub(crate) fn after_last_submit(context: Arc<WgpuContext>) -> Self {
        let signaled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&signaled);
        context
            .queue
            .on_submitted_work_done(move || flag.store(true, Ordering::Release));
        Self { context, signaled }
    }
}

impl SubmissionFence for WgpuFence {
    fn wait(&self) -> Result<(), ResourceError> {
        if self.signaled.load(Ordering::Acquire) {
            return Ok(());
        }
        // Wait blocks until the queue is empty and callbacks have run.
        self.context
            .device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| ResourceError::BackendError(format!("Device poll failed: {e:?}")))?;
        if self.signaled.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(ResourceError::DeviceLost)
        }
    }

    fn is_signaled(&self) -> bool {
        if !self.signaled.load(Ordering::Acquire) {
            if let Err(e) = self.context.device.poll(wgpu::PollType::Poll) {
                log::warn!("Failed to poll device (non-blocking): {e:?}");
            }
        }
        self.signaled.load(Ordering::Acquire)
    }
}
