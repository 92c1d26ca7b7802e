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

//! The state machine shared by the build tasks.

use prism_core::renderer::{
    BufferDescriptor, BufferUsage, GraphicsDevice, OwnedBuffer, ResourceError, WaitToken,
};
use prism_core::task::{CancellationToken, SharedRendererHandle};
use prism_core::{ProgramError, SceneError};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;

/// Which build task is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Procedural geometry upload.
    Procedural,
    /// glTF import and upload.
    Imported,
    /// Scene materials and their textures.
    Materials,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskKind::Procedural => "procedural",
            TaskKind::Imported => "imported",
            TaskKind::Materials => "materials",
        })
    }
}

/// Where a build task is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildStage {
    /// Spawned, not yet running.
    Pending,
    /// CPU work on the pool: synthesis, decoding, planning.
    Synthesizing,
    /// Suspended on the shared renderer handle.
    AwaitingRenderer,
    /// Creating GPU objects, staging bytes and submitting copies.
    Uploading,
    /// Finished successfully.
    Done,
    /// Returned an error.
    Failed,
}

/// A task's output together with the wait tokens of its submitted copies.
///
/// The resources must not be read by the device before every token has been
/// waited on.
#[derive(Debug)]
pub struct BuiltResource<T> {
    /// What the task built.
    pub resource: T,
    /// One token per submitted batch; empty when nothing was uploaded.
    pub uploads: Vec<WaitToken>,
}

impl<T> BuiltResource<T> {
    /// A result that needed no upload.
    pub fn ready(resource: T) -> Self {
        Self {
            resource,
            uploads: Vec::new(),
        }
    }

    /// A result whose copies are tracked by `upload`.
    pub fn pending(resource: T, upload: WaitToken) -> Self {
        Self {
            resource,
            uploads: vec![upload],
        }
    }
}

/// What every build task is handed: its kind, the renderer it will upload
/// to, how long it may wait for it and the shared cancellation token.
#[derive(Clone)]
pub struct TaskContext {
    kind: TaskKind,
    renderer: SharedRendererHandle<dyn GraphicsDevice>,
    deadline: Duration,
    cancel: CancellationToken,
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("kind", &self.kind)
            .field("deadline", &self.deadline)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl TaskContext {
    /// Creates the context of a task that has not started yet.
    pub fn new(
        kind: TaskKind,
        renderer: SharedRendererHandle<dyn GraphicsDevice>,
        deadline: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let context = Self {
            kind,
            renderer,
            deadline,
            cancel,
        };
        context.enter(BuildStage::Pending);
        context
    }

    /// The task kind.
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Logs a state transition.
    pub fn enter(&self, stage: BuildStage) {
        log::debug!("SceneAssembler: {} task -> {:?}", self.kind, stage);
    }

    /// Returns [`SceneError::Cancelled`] once a sibling has failed.
    pub fn checkpoint(&self) -> Result<(), SceneError> {
        self.cancel.check()
    }

    /// The one suspension point before GPU work.
    ///
    /// Gives up with [`SceneError::StartupDeadline`] after the configured
    /// deadline, with [`SceneError::RendererUnavailable`] if the promise is
    /// dropped and with [`SceneError::Cancelled`] if a sibling fails first.
    pub async fn await_renderer(&self) -> Result<Arc<dyn GraphicsDevice>, SceneError> {
        self.checkpoint()?;
        self.enter(BuildStage::AwaitingRenderer);
        let renderer = tokio::select! {
            renderer = self.renderer.get_within(self.deadline) => {
                renderer.map_err(SceneError::from)?
            }
            _ = self.cancel.cancelled() => return Err(SceneError::Cancelled),
        };
        self.checkpoint()?;
        Ok(renderer)
    }

    /// Logs the terminal stage of `result` and passes it through.
    pub fn finish<T>(&self, result: Result<T, ProgramError>) -> Result<T, ProgramError> {
        match &result {
            Ok(_) => self.enter(BuildStage::Done),
            Err(e) => {
                self.enter(BuildStage::Failed);
                log::debug!("SceneAssembler: {} task failed: {e}", self.kind);
            }
        }
        result
    }
}

/// Maps a panicked or aborted sub-task to a scene error.
pub(crate) fn task_failed(err: JoinError) -> SceneError {
    SceneError::TaskFailed(err.to_string())
}

/// Creates a device-local buffer, or nothing when `size` is zero.
pub(crate) fn optional_buffer(
    device: &Arc<dyn GraphicsDevice>,
    label: &str,
    size: u64,
    usage: BufferUsage,
) -> Result<Option<OwnedBuffer>, ResourceError> {
    if size == 0 {
        return Ok(None);
    }
    OwnedBuffer::create(device, &BufferDescriptor::device_local(label, size, usage)).map(Some)
}
