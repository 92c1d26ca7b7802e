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

//! Execution contexts and the synchronization primitives build tasks share.
//!
//! - [`TaskSystem`]: a worker pool plus one dedicated device-affinity context.
//! - [`SharedRendererHandle`]: a one-shot broadcast of the renderer, awaited by
//!   every build task before it touches the GPU.
//! - [`CancellationToken`]: lets the assembler stop sibling tasks after the
//!   first failure.

mod cancel;
mod renderer_handle;
mod system;

pub use self::cancel::CancellationToken;
pub use self::renderer_handle::{
    renderer_promise, RendererPromise, RendererWaitError, SharedRendererHandle,
};
pub use self::system::{TaskSystem, TaskSystemConfig};
