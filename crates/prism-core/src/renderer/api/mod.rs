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

//! Backend-agnostic resource and command types.
//!
//! - **[`buffer`]**: buffer handles, usages and descriptors.
//! - **[`texture`]**: texture handles, formats and descriptors.
//! - **[`command`]**: queue kinds, transfer jobs and wait tokens.
//! - **[`bindless`]**: the bindless slot allocator.

pub mod bindless;
pub mod buffer;
pub mod command;
pub mod texture;

pub use self::bindless::{BindlessKind, BindlessSlots};
pub use self::buffer::{BufferDescriptor, BufferId, BufferUsage, MemoryKind};
pub use self::command::{
    padded_bytes_per_row, BufferCopy, BufferTextureCopy, CommandBufferId, CommandPool, JobSlot,
    QueueKind, TransferCommand, TransferJob, WaitToken, COPY_BUFFER_ALIGNMENT,
    COPY_BYTES_PER_ROW_ALIGNMENT,
};
pub use self::texture::{Extent3D, TextureDescriptor, TextureFormat, TextureId, TextureUsage};
