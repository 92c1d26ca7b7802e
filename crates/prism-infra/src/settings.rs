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

//! Sizing shared by every device backend.

/// Capacities a device is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSettings {
    /// Bytes of host-visible staging memory.
    pub staging_capacity: u64,
    /// Alignment of every staging reservation.
    pub staging_alignment: u64,
    /// Jobs and wait tokens that may be outstanding at once.
    pub command_pool_capacity: usize,
    /// Bindless image descriptor slots.
    pub bindless_images: u32,
    /// Bindless buffer descriptor slots.
    pub bindless_buffers: u32,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            staging_capacity: 64 * 1024 * 1024,
            staging_alignment: 256,
            command_pool_capacity: 16,
            bindless_images: 1024,
            bindless_buffers: 64,
        }
    }
}
