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

use prism_core::renderer::ResourceError;

/// The adapter, logical device and queue a [`WgpuDevice`](super::WgpuDevice)
/// runs on. No surface is involved: the scene pipeline only records copies.
#[derive(Debug)]
pub struct WgpuContext {
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
    pub(crate) adapter_name: String,
    pub(crate) adapter_backend: wgpu::Backend,
}

impl WgpuContext {
    /// Picks the default adapter and opens a device on it.
    ///
    /// ## Errors
    /// * `ResourceError::BackendError` - If no adapter is found or the device
    ///   request is refused.
    pub async fn new() -> Result<Self, ResourceError> {
        log::info!("Initializing WGPU context...");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::new_without_display_handle());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await
            .map_err(|e| ResourceError::BackendError(format!("No suitable adapter: {e}")))?;

        let info = adapter.get_info();
        log::info!(
            "Using graphics adapter: \"{}\" (Backend: {:?})",
            info.name,
            info.backend
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Prism Logical Device"),
                ..Default::default()
            })
            .await
            .map_err(|e| {
                ResourceError::BackendError(format!("Failed to create logical device: {e}"))
            })?;
        log::info!("Logical device and transfer queue created.");

        Ok(Self {
            device,
            queue,
            adapter_name: info.name,
            adapter_backend: info.backend,
        })
    }

    /// Blocking variant of [`new`](Self::new) for the dedicated thread.
    pub fn new_blocking() -> Result<Self, ResourceError> {
        pollster::block_on(Self::new())
    }

    /// The `wgpu` device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// The queue every job is submitted to.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}
