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

//! Device bring-up.

use crate::config::Backend;
use prism_core::renderer::GraphicsDevice;
use prism_infra::{DeviceSettings, HeadlessDevice, WgpuContext, WgpuDevice};
use std::sync::Arc;

/// Creates the device for `backend`.
///
/// A wgpu backend without a usable adapter falls back to the headless device
/// so the scene can still be validated and assembled.
pub fn create_device(backend: Backend, settings: &DeviceSettings) -> Arc<dyn GraphicsDevice> {
    match backend {
        Backend::Headless => Arc::new(HeadlessDevice::new(settings)),
        Backend::Wgpu => match WgpuContext::new_blocking() {
            Ok(context) => Arc::new(WgpuDevice::new(context, settings)),
            Err(e) => {
                log::warn!("Runtime: no usable GPU adapter ({e}), using the headless device");
                Arc::new(HeadlessDevice::new(settings))
            }
        },
    }
}
