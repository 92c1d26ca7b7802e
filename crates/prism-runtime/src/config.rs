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

//! Runtime configuration, read from a RON file.

use anyhow::{Context, Result};
use clap::ValueEnum;
use prism_core::task::TaskSystemConfig;
use prism_infra::DeviceSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which device backend to bring up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// A wgpu adapter, falling back to `headless` when none is available.
    #[default]
    Wgpu,
    /// Host memory only.
    Headless,
}

/// Everything the runtime can be tuned with. Omitted fields keep their
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Bytes of staging memory.
    pub staging_capacity: u64,
    /// Alignment of staging reservations.
    pub staging_alignment: u64,
    /// Outstanding jobs and wait tokens.
    pub command_pool_capacity: usize,
    /// Bindless image slots.
    pub bindless_images: u32,
    /// Bindless buffer slots.
    pub bindless_buffers: u32,
    /// Pool workers; one per core when absent.
    pub worker_threads: Option<usize>,
    /// How long build tasks wait for the device.
    pub startup_deadline_ms: u64,
    /// Asset directory; the scene file's directory when absent.
    pub asset_root: Option<PathBuf>,
    /// Device backend.
    pub backend: Backend,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let device = DeviceSettings::default();
        Self {
            staging_capacity: device.staging_capacity,
            staging_alignment: device.staging_alignment,
            command_pool_capacity: device.command_pool_capacity,
            bindless_images: device.bindless_images,
            bindless_buffers: device.bindless_buffers,
            worker_threads: None,
            startup_deadline_ms: 30_000,
            asset_root: None,
            backend: Backend::default(),
        }
    }
}

impl RuntimeConfig {
    /// Parses a configuration from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        ron::from_str(text).context("invalid runtime configuration")
    }

    /// Reads the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_ron_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Capacities handed to the device.
    pub fn device_settings(&self) -> DeviceSettings {
        DeviceSettings {
            staging_capacity: self.staging_capacity,
            staging_alignment: self.staging_alignment,
            command_pool_capacity: self.command_pool_capacity,
            bindless_images: self.bindless_images,
            bindless_buffers: self.bindless_buffers,
        }
    }

    /// Settings of the task system.
    pub fn task_system_config(&self) -> TaskSystemConfig {
        TaskSystemConfig {
            worker_threads: self.worker_threads,
            ..TaskSystemConfig::default()
        }
    }

    /// The renderer wait deadline.
    pub fn startup_deadline(&self) -> Duration {
        Duration::from_millis(self.startup_deadline_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_keeps_every_default() {
        assert_eq!(RuntimeConfig::from_ron_str("()").unwrap(), RuntimeConfig::default());
    }

    #[test]
    fn fields_override_individually() {
        let config = RuntimeConfig::from_ron_str(
            "(backend: headless, worker_threads: Some(2), startup_deadline_ms: 500)",
        )
        .unwrap();
        assert_eq!(config.backend, Backend::Headless);
        assert_eq!(config.task_system_config().worker_threads, Some(2));
        assert_eq!(config.startup_deadline(), Duration::from_millis(500));
        assert_eq!(config.device_settings(), DeviceSettings::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(RuntimeConfig::from_ron_str("(staging: 1)").is_err());
    }
}
