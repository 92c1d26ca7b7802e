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

use prism_lanes::geometry_lane::importer::{GeometryImporter, GltfImporter};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// How long build tasks wait for the renderer unless told otherwise.
pub const DEFAULT_STARTUP_DEADLINE: Duration = Duration::from_secs(30);

/// Settings of a [`SceneAssembler`](super::SceneAssembler).
#[derive(Clone)]
pub struct AssemblerConfig {
    /// Directory that relative asset paths in the description start from.
    pub asset_root: PathBuf,
    /// Upper bound on each task's wait for the renderer.
    pub startup_deadline: Duration,
    /// Decoder for `gltf_geometries`.
    pub importer: Arc<dyn GeometryImporter>,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            startup_deadline: DEFAULT_STARTUP_DEADLINE,
            importer: Arc::new(GltfImporter),
        }
    }
}

impl AssemblerConfig {
    /// Default settings with assets resolved against `asset_root`.
    pub fn with_asset_root(asset_root: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: asset_root.into(),
            ..Self::default()
        }
    }
}

impl fmt::Debug for AssemblerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssemblerConfig")
            .field("asset_root", &self.asset_root)
            .field("startup_deadline", &self.startup_deadline)
            .finish_non_exhaustive()
    }
}
